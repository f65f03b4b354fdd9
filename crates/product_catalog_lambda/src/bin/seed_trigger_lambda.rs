use lambda_runtime::{service_fn, Error, LambdaEvent};
use product_catalog_core::contract::CustomResourceResponse;
use product_catalog_lambda::adapters::cfn_response::HttpCustomResourceResponder;
use product_catalog_lambda::adapters::invoke::LambdaFunctionInvoker;
use product_catalog_lambda::handlers::trigger::respond_to_custom_resource_payload;
use serde_json::Value;

struct RuntimeDependencies {
    invoker: LambdaFunctionInvoker,
    responder: HttpCustomResourceResponder,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<CustomResourceResponse, Error> {
    let response =
        respond_to_custom_resource_payload(event.payload, &deps.invoker, &deps.responder)
            .await
            .map_err(|error| {
                Error::from(format!("custom resource response not delivered: {error}"))
            })?;
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        invoker: LambdaFunctionInvoker::new(aws_sdk_lambda::Client::new(&aws_config)),
        responder: HttpCustomResourceResponder::default(),
    };

    lambda_runtime::run(service_fn(|event| handle_request(event, &deps))).await
}
