use lambda_runtime::{service_fn, Error, LambdaEvent};
use product_catalog_core::contract::ApiGatewayResponse;
use product_catalog_core::settings::DbSettings;
use product_catalog_lambda::adapters::auth_token::RdsAuthTokenSource;
use product_catalog_lambda::adapters::product_store::MySqlProductStore;
use product_catalog_lambda::error::DbAccessError;
use product_catalog_lambda::handlers::fetch::{fetch_failure_response, handle_fetch_event};
use serde_json::Value;

async fn handle_request(
    event: LambdaEvent<Value>,
    tokens: &RdsAuthTokenSource,
) -> Result<ApiGatewayResponse, Error> {
    let settings = match DbSettings::from_env() {
        Ok(value) => value,
        Err(error) => return Ok(fetch_failure_response(&DbAccessError::from(error))),
    };

    let store = MySqlProductStore::new(settings, tokens);
    Ok(handle_fetch_event(&event.payload, &store).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let tokens = RdsAuthTokenSource::new(aws_config);

    lambda_runtime::run(service_fn(|event| handle_request(event, &tokens))).await
}
