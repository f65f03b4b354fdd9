use lambda_runtime::{service_fn, Error, LambdaEvent};
use product_catalog_core::contract::SeedResponse;
use product_catalog_core::product::Product;
use product_catalog_core::settings::DbSettings;
use product_catalog_lambda::adapters::auth_token::RdsAuthTokenSource;
use product_catalog_lambda::adapters::product_store::MySqlProductStore;
use product_catalog_lambda::handlers::seed::handle_seed_event;
use serde_json::Value;

async fn handle_request(
    _event: LambdaEvent<Value>,
    tokens: &RdsAuthTokenSource,
) -> Result<SeedResponse, Error> {
    let settings = DbSettings::from_env()?;
    let store = MySqlProductStore::new(settings, tokens);
    Ok(handle_seed_event(&store, &Product::seed()).await?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let tokens = RdsAuthTokenSource::new(aws_config);

    lambda_runtime::run(service_fn(|event| handle_request(event, &tokens))).await
}
