use product_catalog_core::contract::ApiGatewayResponse;
use product_catalog_core::sql::FETCH_LIMIT;
use serde_json::Value;
use tracing::{error, info};

use crate::adapters::product_store::ProductStore;
use crate::error::DbAccessError;

const COMPONENT: &str = "fetch_handler";

/// Serves `POST /product`: returns at most [`FETCH_LIMIT`] products.
///
/// The request payload is not interpreted beyond logging.
pub async fn handle_fetch_event(event: &Value, store: &impl ProductStore) -> ApiGatewayResponse {
    let (method, path) = request_line(event);
    info!(component = COMPONENT, event = "fetch_started", method, path);

    match store.fetch(FETCH_LIMIT).await {
        Ok(mut products) => {
            products.truncate(FETCH_LIMIT as usize);
            info!(
                component = COMPONENT,
                event = "fetch_completed",
                returned = products.len(),
            );
            ApiGatewayResponse::products(&products)
        }
        Err(failure) => fetch_failure_response(&failure),
    }
}

/// Logs `fetch_failed` and renders the 500 reply.
///
/// Shared with the binary so configuration failures are logged like
/// store failures.
pub fn fetch_failure_response(failure: &DbAccessError) -> ApiGatewayResponse {
    error!(
        component = COMPONENT,
        event = "fetch_failed",
        code = failure.code(),
        error = %failure,
    );
    ApiGatewayResponse::error(500, failure.code(), &failure.to_string())
}

fn request_line(event: &Value) -> (&str, &str) {
    let field = |key: &str| event.get(key).and_then(Value::as_str).unwrap_or("-");
    (field("httpMethod"), field("path"))
}
