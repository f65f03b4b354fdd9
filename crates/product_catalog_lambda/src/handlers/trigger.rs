use product_catalog_core::contract::{
    response_url, trigger_physical_resource_id, CustomResourceRequest, CustomResourceRequestType,
    CustomResourceResponse, SEED_FUNCTION_NAME_PROPERTY,
};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::adapters::cfn_response::CustomResourceResponder;
use crate::adapters::invoke::FunctionInvoker;
use crate::error::ResponderError;

const COMPONENT: &str = "seed_trigger";

/// Decides the outcome of a custom resource request.
///
/// Only `Create` reaches the seed function, as a fire-and-forget `Event`
/// invocation; `Update` and `Delete` succeed without side effects.
pub async fn handle_custom_resource_event(
    request: &CustomResourceRequest,
    invoker: &impl FunctionInvoker,
) -> CustomResourceResponse {
    let physical_resource_id = request.physical_resource_id.clone().unwrap_or_else(|| {
        trigger_physical_resource_id(&request.stack_id, &request.logical_resource_id)
    });

    if request.request_type != CustomResourceRequestType::Create {
        info!(
            component = COMPONENT,
            event = "trigger_skipped",
            request_type = ?request.request_type,
            physical_resource_id = %physical_resource_id,
        );
        return CustomResourceResponse::success(request, physical_resource_id);
    }

    let Some(function_name) = request.property_str(SEED_FUNCTION_NAME_PROPERTY) else {
        let reason = format!("{SEED_FUNCTION_NAME_PROPERTY} resource property is required");
        error!(component = COMPONENT, event = "trigger_failed", error = %reason);
        return CustomResourceResponse::failed(request, reason, physical_resource_id);
    };

    let payload = json!({
        "source": request.logical_resource_id,
        "request_id": request.request_id,
    });
    match invoker
        .invoke_async(function_name, payload.to_string().as_bytes())
        .await
    {
        Ok(()) => {
            info!(
                component = COMPONENT,
                event = "seed_invoked",
                function_name,
                physical_resource_id = %physical_resource_id,
            );
            CustomResourceResponse::success(request, physical_resource_id)
        }
        Err(failure) => {
            error!(
                component = COMPONENT,
                event = "trigger_failed",
                function_name,
                error = %failure,
            );
            CustomResourceResponse::failed(request, failure.to_string(), physical_resource_id)
        }
    }
}

/// Runs [`handle_custom_resource_event`] and reports the result to the
/// request's `ResponseURL`.
pub async fn respond_to_custom_resource(
    request: &CustomResourceRequest,
    invoker: &impl FunctionInvoker,
    responder: &impl CustomResourceResponder,
) -> Result<CustomResourceResponse, ResponderError> {
    let response = handle_custom_resource_event(request, invoker).await;
    responder.send(&request.response_url, &response).await?;
    Ok(response)
}

/// Entry point for the raw Lambda payload.
///
/// A payload that does not parse as a request (including an unknown
/// `RequestType`) is still answered with `FAILED` when it names a
/// `ResponseURL`, so the stack operation fails instead of waiting for the
/// custom resource timeout.
pub async fn respond_to_custom_resource_payload(
    payload: Value,
    invoker: &impl FunctionInvoker,
    responder: &impl CustomResourceResponder,
) -> Result<CustomResourceResponse, ResponderError> {
    let parse_failure = match serde_json::from_value::<CustomResourceRequest>(payload.clone()) {
        Ok(request) => return respond_to_custom_resource(&request, invoker, responder).await,
        Err(failure) => format!("malformed custom resource request: {failure}"),
    };

    error!(
        component = COMPONENT,
        event = "trigger_rejected",
        error = %parse_failure,
    );
    let Some(url) = response_url(&payload) else {
        return Err(ResponderError::NoResponseUrl(parse_failure));
    };
    let response = CustomResourceResponse::rejected(&payload, parse_failure);
    responder.send(url, &response).await?;
    Ok(response)
}
