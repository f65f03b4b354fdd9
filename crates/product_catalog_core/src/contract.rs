use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::product::Product;

/// Resource property carrying the seed function name on the trigger resource.
pub const SEED_FUNCTION_NAME_PROPERTY: &str = "SeedFunctionName";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

impl ApiGatewayResponse {
    pub fn json(status_code: u16, body: String) -> Self {
        Self {
            status_code,
            headers: json!({"Content-Type": "application/json"}),
            body,
        }
    }

    pub fn products(products: &[Product]) -> Self {
        Self::json(200, stable_contract_json(products))
    }

    pub fn error(status_code: u16, error: &str, message: &str) -> Self {
        Self::json(
            status_code,
            json!({
                "error": error,
                "message": message,
            })
            .to_string(),
        )
    }
}

/// Result of the table-seeding function: a status code only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl SeedResponse {
    pub fn ok() -> Self {
        Self { status_code: 200 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CustomResourceRequestType {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceRequest {
    pub request_type: CustomResourceRequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub resource_properties: Map<String, Value>,
}

impl CustomResourceRequest {
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.resource_properties
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum CustomResourceStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: CustomResourceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(skip_serializing_if = "Map::is_empty", default)]
    pub data: Map<String, Value>,
}

impl CustomResourceResponse {
    pub fn success(request: &CustomResourceRequest, physical_resource_id: String) -> Self {
        Self::for_request(request, CustomResourceStatus::Success, None, physical_resource_id)
    }

    pub fn failed(
        request: &CustomResourceRequest,
        reason: impl Into<String>,
        physical_resource_id: String,
    ) -> Self {
        Self::for_request(
            request,
            CustomResourceStatus::Failed,
            Some(reason.into()),
            physical_resource_id,
        )
    }

    /// `FAILED` reply for a payload that did not parse as a request.
    ///
    /// Identifiers are copied from whatever the raw payload carries so
    /// CloudFormation can still match the reply to its pending operation.
    pub fn rejected(payload: &Value, reason: impl Into<String>) -> Self {
        let field = |key: &str| {
            payload
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let stack_id = field("StackId");
        let logical_resource_id = field("LogicalResourceId");
        let physical_resource_id = payload
            .get("PhysicalResourceId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| trigger_physical_resource_id(&stack_id, &logical_resource_id));

        Self {
            status: CustomResourceStatus::Failed,
            reason: Some(reason.into()),
            physical_resource_id,
            stack_id,
            request_id: field("RequestId"),
            logical_resource_id,
            data: Map::new(),
        }
    }

    fn for_request(
        request: &CustomResourceRequest,
        status: CustomResourceStatus,
        reason: Option<String>,
        physical_resource_id: String,
    ) -> Self {
        Self {
            status,
            reason,
            physical_resource_id,
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
            data: Map::new(),
        }
    }
}

/// `ResponseURL` of a raw custom resource payload, if it carries one.
pub fn response_url(payload: &Value) -> Option<&str> {
    payload
        .get("ResponseURL")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
}

/// Physical id for a trigger resource.
///
/// Derived from the stack and logical id, so a stack only ever sees one
/// physical trigger and CloudFormation never schedules a replacement.
pub fn trigger_physical_resource_id(stack_id: &str, logical_resource_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(stack_id.as_bytes());
    hasher.update(b"/");
    hasher.update(logical_resource_id.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{logical_resource_id}-{}_dynamic", &digest[..16])
}

pub fn stable_contract_json(value: impl Serialize) -> String {
    serde_json::to_string(&value).expect("serialization of contract value should not fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CustomResourceRequest {
        serde_json::from_value(json!({
            "RequestType": "Create",
            "ResponseURL": "https://cloudformation-custom-resource-response.example/presigned",
            "StackId": "arn:aws:cloudformation:eu-west-1:123456789012:stack/catalog/abc",
            "RequestId": "req-1",
            "LogicalResourceId": "CreateDatabaseTrigger",
            "ResourceType": "Custom::CreateDatabaseTrigger",
            "ResourceProperties": {
                "ServiceToken": "arn:aws:lambda:eu-west-1:123456789012:function:trigger",
                "SeedFunctionName": "catalog-seed"
            }
        }))
        .expect("request should parse")
    }

    #[test]
    fn parses_cloudformation_request_shape() {
        let request = create_request();
        assert_eq!(request.request_type, CustomResourceRequestType::Create);
        assert_eq!(request.physical_resource_id, None);
        assert_eq!(
            request.property_str(SEED_FUNCTION_NAME_PROPERTY),
            Some("catalog-seed")
        );
    }

    #[test]
    fn failed_response_serializes_uppercase_status_and_reason() {
        let request = create_request();
        let response = CustomResourceResponse::failed(&request, "boom", "pid".to_string());
        let value = serde_json::to_value(&response).expect("response should serialize");

        assert_eq!(value["Status"], "FAILED");
        assert_eq!(value["Reason"], "boom");
        assert_eq!(value["PhysicalResourceId"], "pid");
        assert_eq!(value["RequestId"], "req-1");
        assert!(value.get("Data").is_none());
    }

    #[test]
    fn physical_id_is_stable_per_stack_and_resource() {
        let first = trigger_physical_resource_id("stack-a", "CreateDatabaseTrigger");
        let again = trigger_physical_resource_id("stack-a", "CreateDatabaseTrigger");
        let other = trigger_physical_resource_id("stack-b", "CreateDatabaseTrigger");

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert!(first.starts_with("CreateDatabaseTrigger-"));
        assert!(first.ends_with("_dynamic"));
    }

    #[test]
    fn products_response_wraps_json_array_body() {
        let response = ApiGatewayResponse::products(&[Product::seed()]);
        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.body,
            r#"[{"name":"PR001","description":"Product 1","price":100}]"#
        );
    }

    #[test]
    fn seed_response_uses_status_code_key() {
        let value = serde_json::to_value(SeedResponse::ok()).expect("seed response");
        assert_eq!(value, json!({"statusCode": 200}));
    }

    #[test]
    fn rejected_reply_keeps_identifiers_from_raw_payload() {
        let payload = json!({
            "RequestType": "Replace",
            "ResponseURL": "https://responses.example/presigned",
            "StackId": "stack-a",
            "RequestId": "req-9",
            "LogicalResourceId": "CreateDatabaseTrigger"
        });

        let response = CustomResourceResponse::rejected(&payload, "unknown variant");

        assert_eq!(response.status, CustomResourceStatus::Failed);
        assert_eq!(response.reason.as_deref(), Some("unknown variant"));
        assert_eq!(response.request_id, "req-9");
        assert_eq!(
            response.physical_resource_id,
            trigger_physical_resource_id("stack-a", "CreateDatabaseTrigger")
        );
        assert_eq!(
            response_url(&payload),
            Some("https://responses.example/presigned")
        );
    }

    #[test]
    fn rejected_reply_prefers_existing_physical_id() {
        let payload = json!({ "PhysicalResourceId": "existing-id" });

        let response = CustomResourceResponse::rejected(&payload, "bad request");

        assert_eq!(response.physical_resource_id, "existing-id");
        assert_eq!(response.stack_id, "");
        assert_eq!(response_url(&payload), None);
    }
}
