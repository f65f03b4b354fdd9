use async_trait::async_trait;
use product_catalog_core::contract::CustomResourceResponse;

use crate::error::ResponderError;

/// Delivers the outcome of a custom resource request back to CloudFormation.
#[async_trait]
pub trait CustomResourceResponder: Send + Sync {
    async fn send(
        &self,
        response_url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), ResponderError>;
}

/// PUTs the response document to the pre-signed S3 `ResponseURL`.
#[derive(Clone, Default)]
pub struct HttpCustomResourceResponder {
    client: reqwest::Client,
}

impl HttpCustomResourceResponder {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CustomResourceResponder for HttpCustomResourceResponder {
    async fn send(
        &self,
        response_url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), ResponderError> {
        let body = serde_json::to_vec(response)?;
        // The URL is signed without a content type.
        let reply = self
            .client
            .put(response_url)
            .header(reqwest::header::CONTENT_TYPE, "")
            .body(body)
            .send()
            .await?;

        let status = reply.status();
        if !status.is_success() {
            return Err(ResponderError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}
