use async_trait::async_trait;
use aws_sdk_lambda::types::InvocationType;

use crate::error::InvokeError;

#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    /// Queues an asynchronous (`Event`) invocation and returns once accepted.
    async fn invoke_async(&self, function_name: &str, payload: &[u8]) -> Result<(), InvokeError>;
}

pub struct LambdaFunctionInvoker {
    lambda_client: aws_sdk_lambda::Client,
}

impl LambdaFunctionInvoker {
    pub fn new(lambda_client: aws_sdk_lambda::Client) -> Self {
        Self { lambda_client }
    }
}

#[async_trait]
impl FunctionInvoker for LambdaFunctionInvoker {
    async fn invoke_async(&self, function_name: &str, payload: &[u8]) -> Result<(), InvokeError> {
        self.lambda_client
            .invoke()
            .function_name(function_name)
            .invocation_type(InvocationType::Event)
            .set_payload(Some(payload.to_vec().into()))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| InvokeError {
                function_name: function_name.to_string(),
                message: error.to_string(),
            })
    }
}
