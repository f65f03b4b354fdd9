//! Typed errors for the adapter seams.

use product_catalog_core::product::ProductValidationError;
use product_catalog_core::settings::SettingsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbAccessError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("failed to generate auth token: {0}")]
    AuthToken(String),

    #[error("failed to connect to {host}: {source}")]
    Connect {
        host: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error(transparent)]
    Validation(#[from] ProductValidationError),
}

impl DbAccessError {
    /// Error code reported in API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Settings(_) => "misconfiguration",
            Self::Validation(_) => "validation_error",
            Self::AuthToken(_) | Self::Connect { .. } | Self::Query(_) => "database_error",
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to invoke {function_name}: {message}")]
pub struct InvokeError {
    pub function_name: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("failed to serialize custom resource response: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to send custom resource response: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("custom resource response rejected with status {0}")]
    Rejected(u16),

    #[error("custom resource payload has no ResponseURL to reply to: {0}")]
    NoResponseUrl(String),
}
