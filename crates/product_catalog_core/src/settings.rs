use thiserror::Error;

pub const DB_LOCATION_VAR: &str = "DB_LOCATION";
pub const DB_USER_VAR: &str = "DB_USER";
pub const DB_NAME_VAR: &str = "DB_NAME";
pub const DB_PORT_VAR: &str = "DB_PORT";
pub const DEFAULT_DB_PORT: u16 = 3306;

/// Connection settings shared by both database functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSettings {
    /// RDS Proxy endpoint.
    pub host: String,
    pub port: u16,
    pub user: String,
    pub database: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("DB_PORT must be a port number, got '{0}'")]
    InvalidPort(String),
}

impl DbSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let required = |key: &'static str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(SettingsError::Missing(key))
        };

        let port = match lookup(DB_PORT_VAR) {
            Some(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| SettingsError::InvalidPort(raw.clone()))?,
            _ => DEFAULT_DB_PORT,
        };

        Ok(Self {
            host: required(DB_LOCATION_VAR)?,
            port,
            user: required(DB_USER_VAR)?,
            database: required(DB_NAME_VAR)?,
        })
    }
}
