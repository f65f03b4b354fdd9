use std::sync::Mutex;

use async_trait::async_trait;
use product_catalog_core::product::Product;
use product_catalog_core::settings::SettingsError;

use crate::adapters::invoke::FunctionInvoker;
use crate::adapters::product_store::{ProductStore, SeedOutcome};
use crate::error::{DbAccessError, InvokeError};

/// In-memory table that mimics the guarded insert and the `LIMIT` query.
#[derive(Default)]
pub(crate) struct InMemoryProductStore {
    rows: Mutex<Vec<Product>>,
    table_created: Mutex<bool>,
    unavailable: bool,
}

impl InMemoryProductStore {
    pub(crate) fn with_rows(rows: Vec<Product>) -> Self {
        Self {
            rows: Mutex::new(rows),
            table_created: Mutex::new(true),
            unavailable: false,
        }
    }

    /// Every call fails as if the proxy settings were absent.
    pub(crate) fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub(crate) fn rows(&self) -> Vec<Product> {
        self.rows.lock().expect("poisoned mutex").clone()
    }

    pub(crate) fn table_created(&self) -> bool {
        *self.table_created.lock().expect("poisoned mutex")
    }

    fn check_available(&self) -> Result<(), DbAccessError> {
        if self.unavailable {
            return Err(SettingsError::Missing("DB_LOCATION").into());
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn seed(&self, product: &Product) -> Result<SeedOutcome, DbAccessError> {
        self.check_available()?;
        *self.table_created.lock().expect("poisoned mutex") = true;

        let mut rows = self.rows.lock().expect("poisoned mutex");
        if rows.iter().any(|row| row.name == product.name) {
            return Ok(SeedOutcome { rows_inserted: 0 });
        }
        rows.push(product.clone());
        Ok(SeedOutcome { rows_inserted: 1 })
    }

    async fn fetch(&self, limit: u32) -> Result<Vec<Product>, DbAccessError> {
        self.check_available()?;
        let rows = self.rows.lock().expect("poisoned mutex");
        Ok(rows.iter().take(limit as usize).cloned().collect())
    }
}

#[derive(Default)]
pub(crate) struct CapturingInvoker {
    calls: Mutex<Vec<(String, Vec<u8>)>>,
    fail_with: Option<String>,
}

impl CapturingInvoker {
    pub(crate) fn failing(message: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, Vec<u8>)> {
        self.calls.lock().expect("poisoned mutex").clone()
    }
}

#[async_trait]
impl FunctionInvoker for CapturingInvoker {
    async fn invoke_async(&self, function_name: &str, payload: &[u8]) -> Result<(), InvokeError> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push((function_name.to_string(), payload.to_vec()));
        match &self.fail_with {
            Some(message) => Err(InvokeError {
                function_name: function_name.to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}
