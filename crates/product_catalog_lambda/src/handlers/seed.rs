use std::time::Instant;

use product_catalog_core::contract::SeedResponse;
use product_catalog_core::product::Product;
use tracing::{error, info};

use crate::adapters::product_store::ProductStore;
use crate::error::DbAccessError;

const COMPONENT: &str = "seed_handler";

/// Ensures the products table exists and holds `product`.
///
/// Failures propagate so the invocation is reported as failed rather than
/// returning a success-shaped body.
pub async fn handle_seed_event(
    store: &impl ProductStore,
    product: &Product,
) -> Result<SeedResponse, DbAccessError> {
    let started_at = Instant::now();
    product.validate()?;
    info!(component = COMPONENT, event = "seed_started", product = %product.name);

    match store.seed(product).await {
        Ok(outcome) => {
            info!(
                component = COMPONENT,
                event = "seed_completed",
                product = %product.name,
                rows_inserted = outcome.rows_inserted,
                duration_ms = started_at.elapsed().as_millis() as u64,
            );
            Ok(SeedResponse::ok())
        }
        Err(failure) => {
            error!(
                component = COMPONENT,
                event = "seed_failed",
                product = %product.name,
                duration_ms = started_at.elapsed().as_millis() as u64,
                error = %failure,
            );
            Err(failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::InMemoryProductStore;

    #[tokio::test]
    async fn creates_table_and_seeds_product() {
        let store = InMemoryProductStore::default();

        let response = handle_seed_event(&store, &Product::seed())
            .await
            .expect("seeding should succeed");

        assert_eq!(response, SeedResponse::ok());
        assert!(store.table_created());
        assert_eq!(store.rows(), vec![Product::seed()]);
    }

    #[tokio::test]
    async fn reinvocation_does_not_duplicate_seed_row() {
        let store = InMemoryProductStore::default();

        handle_seed_event(&store, &Product::seed())
            .await
            .expect("first seed should succeed");
        handle_seed_event(&store, &Product::seed())
            .await
            .expect("second seed should succeed");

        assert_eq!(store.rows().len(), 1);
    }

    #[tokio::test]
    async fn store_failure_is_surfaced_not_swallowed() {
        let store = InMemoryProductStore::unavailable();

        let error = handle_seed_event(&store, &Product::seed())
            .await
            .expect_err("unavailable store should fail");

        assert!(matches!(error, DbAccessError::Settings(_)));
    }

    #[tokio::test]
    async fn rejects_invalid_product_before_touching_store() {
        let store = InMemoryProductStore::default();

        let error = handle_seed_event(&store, &Product::new("", "no name", 1))
            .await
            .expect_err("blank name should fail");

        assert!(matches!(error, DbAccessError::Validation(_)));
        assert!(!store.table_created());
    }
}
