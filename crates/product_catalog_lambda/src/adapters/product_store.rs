use async_trait::async_trait;
use product_catalog_core::product::Product;
use product_catalog_core::settings::DbSettings;
use product_catalog_core::sql::{create_table_sql, insert_seed_sql, select_products_sql};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow, MySqlSslMode};
use sqlx::{Connection, Row};
use tracing::debug;

use super::auth_token::AuthTokenSource;
use crate::error::DbAccessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOutcome {
    /// Zero when the product row was already present.
    pub rows_inserted: u64,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Creates the products table if needed and inserts `product` unless a
    /// row with the same name exists.
    async fn seed(&self, product: &Product) -> Result<SeedOutcome, DbAccessError>;

    /// Returns at most `limit` products.
    async fn fetch(&self, limit: u32) -> Result<Vec<Product>, DbAccessError>;
}

/// One TLS connection per call through the RDS Proxy, authenticated with an
/// IAM token. No pooling.
pub struct MySqlProductStore<T> {
    settings: DbSettings,
    tokens: T,
}

impl<T: AuthTokenSource> MySqlProductStore<T> {
    pub fn new(settings: DbSettings, tokens: T) -> Self {
        Self { settings, tokens }
    }

    async fn connect(&self) -> Result<MySqlConnection, DbAccessError> {
        let token = self.tokens.auth_token(&self.settings).await?;
        let options = MySqlConnectOptions::new()
            .host(&self.settings.host)
            .port(self.settings.port)
            .username(&self.settings.user)
            .password(&token)
            .database(&self.settings.database)
            .ssl_mode(MySqlSslMode::Required)
            .enable_cleartext_plugin(true);

        debug!(
            host = %self.settings.host,
            port = self.settings.port,
            database = %self.settings.database,
            "opening proxy connection"
        );
        MySqlConnection::connect_with(&options)
            .await
            .map_err(|source| DbAccessError::Connect {
                host: self.settings.host.clone(),
                source,
            })
    }
}

#[async_trait]
impl<T: AuthTokenSource> ProductStore for MySqlProductStore<T> {
    async fn seed(&self, product: &Product) -> Result<SeedOutcome, DbAccessError> {
        let mut connection = self.connect().await?;

        sqlx::query(create_table_sql())
            .execute(&mut connection)
            .await?;
        let result = sqlx::query(insert_seed_sql())
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(&product.name)
            .execute(&mut connection)
            .await?;

        connection.close().await?;
        Ok(SeedOutcome {
            rows_inserted: result.rows_affected(),
        })
    }

    async fn fetch(&self, limit: u32) -> Result<Vec<Product>, DbAccessError> {
        let mut connection = self.connect().await?;

        let sql = select_products_sql(limit);
        let rows = sqlx::query(&sql)
            .fetch_all(&mut connection)
            .await?;
        connection.close().await?;

        let mut products = rows
            .iter()
            .map(product_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        products.truncate(limit as usize);
        Ok(products)
    }
}

fn product_from_row(row: &MySqlRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: row.try_get("price")?,
    })
}
