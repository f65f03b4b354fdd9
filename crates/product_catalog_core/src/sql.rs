//! Fixed statements run by the database functions.

pub const PRODUCTS_TABLE: &str = "products";

/// Upper bound on rows returned by the fetch function.
pub const FETCH_LIMIT: u32 = 1;

pub fn create_table_sql() -> &'static str {
    "CREATE TABLE IF NOT EXISTS products (name VARCHAR(100), description VARCHAR(100), price INTEGER)"
}

/// Insert guarded on the product name so repeated seeding leaves one row.
///
/// Binds: name, description, price, name.
pub fn insert_seed_sql() -> &'static str {
    "INSERT INTO products (name, description, price) \
     SELECT ?, ?, ? FROM DUAL \
     WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = ?)"
}

pub fn select_products_sql(limit: u32) -> String {
    format!("SELECT name, description, price FROM {PRODUCTS_TABLE} LIMIT {limit}")
}
