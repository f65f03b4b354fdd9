use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width of the `VARCHAR` columns in the `products` table.
pub const MAX_TEXT_COLUMN_CHARS: usize = 100;

pub const SEED_PRODUCT_NAME: &str = "PR001";
pub const SEED_PRODUCT_DESCRIPTION: &str = "Product 1";
pub const SEED_PRODUCT_PRICE: i32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub name: String,
    pub description: String,
    pub price: i32,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProductValidationError {
    #[error("product name cannot be empty")]
    EmptyName,
    #[error("product {field} exceeds 100 characters ({actual})")]
    TooLong { field: &'static str, actual: usize },
}

impl Product {
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: i32) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price,
        }
    }

    /// The single row written by the seeding function.
    pub fn seed() -> Self {
        Self::new(SEED_PRODUCT_NAME, SEED_PRODUCT_DESCRIPTION, SEED_PRODUCT_PRICE)
    }

    pub fn validate(&self) -> Result<(), ProductValidationError> {
        if self.name.trim().is_empty() {
            return Err(ProductValidationError::EmptyName);
        }
        check_column_width("name", &self.name)?;
        check_column_width("description", &self.description)?;
        Ok(())
    }
}

fn check_column_width(field: &'static str, value: &str) -> Result<(), ProductValidationError> {
    let actual = value.chars().count();
    if actual > MAX_TEXT_COLUMN_CHARS {
        return Err(ProductValidationError::TooLong { field, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_product_matches_fixture_row() {
        let seed = Product::seed();
        assert_eq!(seed.name, "PR001");
        assert_eq!(seed.description, "Product 1");
        assert_eq!(seed.price, 100);
        assert!(seed.validate().is_ok());
    }

    #[test]
    fn rejects_blank_name() {
        let product = Product::new("  ", "desc", 1);
        assert_eq!(product.validate(), Err(ProductValidationError::EmptyName));
    }

    #[test]
    fn column_width_counts_characters_not_bytes() {
        let at_limit = Product::new("é".repeat(MAX_TEXT_COLUMN_CHARS), "ok", 1);
        assert!(at_limit.validate().is_ok());

        let over = Product::new("ok", "x".repeat(MAX_TEXT_COLUMN_CHARS + 1), 1);
        assert_eq!(
            over.validate(),
            Err(ProductValidationError::TooLong {
                field: "description",
                actual: MAX_TEXT_COLUMN_CHARS + 1,
            })
        );
    }

    #[test]
    fn serializes_with_column_names() {
        let value = serde_json::to_value(Product::seed()).expect("product should serialize");
        assert_eq!(
            value,
            serde_json::json!({"name": "PR001", "description": "Product 1", "price": 100})
        );
    }
}
