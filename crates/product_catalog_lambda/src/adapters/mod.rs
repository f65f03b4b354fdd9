pub mod auth_token;
pub mod cfn_response;
pub mod invoke;
pub mod product_store;
