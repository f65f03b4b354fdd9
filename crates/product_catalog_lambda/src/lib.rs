//! AWS-oriented adapters and handlers for the product catalog functions.
//!
//! Handlers depend only on the adapter traits; the binaries under `src/bin`
//! wire in the AWS SDK, MySQL, and HTTP implementations.

pub mod adapters;
pub mod error;
pub mod handlers;

pub use error::{DbAccessError, InvokeError, ResponderError};
