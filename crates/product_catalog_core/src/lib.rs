//! Shared product catalog domain primitives.
//!
//! This crate owns the product model, the fixed SQL statements, runtime
//! settings, Lambda request/response contracts, and the stack definition that
//! synthesizes the CloudFormation template. It intentionally excludes AWS SDK
//! and Lambda runtime concerns.

pub mod contract;
pub mod product;
pub mod settings;
pub mod sql;
pub mod stack;
