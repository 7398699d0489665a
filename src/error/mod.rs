//! Error handling
//!
//! Defines error types and their HTTP mapping.

pub mod handlers;
pub mod types;

pub use types::*;
