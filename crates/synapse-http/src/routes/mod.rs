//! HTTP API route handlers.

pub mod query;
pub mod system;
