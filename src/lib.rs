//! Synapse Server - query translation and failure classification over HTTP.
//!
//! The core logic lives in `synapse-service`; `synapse-http` adapts it to
//! axum. This crate adds configuration and the binary entry point.

pub mod config;

pub use synapse_http::{AppState, router, serve};
pub use synapse_service::ServiceState;
