//! HTTP application state: wraps `ServiceState` with HTTP-specific fields.
//!
//! `AppState` provides transparent access to all `ServiceState` methods
//! via `Deref`, and adds transport-specific config like CORS origins.

use std::ops::Deref;
use std::sync::Arc;

use synapse_service::ServiceState;

/// Shared HTTP application state, cloneable across handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppInner>,
}

struct AppInner {
    service: ServiceState,
    cors_origins: Vec<String>,
}

impl Deref for AppState {
    type Target = ServiceState;

    fn deref(&self) -> &ServiceState {
        &self.inner.service
    }
}

impl AppState {
    /// Creates a new HTTP application state.
    pub fn new(service: ServiceState, cors_origins: Vec<String>) -> Self {
        Self {
            inner: Arc::new(AppInner {
                service,
                cors_origins,
            }),
        }
    }

    /// Creates a state with the built-in handlers and no CORS (for tests).
    pub fn standard() -> Self {
        Self::new(ServiceState::standard(), vec![])
    }

    /// Returns the configured CORS allowed origins.
    pub fn cors_origins(&self) -> &[String] {
        &self.inner.cors_origins
    }
}
