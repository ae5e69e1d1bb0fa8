//! Synapse Service: core logic for the Synapse query server.
//!
//! This crate contains all transport-agnostic logic: the failure taxonomy,
//! the failure classifier, query translation and metrics.
//!
//! The transport crate (`synapse-http`) depends on this crate and turns
//! classifications into protocol responses.
//!
//! **Zero transport dependencies**: no axum, no hyper, no wire-protocol code.

pub mod classify;
pub mod error;
pub mod metrics;
pub mod query;

use std::sync::Arc;
use std::time::Instant;

use classify::ErrorClassifier;
use metrics::Metrics;

/// Shared service state, cloneable across all transport handlers.
///
/// Wraps all business-layer components in an `Arc`. The classifier is
/// fully populated before the state is constructed and never mutated
/// afterwards.
#[derive(Clone)]
pub struct ServiceState {
    inner: Arc<Inner>,
}

struct Inner {
    classifier: ErrorClassifier,
    metrics: Metrics,
    start_time: Instant,
}

impl ServiceState {
    /// Creates a service state around an already-registered classifier.
    pub fn new(classifier: ErrorClassifier) -> Self {
        Self {
            inner: Arc::new(Inner {
                classifier,
                metrics: Metrics::new(),
                start_time: Instant::now(),
            }),
        }
    }

    /// Creates a state with the built-in handler table.
    pub fn standard() -> Self {
        Self::new(ErrorClassifier::standard())
    }

    // --- Accessors ---

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.inner.classifier
    }

    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    pub fn uptime_secs(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConditionType;

    #[test]
    fn standard_state_has_every_handler() {
        let state = ServiceState::standard();
        assert_eq!(
            state.classifier().registered_types(),
            ConditionType::ALL.to_vec()
        );
    }

    #[test]
    fn clones_share_metrics() {
        let state = ServiceState::standard();
        let clone = state.clone();
        clone.metrics().record_query_error();
        assert!(state.metrics().render(0).contains("synapse_query_errors_total 1"));
    }
}
