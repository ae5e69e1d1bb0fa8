//! Request and response bodies owned by the HTTP layer.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Body of `POST /query`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct QueryRequest {
    /// Query text, e.g. `select * from dataset where dataset.id == '4494'`.
    pub query: Option<String>,
}

/// Query string of `GET /query`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QueryParams {
    /// URL-encoded query text.
    pub query: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Server status ("ok").
    pub status: String,
    /// Server version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_seconds: u64,
    /// Number of failure handlers registered with the classifier.
    pub failure_handlers: usize,
}
