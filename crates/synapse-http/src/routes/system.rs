//! System and health endpoints.

use axum::extract::{Json, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::IntoResponse;
use synapse_service::error::FailureCondition;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::HealthResponse;

/// Check server health.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse),
    ),
    tag = "System"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_secs(),
        failure_handlers: state.classifier().registered_types().len(),
    })
}

/// Prometheus-compatible metrics endpoint.
pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.metrics().render(state.uptime_secs());

    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}

/// Fallback for requests that match no route.
pub async fn no_route(State(state): State<AppState>, method: Method, uri: Uri) -> ApiError {
    ApiError::classify(
        &state,
        &FailureCondition::NoRoute {
            method: method.to_string(),
            path: uri.path().to_owned(),
        },
    )
}
