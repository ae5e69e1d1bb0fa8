//! Query translation endpoints.
//!
//! Both endpoints delegate to `synapse_service::query::QueryService`; the
//! only difference is where the query text comes from.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query, State};
use synapse_service::classify::ErrorResponse;
use synapse_service::error::FailureCondition;
use synapse_service::query::{QueryService, QueryStatement};

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{QueryParams, QueryRequest};

fn translate(state: &AppState, query: Option<String>) -> Result<Json<QueryStatement>, ApiError> {
    let query = query.ok_or_else(|| {
        ApiError::classify(state, &FailureCondition::MissingField("query".to_owned()))
    })?;
    QueryService::translate(state.metrics(), &query)
        .map(Json)
        .map_err(|err| ApiError::classify(state, &err))
}

/// Translate a query passed in the URL.
///
/// The `query` parameter is URL-decoded before parsing, so `+` and `%20`
/// both stand for a space.
#[utoipa::path(
    get,
    path = "/query",
    params(QueryParams),
    responses(
        (status = 200, description = "Query translated", body = QueryStatement),
        (status = 400, description = "Missing or invalid query", body = ErrorResponse),
    ),
    tag = "Query"
)]
pub async fn query_get(
    State(state): State<AppState>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<QueryStatement>, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        ApiError::classify(
            &state,
            &FailureCondition::InvalidArgument(rejection.body_text()),
        )
    })?;
    translate(&state, params.query)
}

/// Translate a query passed in a JSON body.
#[utoipa::path(
    post,
    path = "/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Query translated", body = QueryStatement),
        (status = 400, description = "Missing or invalid query, or malformed body", body = ErrorResponse),
    ),
    tag = "Query"
)]
pub async fn query_post(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryStatement>, ApiError> {
    let Json(req) = body.map_err(|rejection| {
        ApiError::classify(&state, &FailureCondition::MalformedBody(rejection.body_text()))
    })?;
    translate(&state, req.query)
}
