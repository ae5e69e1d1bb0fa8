//! The HTTP failure boundary.
//!
//! Every failure leaving a handler passes through [`ApiError::classify`],
//! which is the only place in the server where a status code is chosen.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use synapse_service::ServiceState;
use synapse_service::classify::{ErrorResponse, HttpStatus};
use synapse_service::error::FailureCondition;

/// A classified failure, ready to be written as a JSON response.
#[derive(Debug)]
pub struct ApiError {
    status: HttpStatus,
    body: ErrorResponse,
}

impl ApiError {
    /// Classifies a failure with the state's classifier and records it.
    pub fn classify(state: &ServiceState, failure: &FailureCondition) -> Self {
        let classification = state.classifier().classify(failure);
        state
            .metrics()
            .record_failure(failure.condition_type(), classification.status);
        Self {
            status: classification.status,
            body: classification.body,
        }
    }

    pub fn status(&self) -> HttpStatus {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.body.reason
    }
}

fn status_code(status: HttpStatus) -> StatusCode {
    match status {
        HttpStatus::BadRequest => StatusCode::BAD_REQUEST,
        HttpStatus::Forbidden => StatusCode::FORBIDDEN,
        HttpStatus::NotFound => StatusCode::NOT_FOUND,
        HttpStatus::Conflict => StatusCode::CONFLICT,
        HttpStatus::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        HttpStatus::BadGateway => StatusCode::BAD_GATEWAY,
        HttpStatus::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (status_code(self.status), Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synapse_service::error::ConditionType;

    #[test]
    fn status_codes_match_classifier_codes() {
        for status in HttpStatus::ALL {
            assert_eq!(status_code(status).as_u16(), status.code());
        }
    }

    #[test]
    fn classify_records_the_failure() {
        let state = ServiceState::standard();
        let err = ApiError::classify(&state, &FailureCondition::deadlock("lock wait"));
        assert_eq!(err.status(), HttpStatus::ServiceUnavailable);
        assert_eq!(
            err.reason(),
            "service temporarily unavailable, please try again later"
        );
        assert_eq!(state.metrics().failures(ConditionType::Deadlock), 1);
    }

    #[tokio::test]
    async fn response_body_is_reason_json() {
        let state = ServiceState::standard();
        let resp = ApiError::classify(&state, &FailureCondition::MissingField("query".into()))
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"reason": "Required parameter 'query' is not present"})
        );
    }
}
