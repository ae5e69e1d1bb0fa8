//! Failure classification: maps a [`FailureCondition`] to an HTTP status and
//! a client-safe reason string.
//!
//! The mapping lives in the static [`HANDLERS`] table. An [`ErrorClassifier`]
//! is populated from it once at startup and is read-only afterwards, so it
//! can be shared across request handlers behind an `Arc` without locking.

use std::collections::HashMap;
use std::error::Error as _;

use serde::{Deserialize, Serialize};

use crate::error::{ConditionType, FailureCondition};

/// Reason returned for deadlocks and other retryable datastore failures.
pub const SERVICE_TEMPORARILY_UNAVAILABLE: &str =
    "service temporarily unavailable, please try again later";

/// Reason returned when the search cluster cannot be reached.
pub const SEARCH_FAILED: &str = "search failed, try again";

/// Reason returned for authorization failures.
pub const NOT_AUTHORIZED: &str =
    "You are not authorized to access the requested resource and/or perform the requested activity";

/// Reason returned for internal failures and unregistered conditions.
pub const INTERNAL_ERROR: &str =
    "An internal error occurred. Please contact the platform team if the problem persists.";

/// Longest reason echoed back to a client.
pub const MAX_REASON_LEN: usize = 256;

/// HTTP statuses the classifier can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpStatus {
    BadRequest,
    Forbidden,
    NotFound,
    Conflict,
    InternalServerError,
    BadGateway,
    ServiceUnavailable,
}

impl HttpStatus {
    pub const ALL: [HttpStatus; 7] = [
        Self::BadRequest,
        Self::Forbidden,
        Self::NotFound,
        Self::Conflict,
        Self::InternalServerError,
        Self::BadGateway,
        Self::ServiceUnavailable,
    ];

    pub fn code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::InternalServerError => 500,
            Self::BadGateway => 502,
            Self::ServiceUnavailable => 503,
        }
    }

    pub fn is_server_error(self) -> bool {
        self.code() >= 500
    }
}

/// How the reason string is derived for a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonTemplate {
    /// Echo the condition's own message after sanitizing it.
    Message,
    /// Echo the message behind a fixed prefix.
    Prefixed(&'static str),
    /// Always return this text.
    Fixed(&'static str),
}

/// One row of the handler table.
#[derive(Debug, Clone, Copy)]
pub struct HandlerEntry {
    pub condition: ConditionType,
    pub status: HttpStatus,
    pub reason: ReasonTemplate,
    /// Log the full error chain instead of a single line.
    pub full_trace: bool,
}

const fn entry(
    condition: ConditionType,
    status: HttpStatus,
    reason: ReasonTemplate,
    full_trace: bool,
) -> HandlerEntry {
    HandlerEntry {
        condition,
        status,
        reason,
        full_trace,
    }
}

/// Built-in handlers. Every [`ConditionType`] appears exactly once.
///
/// Deadlock and generic transient access are registered separately even
/// though they currently share a status and reason.
pub static HANDLERS: &[HandlerEntry] = &[
    entry(
        ConditionType::NotFound,
        HttpStatus::NotFound,
        ReasonTemplate::Message,
        false,
    ),
    entry(
        ConditionType::EntityInTrash,
        HttpStatus::NotFound,
        ReasonTemplate::Message,
        true,
    ),
    entry(
        ConditionType::NoRoute,
        HttpStatus::NotFound,
        ReasonTemplate::Message,
        false,
    ),
    entry(
        ConditionType::Unauthorized,
        HttpStatus::Forbidden,
        ReasonTemplate::Fixed(NOT_AUTHORIZED),
        false,
    ),
    entry(
        ConditionType::ParentInTrash,
        HttpStatus::Forbidden,
        ReasonTemplate::Message,
        true,
    ),
    entry(
        ConditionType::NameConflict,
        HttpStatus::Conflict,
        ReasonTemplate::Message,
        false,
    ),
    entry(
        ConditionType::ConflictingUpdate,
        HttpStatus::Conflict,
        ReasonTemplate::Message,
        false,
    ),
    entry(
        ConditionType::InvalidArgument,
        HttpStatus::BadRequest,
        ReasonTemplate::Message,
        false,
    ),
    entry(
        ConditionType::InvalidModel,
        HttpStatus::BadRequest,
        ReasonTemplate::Message,
        false,
    ),
    entry(
        ConditionType::MalformedBody,
        HttpStatus::BadRequest,
        ReasonTemplate::Prefixed("Malformed request body: "),
        false,
    ),
    entry(
        ConditionType::MissingField,
        HttpStatus::BadRequest,
        ReasonTemplate::Message,
        false,
    ),
    entry(
        ConditionType::Parse,
        HttpStatus::BadRequest,
        ReasonTemplate::Message,
        false,
    ),
    entry(
        ConditionType::Deadlock,
        HttpStatus::ServiceUnavailable,
        ReasonTemplate::Fixed(SERVICE_TEMPORARILY_UNAVAILABLE),
        true,
    ),
    entry(
        ConditionType::TransientDataAccess,
        HttpStatus::ServiceUnavailable,
        ReasonTemplate::Fixed(SERVICE_TEMPORARILY_UNAVAILABLE),
        true,
    ),
    entry(
        ConditionType::ExternalServiceTimeout,
        HttpStatus::ServiceUnavailable,
        ReasonTemplate::Fixed(SERVICE_TEMPORARILY_UNAVAILABLE),
        true,
    ),
    entry(
        ConditionType::SearchUnavailable,
        HttpStatus::BadGateway,
        ReasonTemplate::Fixed(SEARCH_FAILED),
        true,
    ),
    entry(
        ConditionType::Datastore,
        HttpStatus::InternalServerError,
        ReasonTemplate::Fixed(INTERNAL_ERROR),
        true,
    ),
    entry(
        ConditionType::Internal,
        HttpStatus::InternalServerError,
        ReasonTemplate::Fixed(INTERNAL_ERROR),
        true,
    ),
];

/// Wire body returned for every failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    /// Human-readable reason, safe to show to the caller.
    pub reason: String,
}

/// Result of classifying a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: HttpStatus,
    pub body: ErrorResponse,
}

/// Registry of failure handlers.
#[derive(Debug, Default)]
pub struct ErrorClassifier {
    handlers: HashMap<ConditionType, HandlerEntry>,
}

impl ErrorClassifier {
    /// An empty classifier. Every condition falls back to 500.
    pub fn new() -> Self {
        Self::default()
    }

    /// A classifier with every entry of [`HANDLERS`] registered.
    pub fn standard() -> Self {
        let mut classifier = Self::new();
        for handler in HANDLERS {
            classifier.register(*handler);
        }
        classifier
    }

    /// Registers a handler for one condition type.
    ///
    /// # Panics
    ///
    /// Panics if the condition type already has a handler. Registration
    /// happens during startup, so a duplicate is a programming error.
    pub fn register_handler(
        &mut self,
        condition: ConditionType,
        status: HttpStatus,
        reason: ReasonTemplate,
    ) {
        self.register(HandlerEntry {
            condition,
            status,
            reason,
            full_trace: status.is_server_error(),
        });
    }

    fn register(&mut self, handler: HandlerEntry) {
        let previous = self.handlers.insert(handler.condition, handler);
        assert!(
            previous.is_none(),
            "duplicate failure handler registered for {:?}",
            handler.condition
        );
    }

    /// Condition types that have a handler, in declaration order.
    pub fn registered_types(&self) -> Vec<ConditionType> {
        let mut types: Vec<_> = self.handlers.keys().copied().collect();
        types.sort();
        types
    }

    pub fn handler(&self, condition: ConditionType) -> Option<&HandlerEntry> {
        self.handlers.get(&condition)
    }

    /// Maps a failure to a status and reason. Never fails.
    pub fn classify(&self, failure: &FailureCondition) -> Classification {
        let condition = failure.condition_type();

        let Some(handler) = self.handlers.get(&condition) else {
            tracing::error!(
                condition = condition.label(),
                error = %failure,
                "no failure handler registered, responding with internal error"
            );
            return Classification {
                status: HttpStatus::InternalServerError,
                body: ErrorResponse {
                    reason: INTERNAL_ERROR.to_owned(),
                },
            };
        };

        if handler.full_trace {
            tracing::error!(
                condition = condition.label(),
                status = handler.status.code(),
                error = %error_chain(failure),
                "request failed"
            );
        } else {
            tracing::warn!(
                condition = condition.label(),
                status = handler.status.code(),
                "request failed: {failure}"
            );
        }

        let reason = match handler.reason {
            ReasonTemplate::Fixed(text) => text.to_owned(),
            ReasonTemplate::Message => sanitize_reason(&failure.to_string()),
            ReasonTemplate::Prefixed(prefix) => sanitize_reason(&format!("{prefix}{failure}")),
        };

        Classification {
            status: handler.status,
            body: ErrorResponse { reason },
        }
    }
}

/// Reduces a message to a short, single-line fragment that is safe to return.
pub fn sanitize_reason(message: &str) -> String {
    let first_line = message.lines().next().unwrap_or_default().trim_end();
    match first_line.char_indices().nth(MAX_REASON_LEN) {
        Some((idx, _)) => format!("{}...", &first_line[..idx]),
        None => first_line.to_owned(),
    }
}

fn error_chain(failure: &FailureCondition) -> String {
    let mut out = failure.to_string();
    let mut source = failure.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
