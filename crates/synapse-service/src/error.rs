//! Service-layer failure conditions.
//!
//! `FailureCondition` is transport-agnostic. It is created where a fault is
//! detected, propagated unchanged with `?`, and classified exactly once at
//! the transport boundary by [`crate::classify::ErrorClassifier`].

use crate::query::{ParseError, QueryError};

/// Boxed nested cause carried by datastore and downstream failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every failure the service can report.
#[derive(Debug, thiserror::Error)]
pub enum FailureCondition {
    /// The requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The requested entity exists but has been moved to the trash can.
    #[error("{0}")]
    EntityInTrash(String),

    /// No route matches the request.
    #[error("{method} {path} was not found. Please reference API documentation")]
    NoRoute { method: String, path: String },

    /// The caller lacks permission for the resource or activity.
    #[error("{0}")]
    Unauthorized(String),

    /// The parent of the target entity is in the trash can.
    #[error("{0}")]
    ParentInTrash(String),

    /// An entity with the same name already exists in the container.
    #[error("{0}")]
    NameConflict(String),

    /// The resource was updated more recently than the version in the request.
    #[error("{0}")]
    ConflictingUpdate(String),

    /// An argument failed validation.
    #[error("{0}")]
    InvalidArgument(String),

    /// The submitted model is structurally invalid.
    #[error("{0}")]
    InvalidModel(String),

    /// The request body could not be read or deserialized.
    #[error("{0}")]
    MalformedBody(String),

    /// A required request parameter or header was absent.
    #[error("Required parameter '{0}' is not present")]
    MissingField(String),

    /// The query text could not be tokenized or parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The datastore aborted the transaction after detecting a deadlock.
    #[error("deadlock detected: {message}")]
    Deadlock {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A data access failure that may succeed when retried.
    #[error("transient data access failure: {message}")]
    TransientDataAccess {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A downstream service did not answer in time.
    #[error("external service timed out: {0}")]
    ExternalServiceTimeout(String),

    /// The search cluster could not be reached.
    #[error("search backend unavailable: {message}")]
    SearchUnavailable {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A non-recoverable datastore failure.
    #[error("datastore failure: {message}")]
    Datastore {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FailureCondition {
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("The resource you are attempting to access cannot be found: {id}"))
    }

    pub fn deadlock(message: impl Into<String>) -> Self {
        Self::Deadlock {
            message: message.into(),
            source: None,
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::TransientDataAccess {
            message: message.into(),
            source: None,
        }
    }

    pub fn search_unavailable(message: impl Into<String>, source: Option<BoxError>) -> Self {
        Self::SearchUnavailable {
            message: message.into(),
            source,
        }
    }

    pub fn datastore(message: impl Into<String>, source: Option<BoxError>) -> Self {
        Self::Datastore {
            message: message.into(),
            source,
        }
    }

    /// The registration key for this condition.
    pub fn condition_type(&self) -> ConditionType {
        match self {
            Self::NotFound(_) => ConditionType::NotFound,
            Self::EntityInTrash(_) => ConditionType::EntityInTrash,
            Self::NoRoute { .. } => ConditionType::NoRoute,
            Self::Unauthorized(_) => ConditionType::Unauthorized,
            Self::ParentInTrash(_) => ConditionType::ParentInTrash,
            Self::NameConflict(_) => ConditionType::NameConflict,
            Self::ConflictingUpdate(_) => ConditionType::ConflictingUpdate,
            Self::InvalidArgument(_) => ConditionType::InvalidArgument,
            Self::InvalidModel(_) => ConditionType::InvalidModel,
            Self::MalformedBody(_) => ConditionType::MalformedBody,
            Self::MissingField(_) => ConditionType::MissingField,
            Self::Parse(_) => ConditionType::Parse,
            Self::Deadlock { .. } => ConditionType::Deadlock,
            Self::TransientDataAccess { .. } => ConditionType::TransientDataAccess,
            Self::ExternalServiceTimeout(_) => ConditionType::ExternalServiceTimeout,
            Self::SearchUnavailable { .. } => ConditionType::SearchUnavailable,
            Self::Datastore { .. } => ConditionType::Datastore,
            Self::Internal(_) => ConditionType::Internal,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.condition_type().kind()
    }
}

impl From<QueryError> for FailureCondition {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Parse(e) => Self::Parse(e),
            QueryError::InvalidArgument(msg) => Self::InvalidArgument(msg),
        }
    }
}

/// Field-less mirror of [`FailureCondition`], used as the handler table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConditionType {
    NotFound,
    EntityInTrash,
    NoRoute,
    Unauthorized,
    ParentInTrash,
    NameConflict,
    ConflictingUpdate,
    InvalidArgument,
    InvalidModel,
    MalformedBody,
    MissingField,
    Parse,
    Deadlock,
    TransientDataAccess,
    ExternalServiceTimeout,
    SearchUnavailable,
    Datastore,
    Internal,
}

impl ConditionType {
    pub const ALL: [ConditionType; 18] = [
        Self::NotFound,
        Self::EntityInTrash,
        Self::NoRoute,
        Self::Unauthorized,
        Self::ParentInTrash,
        Self::NameConflict,
        Self::ConflictingUpdate,
        Self::InvalidArgument,
        Self::InvalidModel,
        Self::MalformedBody,
        Self::MissingField,
        Self::Parse,
        Self::Deadlock,
        Self::TransientDataAccess,
        Self::ExternalServiceTimeout,
        Self::SearchUnavailable,
        Self::Datastore,
        Self::Internal,
    ];

    pub fn kind(self) -> ErrorKind {
        match self {
            Self::NotFound | Self::EntityInTrash | Self::NoRoute => ErrorKind::NotFound,
            Self::Unauthorized | Self::ParentInTrash => ErrorKind::Forbidden,
            Self::NameConflict | Self::ConflictingUpdate => ErrorKind::Conflict,
            Self::InvalidArgument
            | Self::InvalidModel
            | Self::MalformedBody
            | Self::MissingField
            | Self::Parse => ErrorKind::InvalidArgument,
            Self::Deadlock
            | Self::TransientDataAccess
            | Self::ExternalServiceTimeout
            | Self::SearchUnavailable => ErrorKind::TransientUnavailable,
            Self::Datastore | Self::Internal => ErrorKind::Internal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::EntityInTrash => "entity_in_trash",
            Self::NoRoute => "no_route",
            Self::Unauthorized => "unauthorized",
            Self::ParentInTrash => "parent_in_trash",
            Self::NameConflict => "name_conflict",
            Self::ConflictingUpdate => "conflicting_update",
            Self::InvalidArgument => "invalid_argument",
            Self::InvalidModel => "invalid_model",
            Self::MalformedBody => "malformed_body",
            Self::MissingField => "missing_field",
            Self::Parse => "parse",
            Self::Deadlock => "deadlock",
            Self::TransientDataAccess => "transient_data_access",
            Self::ExternalServiceTimeout => "external_service_timeout",
            Self::SearchUnavailable => "search_unavailable",
            Self::Datastore => "datastore",
            Self::Internal => "internal",
        }
    }
}

/// Closed failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    InvalidArgument,
    TransientUnavailable,
    Internal,
}
