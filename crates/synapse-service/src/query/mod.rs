//! Query statement translation.
//!
//! Turns the SQL-like query text clients send (`select * from dataset where
//! dataset.id == '4494' order by name desc limit 10`) into a structured
//! [`QueryStatement`]. Translation is pure: no I/O, no shared state, so it
//! is safe to call from any number of request handlers concurrently.

mod lexer;
mod parser;
mod statement;

use std::time::Instant;

pub use statement::{
    Comparator, DEFAULT_LIMIT, DEFAULT_OFFSET, FieldRef, Filter, FilterValue, QueryStatement,
};

use crate::error::FailureCondition;
use crate::metrics::Metrics;

/// Tokenizer or grammar failure, carrying a 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error(
        "Lexical error at line {line}, column {column}. Encountered: {encountered} after : \"{after}\""
    )]
    Lexical {
        line: usize,
        column: usize,
        encountered: String,
        after: String,
    },

    #[error("Encountered {found} at line {line}, column {column}. Was expecting: {expected}")]
    Syntax {
        line: usize,
        column: usize,
        found: String,
        expected: String,
    },

    #[error("Number out of range at line {line}, column {column}: {text}")]
    NumberOutOfRange {
        line: usize,
        column: usize,
        text: String,
    },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            Self::Lexical { line, .. }
            | Self::Syntax { line, .. }
            | Self::NumberOutOfRange { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            Self::Lexical { column, .. }
            | Self::Syntax { column, .. }
            | Self::NumberOutOfRange { column, .. } => *column,
        }
    }
}

/// Why a query could not be translated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Well-formed text with a semantically invalid value, e.g. `limit 0`.
    #[error("{0}")]
    InvalidArgument(String),
}

/// Entry point for transports.
///
/// Stateless method collection; metrics are borrowed from `ServiceState`.
pub struct QueryService;

impl QueryService {
    /// Translates already-decoded query text, recording the outcome.
    pub fn translate(metrics: &Metrics, query: &str) -> Result<QueryStatement, FailureCondition> {
        let start = Instant::now();
        match QueryStatement::parse(query) {
            Ok(stmt) => {
                let elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
                metrics.record_query(elapsed_us);
                tracing::debug!(
                    from = %stmt.from,
                    filters = stmt.filters.len(),
                    limit = stmt.limit_or_default(),
                    offset = stmt.offset_or_default(),
                    "query translated"
                );
                Ok(stmt)
            }
            Err(err) => {
                metrics.record_query_error();
                tracing::debug!(error = %err, "query rejected");
                Err(err.into())
            }
        }
    }
}
