//! Parsed query representation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::QueryError;
use super::parser::Parser;

/// Page size used when a query has no `limit` clause.
pub const DEFAULT_LIMIT: u64 = 1000;

/// Offset used when a query has no `offset` clause.
pub const DEFAULT_OFFSET: u64 = 0;

/// A parsed query, ready for a downstream executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct QueryStatement {
    /// Entity type the query targets, e.g. `dataset`.
    pub from: String,
    /// Selected columns, or `None` for `select *`.
    pub select: Option<Vec<String>>,
    /// `where` conditions in source order.
    pub filters: Vec<Filter>,
    pub sort_table: Option<String>,
    pub sort_field: Option<String>,
    pub ascending: bool,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl QueryStatement {
    /// Parses a decoded query string.
    pub fn parse(query: &str) -> Result<Self, QueryError> {
        Parser::new(query)?.parse()
    }

    pub fn limit_or_default(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn offset_or_default(&self) -> u64 {
        self.offset.unwrap_or(DEFAULT_OFFSET)
    }

    /// True when the query selects every column.
    pub fn selects_all(&self) -> bool {
        self.select.is_none()
    }
}

impl FromStr for QueryStatement {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// One `field comparator literal` condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Filter {
    pub field: FieldRef,
    pub comparator: Comparator,
    /// A string, an integer or `null`.
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub value: FilterValue,
}

/// A possibly table-qualified field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldRef {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub table: Option<String>,
    pub name: String,
}

impl FieldRef {
    pub fn new(table: Option<String>, name: impl Into<String>) -> Self {
        Self {
            table,
            name: name.into(),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{table}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Comparator {
    #[serde(rename = "==")]
    Equals,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    GreaterThanOrEquals,
    #[serde(rename = "<=")]
    LessThanOrEquals,
}

impl Comparator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterThanOrEquals => ">=",
            Self::LessThanOrEquals => "<=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Literal on the right-hand side of a filter.
///
/// Quoted literals stay strings even when they look numeric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Long(i64),
    String(String),
    Null,
}

impl FilterValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "'{s}'"),
            Self::Null => f.write_str("null"),
        }
    }
}
