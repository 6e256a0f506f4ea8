//! Errors raised while locating clauses, composing queries, or resolving
//! time windows.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The query has no leading `source=` / `index=` declaration.
    #[error("index not found in query `{query}`")]
    IndexNotFound { query: String },

    /// A single insert could not find its insertion point.
    #[error("malformed query: {reason}")]
    MalformedQuery { reason: String },

    /// The resolved window starts after it ends.
    #[error("time range is invalid: `{start}` is after `{end}`")]
    InvalidTimeWindow { start: String, end: String },

    #[error("cannot parse time expression `{expr}`")]
    InvalidTimeExpression { expr: String },
}

impl QueryError {
    pub(crate) fn malformed(step: &str, query: &str) -> Self {
        Self::MalformedQuery {
            reason: format!("cannot insert {} into `{}`: no index clause", step, query),
        }
    }
}

pub type Result<T, E = QueryError> = std::result::Result<T, E>;
