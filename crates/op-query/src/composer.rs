//! # Query Composer
//!
//! Splices a time window, a panel filter and a field projection into a base
//! PPL query. Every stage is placed relative to the index declaration:
//!
//! ```text
//! <index> | <time range> | <filter> | <fields> <rest of the base query>
//! ```
//!
//! Stages that have nothing to add are left out; they never move the others.

use std::fmt;

use crate::clause::{FieldsClause, IndexClause, IndexDeclaration, RangeFilterClause, Recognizer, TimeRangeClause};
use crate::error::{QueryError, Result};
use crate::time::TimeWindow;

/// Locate the index declaration opening `query`.
pub fn extract_index(query: &str) -> Result<IndexDeclaration<'_>> {
    IndexClause::locate(query).ok_or_else(|| QueryError::IndexNotFound {
        query: query.to_string(),
    })
}

/// `true` when the query already filters on a `timestamp(...)` bound.
pub fn has_time_range_clause(query: &str) -> bool {
    TimeRangeClause::is_present(query)
}

/// Insert a `where` stage bounding `window.field` right after the index.
///
/// A query that carries its own time range is returned unchanged: the range
/// written in the query always wins over the date picker.
pub fn insert_time_range(query: &str, window: &TimeWindow) -> Result<String> {
    let decl = IndexClause::locate(query).ok_or_else(|| QueryError::malformed("time range", query))?;
    if has_time_range_clause(query) {
        tracing::debug!(query, "query has its own time range, keeping it");
        return Ok(query.to_string());
    }
    Ok(format!(
        "{}{}{}",
        &query[..decl.end()],
        time_range_stage(window),
        decl.remainder()
    ))
}

/// Layer a filter stage after the leading time range (or the index).
///
/// Existing `where` stages are never replaced; the filter is added alongside
/// them.
pub fn insert_filter(query: &str, filter: &str) -> Result<String> {
    let Some(stage) = filter_stage(filter) else {
        return Ok(query.to_string());
    };
    let at = filter_anchor(query).ok_or_else(|| QueryError::malformed("filter", query))?;
    Ok(format!("{}{}{}", &query[..at], stage, &query[at..]))
}

/// Insert a `fields` stage right after the index.
///
/// When the query already projects fields it is returned unchanged; the two
/// lists are not merged.
pub fn insert_fields<S: AsRef<str>>(query: &str, fields: &[S]) -> Result<String> {
    let Some(stage) = fields_stage(fields) else {
        return Ok(query.to_string());
    };
    if FieldsClause::is_present(query) {
        tracing::debug!(query, "query already projects fields, keeping them");
        return Ok(query.to_string());
    }
    let decl = IndexClause::locate(query).ok_or_else(|| QueryError::malformed("fields", query))?;
    Ok(format!("{}{}{}", &query[..decl.end()], stage, decl.remainder()))
}

/// Build the final query a visualization or the query bar executes.
pub fn compose_final_query<S: AsRef<str>>(
    base: &str,
    window: &TimeWindow,
    filter: &str,
    fields: &[S],
) -> Result<String> {
    Composition::new(base, window, filter, fields).map(|c| c.to_string())
}

/// A base query broken into the stages the composer controls.
///
/// Rendering a `Composition` is the only place the stage order is decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition<'a> {
    head: &'a str,
    time_range: Option<String>,
    filter: Option<String>,
    fields: Option<String>,
    remainder: &'a str,
}

impl<'a> Composition<'a> {
    pub fn new<S: AsRef<str>>(
        base: &'a str,
        window: &TimeWindow,
        filter: &str,
        fields: &[S],
    ) -> Result<Self> {
        let decl = extract_index(base)?;

        let (time_range, split) = if has_time_range_clause(base) {
            tracing::debug!(query = base, "query has its own time range, keeping it");
            (None, filter_anchor(base).unwrap_or(decl.end()))
        } else {
            (Some(time_range_stage(window)), decl.end())
        };

        let fields = if FieldsClause::is_present(base) {
            tracing::debug!(query = base, "query already projects fields, keeping them");
            None
        } else {
            fields_stage(fields)
        };

        Ok(Self {
            head: &base[..split],
            time_range,
            filter: filter_stage(filter),
            fields,
            remainder: &base[split..],
        })
    }

    pub fn time_range(&self) -> Option<&str> {
        self.time_range.as_deref()
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn fields(&self) -> Option<&str> {
        self.fields.as_deref()
    }

    pub fn remainder(&self) -> &'a str {
        self.remainder
    }
}

impl fmt::Display for Composition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.head)?;
        for stage in [&self.time_range, &self.filter, &self.fields].into_iter().flatten() {
            f.write_str(stage)?;
        }
        f.write_str(self.remainder)
    }
}

fn time_range_stage(window: &TimeWindow) -> String {
    let TimeWindow { start, end, field } = window;
    format!(" | where {field} >= timestamp('{start}') and {field} <= timestamp('{end}')")
}

fn filter_stage(filter: &str) -> Option<String> {
    let filter = filter.trim();
    let filter = filter.strip_prefix('|').unwrap_or(filter).trim_start();
    (!filter.is_empty()).then(|| format!(" | {filter}"))
}

fn fields_stage<S: AsRef<str>>(fields: &[S]) -> Option<String> {
    let names: Vec<&str> = fields
        .iter()
        .map(|f| f.as_ref().trim())
        .filter(|f| !f.is_empty())
        .collect();
    (!names.is_empty()).then(|| format!(" | fields {}", names.join(", ")))
}

/// Byte offset where a filter stage goes: after a range-bound `where` that
/// directly follows the index, otherwise right after the index.
fn filter_anchor(query: &str) -> Option<usize> {
    let decl = IndexClause::locate(query)?;
    Some(RangeFilterClause::find(query).map_or(decl.end(), |span| span.end))
}
