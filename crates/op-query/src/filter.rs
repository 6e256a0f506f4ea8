//! Panel filter checks and saved-query cleanup.
//!
//! A panel filter is layered onto every visualization query of the panel, so
//! it may only narrow results. The index, time range and projection belong to
//! the visualization and the date picker.

use thiserror::Error;

use crate::clause::{FieldsClause, IndexClause, Recognizer, TimeRangeClause};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FilterRejection {
    #[error("Please remove index from PPL Filter")]
    ContainsIndex,
    #[error("Please remove time filter from PPL Filter")]
    ContainsTimeRange,
    #[error("Please remove fields from PPL Filter")]
    ContainsFields,
}

/// Check that `filter` carries no index, time range or `fields` stage.
pub fn validate_panel_filter(filter: &str) -> Result<(), FilterRejection> {
    // Filters are written without a leading pipe; add one so the first
    // stage is recognized like any other.
    let filter = filter.trim();
    let staged = format!("| {}", filter.strip_prefix('|').unwrap_or(filter).trim_start());

    let rejection = if IndexClause::locate_anywhere(&staged).is_some() {
        Some(FilterRejection::ContainsIndex)
    } else if TimeRangeClause::is_present(&staged) {
        Some(FilterRejection::ContainsTimeRange)
    } else if FieldsClause::is_present(&staged) {
        Some(FilterRejection::ContainsFields)
    } else {
        None
    };

    match rejection {
        Some(r) => {
            tracing::warn!(filter, reason = %r, "panel filter rejected");
            Err(r)
        }
        None => Ok(()),
    }
}

/// Drop an embedded time-range stage so the panel's window applies instead.
pub fn strip_time_range(query: &str) -> String {
    match TimeRangeClause::find(query) {
        Some(span) => format!("{}{}", &query[..span.start], &query[span.end..]),
        None => query.to_string(),
    }
}
