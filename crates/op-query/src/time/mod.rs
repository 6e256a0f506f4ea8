//! # Time Windows
//!
//! The composer only ever sees a [`TimeWindow`] whose bounds are already
//! formatted with [`PPL_DATE_FORMAT`]. Turning date-picker expressions into
//! such a window (and checking that it is not inverted) happens here, on the
//! caller's side of the composer.

pub mod datemath;

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

/// Timestamp layout substituted into `timestamp('...')` literals.
pub const PPL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Time field used when the caller does not name one.
pub const DEFAULT_TIME_FIELD: &str = "utc_time";

/// How many date ranges [`RecentRanges`] remembers.
pub const RECENT_RANGES_CAPACITY: usize = 10;

/// A resolved time window on a named field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
    pub field: String,
}

impl TimeWindow {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            field: DEFAULT_TIME_FIELD.to_string(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Resolve a date-picker range against `now`.
    ///
    /// `from` rounds down and `to` rounds up, so `now/d` to `now/d` covers the
    /// whole day. Fails with [`QueryError::InvalidTimeWindow`] when the
    /// resolved start is after the resolved end.
    pub fn resolve(range: &TimeRange, field: &str, now: DateTime<Utc>) -> Result<Self> {
        let start = datemath::parse(&range.from, now, false)?;
        let end = datemath::parse(&range.to, now, true)?;
        if start > end {
            return Err(QueryError::InvalidTimeWindow {
                start: range.from.clone(),
                end: range.to.clone(),
            });
        }
        Ok(Self {
            start: start.format(PPL_DATE_FORMAT).to_string(),
            end: end.format(PPL_DATE_FORMAT).to_string(),
            field: field.to_string(),
        })
    }
}

/// Raw date-picker bounds, e.g. `now-15m` to `now`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: String,
    pub to: String,
}

impl TimeRange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::new("now-1d", "now")
    }
}

/// Most-recently-used date ranges, newest first, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentRanges {
    ranges: VecDeque<TimeRange>,
}

impl RecentRanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `range` as the latest selection.
    pub fn push(&mut self, range: TimeRange) {
        self.ranges.retain(|r| r != &range);
        self.ranges.push_front(range);
        self.ranges.truncate(RECENT_RANGES_CAPACITY);
    }

    pub fn latest(&self) -> Option<&TimeRange> {
        self.ranges.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeRange> {
        self.ranges.iter()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
