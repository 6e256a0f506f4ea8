//! # op-query: PPL query composition for operational panels
//!
//! Turns a saved or typed PPL query plus the panel's context (time window,
//! panel filter, field projection) into the single query string that gets
//! executed. Pure string work: no I/O, no shared state, safe to call from
//! anywhere.
//!
//! - [`clause`]: named recognizers for the index, time range and `fields` stages.
//! - [`composer`]: the insert operations and [`compose_final_query`].
//! - [`time`]: [`TimeWindow`], date-math resolution, recent ranges.
//! - [`filter`]: panel filter validation.

pub mod clause;
pub mod composer;
pub mod error;
pub mod filter;
pub mod time;

pub use clause::{recognize, ClauseKind, ClauseMatch, IndexDeclaration, IndexKeyword};
pub use composer::{
    compose_final_query, extract_index, has_time_range_clause, insert_fields, insert_filter,
    insert_time_range, Composition,
};
pub use error::{QueryError, Result};
pub use filter::{strip_time_range, validate_panel_filter, FilterRejection};
pub use time::{RecentRanges, TimeRange, TimeWindow, DEFAULT_TIME_FIELD, PPL_DATE_FORMAT};
