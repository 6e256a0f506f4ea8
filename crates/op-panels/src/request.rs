//! # Visualization Requests
//!
//! Every refresh or date-range change recomposes each visualization's query
//! from its saved text and the panel context:
//!
//! ```text
//! saved query ──┐
//! date range ───┼── compose_final_query ──► { "query": "...", "format": "viz" }
//! panel filter ─┘
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use op_query::{compose_final_query, validate_panel_filter, TimeRange, TimeWindow};
use serde::{Deserialize, Serialize};

use crate::{Panel, PanelError, SavedVisualization};

/// Body sent to the query service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PplRequest {
    pub query: String,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "viz".to_string()
}

impl PplRequest {
    pub fn new(query: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            format: format.into(),
        }
    }

    pub fn viz(query: impl Into<String>) -> Self {
        Self::new(query, default_format())
    }
}

/// Everything a visualization needs from its panel, passed explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelContext {
    pub time_range: TimeRange,
    pub filter: String,
    pub now: DateTime<Utc>,
}

impl PanelContext {
    pub fn for_panel(panel: &Panel, now: DateTime<Utc>) -> Self {
        Self {
            time_range: panel.time_range.clone(),
            filter: panel.query_filter.query.clone(),
            now,
        }
    }
}

/// Compose the request for one saved visualization.
pub fn visualization_request(
    saved: &SavedVisualization,
    ctx: &PanelContext,
) -> Result<PplRequest, PanelError> {
    let filter = unescape(&ctx.filter);
    validate_panel_filter(&filter)?;

    let window = TimeWindow::resolve(&ctx.time_range, &saved.time_field, ctx.now)?;
    let no_fields: [&str; 0] = [];
    let query = compose_final_query(&unescape(&saved.query), &window, &filter, &no_fields)?;

    tracing::debug!(visualization = %saved.id, %query, "composed visualization query");
    Ok(PplRequest::viz(query))
}

/// Requests for every visualization on `panel`, keyed by panel visualization
/// id. One failing visualization does not hide the others.
pub fn panel_requests(
    panel: &Panel,
    saved: &[SavedVisualization],
    now: DateTime<Utc>,
) -> BTreeMap<String, Result<PplRequest, PanelError>> {
    let ctx = PanelContext::for_panel(panel, now);
    panel
        .visualizations
        .iter()
        .map(|v| {
            let request = saved
                .iter()
                .find(|s| s.id == v.saved_visualization_id)
                .ok_or_else(|| PanelError::SavedVisualizationNotFound {
                    id: v.saved_visualization_id.clone(),
                })
                .and_then(|s| visualization_request(s, &ctx));
            if let Err(e) = &request {
                tracing::warn!(visualization = %v.id, error = %e, "cannot build visualization request");
            }
            (v.id.clone(), request)
        })
        .collect()
}

/// Undo the HTML entity escaping applied to stored queries and filters.
fn unescape(text: &str) -> String {
    text.replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
