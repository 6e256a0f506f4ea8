//! # Operational Panels
//!
//! A panel is a named grid of saved visualizations sharing one date range and
//! one PPL filter. This crate owns the panel model and turns each
//! visualization into the request the query service executes; rendering and
//! storage live elsewhere.

pub mod layout;
pub mod request;

use op_query::{FilterRejection, QueryError, TimeRange};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use layout::{new_visualization_dimensions, Dimensions, GridItem};
pub use request::{panel_requests, visualization_request, PanelContext, PplRequest};

/// Panel and visualization names must be shorter than this.
pub const MAX_NAME_LENGTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelError {
    #[error("invalid name `{name}`: must be 1 to {} characters", MAX_NAME_LENGTH - 1)]
    InvalidName { name: String },

    #[error("visualization `{id}` is not on this panel")]
    VisualizationNotFound { id: String },

    #[error("saved visualization `{id}` not found")]
    SavedVisualizationNotFound { id: String },

    #[error(transparent)]
    Filter(#[from] FilterRejection),

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// `true` for non-empty names shorter than [`MAX_NAME_LENGTH`].
pub fn is_name_valid(name: &str) -> bool {
    let len = name.chars().count();
    len > 0 && len < MAX_NAME_LENGTH
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VisualizationType {
    Bar,
    HorizontalBar,
    Line,
}

fn default_time_field() -> String {
    "timestamp".to_string()
}

/// A named query + chart type, shared by every panel that shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedVisualization {
    pub id: String,
    #[serde(alias = "title")]
    pub name: String,
    pub query: String,
    #[serde(rename = "type")]
    pub kind: VisualizationType,
    #[serde(default = "default_time_field")]
    pub time_field: String,
}

impl SavedVisualization {
    /// Save an explorer query as a visualization.
    ///
    /// Any time range written into the query is dropped: on a panel the
    /// panel's date range applies.
    pub fn new(
        name: impl Into<String>,
        query: &str,
        kind: VisualizationType,
        time_field: impl Into<String>,
    ) -> Result<Self, PanelError> {
        let name = name.into();
        if !is_name_valid(&name) {
            return Err(PanelError::InvalidName { name });
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().as_simple().to_string(),
            name,
            query: op_query::strip_time_range(query),
            kind,
            time_field: time_field.into(),
        })
    }
}

/// A saved visualization placed on a panel's grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelVisualization {
    pub id: String,
    pub saved_visualization_id: String,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl PanelVisualization {
    fn new(saved_visualization_id: impl Into<String>, dims: Dimensions) -> Self {
        Self {
            id: format!("panel_viz_{}", uuid::Uuid::new_v4()),
            saved_visualization_id: saved_visualization_id.into(),
            x: dims.x,
            y: dims.y,
            w: dims.w,
            h: dims.h,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }

    fn place(&mut self, dims: Dimensions) {
        self.x = dims.x;
        self.y = dims.y;
        self.w = dims.w;
        self.h = dims.h;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub query: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "ppl".to_string()
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            query: String::new(),
            language: default_language(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    pub id: String,
    pub name: String,
    pub date_created: String,
    pub date_modified: String,
    #[serde(default)]
    pub visualizations: Vec<PanelVisualization>,
    #[serde(default)]
    pub time_range: TimeRange,
    #[serde(default)]
    pub query_filter: QueryFilter,
}

impl Panel {
    pub fn new(name: impl Into<String>) -> Result<Self, PanelError> {
        let name = name.into();
        if !is_name_valid(&name) {
            return Err(PanelError::InvalidName { name });
        }
        let now = chrono::Utc::now().to_rfc3339();
        Ok(Self {
            id: format!("panel-{}", uuid::Uuid::new_v4().as_simple()),
            name,
            date_created: now.clone(),
            date_modified: now,
            visualizations: Vec::new(),
            time_range: TimeRange::default(),
            query_filter: QueryFilter::default(),
        })
    }

    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), PanelError> {
        let name = name.into();
        if !is_name_valid(&name) {
            return Err(PanelError::InvalidName { name });
        }
        self.name = name;
        self.touch();
        Ok(())
    }

    /// Set the panel filter after checking it only narrows results.
    pub fn set_filter(&mut self, query: impl Into<String>) -> Result<(), PanelError> {
        let query = query.into();
        op_query::validate_panel_filter(&query)?;
        self.query_filter.query = query;
        self.touch();
        Ok(())
    }

    pub fn set_time_range(&mut self, range: TimeRange) {
        self.time_range = range;
        self.touch();
    }

    /// Place a saved visualization below everything else on the grid.
    pub fn add_visualization(&mut self, saved_visualization_id: impl Into<String>) -> &PanelVisualization {
        let dims = new_visualization_dimensions(&self.visualizations);
        self.visualizations
            .push(PanelVisualization::new(saved_visualization_id, dims));
        self.touch();
        &self.visualizations[self.visualizations.len() - 1]
    }

    /// Swap the saved visualization behind `id`, keeping its grid cell.
    pub fn replace_visualization(
        &mut self,
        id: &str,
        saved_visualization_id: impl Into<String>,
    ) -> Result<&PanelVisualization, PanelError> {
        let idx = self.position(id)?;
        let dims = self.visualizations[idx].dimensions();
        self.visualizations[idx] = PanelVisualization::new(saved_visualization_id, dims);
        self.touch();
        Ok(&self.visualizations[idx])
    }

    pub fn remove_visualization(&mut self, id: &str) -> Result<PanelVisualization, PanelError> {
        let idx = self.position(id)?;
        let removed = self.visualizations.remove(idx);
        self.touch();
        Ok(removed)
    }

    /// Copy grid positions from an edited layout. Items naming unknown
    /// visualizations are ignored.
    pub fn apply_layout(&mut self, layout: &[GridItem]) {
        for item in layout {
            if let Some(v) = self.visualizations.iter_mut().find(|v| v.id == item.i) {
                v.place(item.dimensions());
            }
        }
        self.touch();
    }

    pub fn layout(&self) -> Vec<GridItem> {
        self.visualizations
            .iter()
            .map(|v| GridItem {
                i: v.id.clone(),
                x: v.x,
                y: v.y,
                w: v.w,
                h: v.h,
            })
            .collect()
    }

    fn position(&self, id: &str) -> Result<usize, PanelError> {
        self.visualizations
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| PanelError::VisualizationNotFound { id: id.to_string() })
    }

    fn touch(&mut self) {
        self.date_modified = chrono::Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_validation() {
        assert!(!is_name_valid(""));
        assert!(is_name_valid("Flights"));
        assert!(is_name_valid(&"a".repeat(49)));
        assert!(!is_name_valid(&"a".repeat(50)));
        assert!(matches!(Panel::new(""), Err(PanelError::InvalidName { .. })));
    }

    #[test]
    fn test_add_replace_remove() {
        let mut panel = Panel::new("Flights").unwrap();
        let first = panel.add_visualization("saved-1").clone();
        let second = panel.add_visualization("saved-2").clone();
        assert!(first.id.starts_with("panel_viz_"));
        assert_eq!(second.y, first.y + first.h);

        let replaced = panel.replace_visualization(&second.id, "saved-3").unwrap().clone();
        assert_ne!(replaced.id, second.id);
        assert_eq!(replaced.saved_visualization_id, "saved-3");
        assert_eq!(replaced.dimensions(), second.dimensions());

        assert_eq!(panel.remove_visualization(&first.id).unwrap().id, first.id);
        assert_eq!(panel.visualizations.len(), 1);
        assert!(matches!(
            panel.remove_visualization(&first.id),
            Err(PanelError::VisualizationNotFound { .. })
        ));
    }

    #[test]
    fn test_apply_layout_merges_positions() {
        let mut panel = Panel::new("Flights").unwrap();
        let a = panel.add_visualization("saved-1").id.clone();
        let b = panel.add_visualization("saved-2").id.clone();
        panel.apply_layout(&[
            GridItem { i: a.clone(), x: 0, y: 0, w: 3, h: 2 },
            GridItem { i: b.clone(), x: 3, y: 0, w: 6, h: 4 },
            GridItem { i: "gone".into(), x: 9, y: 9, w: 1, h: 1 },
        ]);
        let layout = panel.layout();
        assert_eq!(layout[0], GridItem { i: a, x: 0, y: 0, w: 3, h: 2 });
        assert_eq!(layout[1], GridItem { i: b, x: 3, y: 0, w: 6, h: 4 });
    }

    #[test]
    fn test_set_filter_rejects_index() {
        let mut panel = Panel::new("Flights").unwrap();
        assert_eq!(
            panel.set_filter("source=other"),
            Err(PanelError::Filter(FilterRejection::ContainsIndex))
        );
        panel.set_filter("where Carrier='OpenSearch-Air'").unwrap();
        assert_eq!(panel.query_filter.query, "where Carrier='OpenSearch-Air'");
    }

    #[test]
    fn test_saved_visualization_drops_embedded_range() {
        let saved = SavedVisualization::new(
            "Delays",
            "source=flights | where timestamp >= timestamp('2021-07-01 00:00:00') and timestamp <= timestamp('2021-07-02 00:00:00') | stats avg(FlightDelayMin) by Carrier",
            VisualizationType::Bar,
            "timestamp",
        )
        .unwrap();
        assert_eq!(saved.query, "source=flights | stats avg(FlightDelayMin) by Carrier");
    }

    #[test]
    fn test_saved_visualization_wire_format() {
        let json = r#"{"id":"1","title":"Demo Viz 1","query":"source=f | stats count()","type":"horizontalBar"}"#;
        let saved: SavedVisualization = serde_json::from_str(json).unwrap();
        assert_eq!(saved.name, "Demo Viz 1");
        assert_eq!(saved.kind, VisualizationType::HorizontalBar);
        assert_eq!(saved.time_field, "timestamp");
    }
}
