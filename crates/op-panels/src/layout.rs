//! Grid placement for panel visualizations.

use serde::{Deserialize, Serialize};

use crate::PanelVisualization;

/// Width of a newly added visualization, in grid columns.
pub const NEW_VISUALIZATION_WIDTH: i32 = 6;
/// Height of a newly added visualization, in grid rows.
pub const NEW_VISUALIZATION_HEIGHT: i32 = 4;

/// Position and size on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// One cell of the grid layout, keyed by visualization id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridItem {
    pub i: String,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl GridItem {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }
}

/// Where a new visualization goes: a full row below the lowest one.
///
/// The row is taken from the visualization with the greatest `y`; on ties the
/// first one wins.
pub fn new_visualization_dimensions(visualizations: &[PanelVisualization]) -> Dimensions {
    let lowest = visualizations
        .iter()
        .fold(None::<&PanelVisualization>, |lowest, v| match lowest {
            Some(l) if l.y >= v.y => Some(l),
            _ => Some(v),
        });
    Dimensions {
        x: 0,
        y: lowest.map_or(0, |v| v.y + v.h),
        w: NEW_VISUALIZATION_WIDTH,
        h: NEW_VISUALIZATION_HEIGHT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viz(y: i32, h: i32) -> PanelVisualization {
        PanelVisualization {
            id: format!("viz-{y}"),
            saved_visualization_id: "saved".into(),
            x: 0,
            y,
            w: 6,
            h,
        }
    }

    #[test]
    fn test_empty_panel_starts_at_origin() {
        assert_eq!(
            new_visualization_dimensions(&[]),
            Dimensions { x: 0, y: 0, w: 6, h: 4 }
        );
    }

    #[test]
    fn test_joins_below_lowest() {
        let dims = new_visualization_dimensions(&[viz(0, 4), viz(4, 3), viz(2, 10)]);
        assert_eq!(dims.y, 7);
    }

    #[test]
    fn test_single_visualization_at_top() {
        assert_eq!(new_visualization_dimensions(&[viz(0, 4)]).y, 4);
    }
}
