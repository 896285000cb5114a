use crate::error::LayoutError;
use serde::{Deserialize, Serialize};

/// Geometry knobs, in figure-relative units. The figure spans `[0, 1]`
/// horizontally; the vertical axis grows downward as the log advances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sizing {
    pub chapter_height: f64,
    /// Chapter marker width as a share of the figure.
    pub chapter_width_rel_fig: f64,
    pub chapter_step: f64,
    pub node_height: f64,
    /// Node width as a share of the column width.
    pub node_width_rel_col: f64,
    pub node_step: f64,
    pub edge_width: f64,
    /// Column margin as a share of the column width. Also the stacking hop.
    pub margin_rel_col: f64,
    /// Height of one partition window.
    pub window_height: f64,
}

pub const DEFAULT_SIZING: Sizing = Sizing {
    chapter_height: 0.05,
    chapter_width_rel_fig: 0.90,
    chapter_step: 0.25,
    node_height: 0.05,
    node_width_rel_col: 0.70,
    node_step: 0.07,
    edge_width: 0.005,
    margin_rel_col: 0.10,
    window_height: 1.0,
};

impl Default for Sizing {
    fn default() -> Self {
        DEFAULT_SIZING
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    #[serde(flatten)]
    pub sizing: Sizing,
    /// Pull edge-connected vertices into the partitions of their neighbours.
    pub include_connected_edges: bool,
    pub start_title: String,
    pub end_title: String,
    /// Fail when the graph already carries a reserved boundary chapter.
    pub reject_existing_boundaries: bool,
    /// Characters of content kept in a visual's excerpt.
    pub excerpt_len: usize,
}

impl LayoutConfig {
    pub const DEFAULT_START_TITLE: &'static str = "START";
    pub const DEFAULT_END_TITLE: &'static str = "END";
    pub const DEFAULT_EXCERPT_LEN: usize = 50;

    pub fn validate(&self) -> Result<(), LayoutError> {
        let s = &self.sizing;
        let positive = [
            ("chapter_step", s.chapter_step),
            ("node_step", s.node_step),
            ("window_height", s.window_height),
            ("chapter_height", s.chapter_height),
            ("node_height", s.node_height),
            ("edge_width", s.edge_width),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(LayoutError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        if !(0.0..1.0).contains(&s.margin_rel_col) {
            return Err(LayoutError::InvalidConfig(format!(
                "margin_rel_col must lie in [0, 1), got {}",
                s.margin_rel_col
            )));
        }

        let widths = [
            ("node_width_rel_col", s.node_width_rel_col),
            ("chapter_width_rel_fig", s.chapter_width_rel_fig),
        ];
        for (name, value) in widths {
            if !(value > 0.0 && value <= 1.0) {
                return Err(LayoutError::InvalidConfig(format!(
                    "{name} must lie in (0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            sizing: DEFAULT_SIZING,
            include_connected_edges: true,
            start_title: Self::DEFAULT_START_TITLE.to_string(),
            end_title: Self::DEFAULT_END_TITLE.to_string(),
            reject_existing_boundaries: true,
            excerpt_len: Self::DEFAULT_EXCERPT_LEN,
        }
    }
}
