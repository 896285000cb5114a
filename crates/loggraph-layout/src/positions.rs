use crate::columns::ColumnLayout;
use crate::config::Sizing;
use crate::error::LayoutError;
use loggraph_core::{LogGraph, VertexId, VertexKind};
use serde::{Deserialize, Serialize};

/// Center of one vertex in figure coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexPosition {
    pub id: VertexId,
    pub kind: VertexKind,
    pub x: f64,
    pub y: f64,
    /// Resolved layout column; `None` for chapters.
    pub column: Option<String>,
}

#[derive(Debug, Default)]
struct Cursor {
    x: f64,
    y: f64,
    stack: bool,
    hop_right: bool,
    column: Option<String>,
}

/// Places every vertex: chapters in ascending order, each followed by its
/// nodes in creation order. `y` grows strictly along the walk.
pub fn compute_positions(
    graph: &LogGraph,
    columns: &ColumnLayout,
    sizing: &Sizing,
) -> Result<Vec<VertexPosition>, LayoutError> {
    let mut positions = Vec::with_capacity(graph.vertex_count());
    let mut cursor = Cursor::default();
    let hop = columns.max_column_width * sizing.margin_rel_col;

    for (chapter_id, node_ids) in graph.chapters_with_nodes() {
        cursor.x = 0.5;
        cursor.y += sizing.chapter_step;
        cursor.stack = false;
        cursor.hop_right = false;
        positions.push(VertexPosition {
            id: chapter_id.into(),
            kind: VertexKind::Chapter,
            x: cursor.x,
            y: cursor.y,
            column: None,
        });

        for node_id in node_ids {
            let (_, metadata) = graph.node_data(node_id)?;
            let slot = columns.slot_for(&metadata.column)?;

            let stacked = metadata.stack
                && cursor.stack
                && cursor.column.as_deref() == Some(slot.name.as_str());
            // hop > 0 keeps y strictly increasing; a zero margin falls back to a node step
            if stacked && hop > 0.0 {
                cursor.x = if cursor.hop_right {
                    slot.center + hop
                } else {
                    slot.center - hop
                };
                cursor.hop_right = !cursor.hop_right;
                cursor.y += hop;
            } else {
                cursor.x = slot.center;
                cursor.y += sizing.node_step;
            }
            cursor.stack = metadata.stack;
            cursor.column = Some(slot.name.clone());

            positions.push(VertexPosition {
                id: node_id.into(),
                kind: VertexKind::Node,
                x: cursor.x,
                y: cursor.y,
                column: Some(slot.name.clone()),
            });
        }
    }

    tracing::debug!("Placed {} vertices", positions.len());
    Ok(positions)
}
