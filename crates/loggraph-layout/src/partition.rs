use crate::error::LayoutError;
use crate::positions::VertexPosition;
use loggraph_core::{EdgeId, LogGraph, Relation, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartitionName(pub usize);

impl fmt::Display for PartitionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "partition_{}", self.0)
    }
}

/// Vertical range a viewer scrolled into should load `partition` for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveArea {
    pub partition: PartitionName,
    pub start: f64,
    pub end: f64,
}

/// Membership table: one row per vertex, one column per partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VertexPartitions {
    ids: Vec<VertexId>,
    rows: Vec<Vec<bool>>,
    partition_count: usize,
    #[serde(skip)]
    index: HashMap<VertexId, usize>,
}

impl VertexPartitions {
    fn with_ids(ids: Vec<VertexId>) -> Result<Self, LayoutError> {
        let mut index = HashMap::with_capacity(ids.len());
        for (row, id) in ids.iter().enumerate() {
            if index.insert(*id, row).is_some() {
                return Err(LayoutError::DuplicateVertex(*id));
            }
        }
        let rows = vec![Vec::new(); ids.len()];
        Ok(Self {
            ids,
            rows,
            partition_count: 0,
            index,
        })
    }

    pub fn partition_count(&self) -> usize {
        self.partition_count
    }

    pub fn ids(&self) -> &[VertexId] {
        &self.ids
    }

    pub fn row(&self, id: VertexId) -> Option<&[bool]> {
        self.index.get(&id).map(|&row| self.rows[row].as_slice())
    }

    pub fn rows(&self) -> impl Iterator<Item = (VertexId, &[bool])> {
        self.ids
            .iter()
            .copied()
            .zip(self.rows.iter().map(Vec::as_slice))
    }

    /// Vertices flagged for `partition`, in row order.
    pub fn members(&self, partition: usize) -> Vec<VertexId> {
        self.rows()
            .filter(|(_, row)| row.get(partition).copied().unwrap_or(false))
            .map(|(id, _)| id)
            .collect()
    }
}

/// Slides a window of `window_height` down the figure in half-window steps.
///
/// A vertex belongs to a window when `start < y <= end`. When `connected` is
/// given, vertices adjacent to a window member are pulled in as well.
pub fn partition_vertices(
    positions: &[VertexPosition],
    window_height: f64,
    connected: Option<&LogGraph>,
) -> Result<(VertexPartitions, Vec<ActiveArea>), LayoutError> {
    if !(window_height.is_finite() && window_height > 0.0) {
        return Err(LayoutError::InvalidConfig(format!(
            "window_height must be positive, got {window_height}"
        )));
    }
    let mut table = VertexPartitions::with_ids(positions.iter().map(|p| p.id).collect())?;
    let max_y = positions
        .iter()
        .map(|p| p.y)
        .fold(f64::NEG_INFINITY, f64::max);

    let half = window_height / 2.0;
    let quarter = window_height / 4.0;
    let mut columns: Vec<Vec<bool>> = Vec::new();
    let mut active_areas = Vec::new();
    let mut center = 0.0_f64;

    loop {
        let partition = columns.len();
        let start = center - half;
        let end = center + half;
        if positions.is_empty() || start > max_y {
            break;
        }
        let active_start = if partition == 0 {
            start
        } else {
            center - quarter
        };
        active_areas.push(ActiveArea {
            partition: PartitionName(partition),
            start: active_start,
            end: center + quarter,
        });

        let mut column: Vec<bool> = positions
            .iter()
            .map(|p| p.y > start && p.y <= end)
            .collect();
        if let Some(graph) = connected {
            pull_in_neighbors(&table.index, &mut column, graph)?;
        }
        columns.push(column);
        center += half;
    }

    table.partition_count = columns.len();
    for (row, cells) in table.rows.iter_mut().enumerate() {
        *cells = columns.iter().map(|column| column[row]).collect();
    }
    tracing::debug!(
        "Partitioned {} vertices into {} windows",
        positions.len(),
        table.partition_count
    );
    Ok((table, active_areas))
}

fn pull_in_neighbors(
    rows: &HashMap<VertexId, usize>,
    column: &mut [bool],
    graph: &LogGraph,
) -> Result<(), LayoutError> {
    let window_members: Vec<VertexId> = rows
        .iter()
        .filter(|&(_, &row)| column[row])
        .map(|(id, _)| *id)
        .collect();
    for id in window_members {
        for neighbor in graph.neighbors(id)? {
            if let Some(&row) = rows.get(&neighbor) {
                column[row] = true;
            }
        }
    }
    Ok(())
}

/// Edge membership: each row is the OR of its endpoints' rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgePartitions {
    ids: Vec<EdgeId>,
    rows: Vec<Vec<bool>>,
}

impl EdgePartitions {
    pub fn ids(&self) -> &[EdgeId] {
        &self.ids
    }

    pub fn rows(&self) -> impl Iterator<Item = (&EdgeId, &[bool])> {
        self.ids.iter().zip(self.rows.iter().map(Vec::as_slice))
    }
}

pub fn partition_edges<'a>(
    edges: impl IntoIterator<Item = &'a Relation>,
    vertices: &VertexPartitions,
) -> Result<EdgePartitions, LayoutError> {
    let mut seen = HashSet::new();
    let mut table = EdgePartitions::default();
    for edge in edges {
        if !seen.insert(edge.id) {
            return Err(LayoutError::DuplicateEdge(edge.id));
        }
        let (a, b) = edge.id.endpoints();
        let missing = |id: VertexId| LayoutError::MissingTrace(id.to_string());
        let row_a = vertices.row(a).ok_or_else(|| missing(a))?;
        let row_b = vertices.row(b).ok_or_else(|| missing(b))?;
        table.ids.push(edge.id);
        table
            .rows
            .push(row_a.iter().zip(row_b).map(|(x, y)| *x || *y).collect());
    }
    Ok(table)
}

/// Partition whose active area holds scroll position `y`.
pub fn active_partition(areas: &[ActiveArea], y: f64) -> Option<PartitionName> {
    let first = areas.first()?;
    if y < first.start {
        return Some(first.partition);
    }
    areas
        .iter()
        .find(|area| area.start <= y && y < area.end)
        .or_else(|| areas.last())
        .map(|area| area.partition)
}
