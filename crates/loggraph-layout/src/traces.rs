use crate::error::LayoutError;
use crate::positions::VertexPosition;
use loggraph_core::{EdgeId, LogGraph, VertexId, VertexKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Edge,
    Node,
    Chapter,
}

impl From<VertexKind> for TraceKind {
    fn from(kind: VertexKind) -> Self {
        match kind {
            VertexKind::Node => TraceKind::Node,
            VertexKind::Chapter => TraceKind::Chapter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceId {
    Edge(EdgeId),
    Vertex(VertexId),
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceId::Edge(id) => write!(f, "{id}"),
            TraceId::Vertex(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceRow {
    pub index: usize,
    pub id: TraceId,
    pub kind: TraceKind,
}

/// Every drawable item in a stable order: edges first, then vertices.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TraceTable {
    rows: Vec<TraceRow>,
    #[serde(skip)]
    index: HashMap<TraceId, usize>,
}

impl TraceTable {
    pub fn build(graph: &LogGraph, positions: &[VertexPosition]) -> Self {
        let mut table = Self {
            rows: Vec::with_capacity(graph.edge_count() + positions.len()),
            index: HashMap::with_capacity(graph.edge_count() + positions.len()),
        };
        let edges = graph.edges().map(|e| (TraceId::Edge(e.id), TraceKind::Edge));
        let vertices = positions
            .iter()
            .map(|p| (TraceId::Vertex(p.id), TraceKind::from(p.kind)));
        for (id, kind) in edges.chain(vertices) {
            let index = table.rows.len();
            table.index.insert(id, index);
            table.rows.push(TraceRow { index, id, kind });
        }
        table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[TraceRow] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&TraceRow> {
        self.rows.get(index)
    }

    pub fn index_of(&self, id: TraceId) -> Result<usize, LayoutError> {
        self.index
            .get(&id)
            .copied()
            .ok_or_else(|| LayoutError::MissingTrace(id.to_string()))
    }
}

/// Trace index to the indices highlighted alongside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedTraces(Vec<Vec<usize>>);

impl RelatedTraces {
    /// Nodes relate to their incident edges and the vertices across them;
    /// edges relate to both endpoints; chapters relate to nothing.
    pub fn build(graph: &LogGraph, traces: &TraceTable) -> Result<Self, LayoutError> {
        let mut related = Vec::with_capacity(traces.len());
        for row in traces.rows() {
            let entries = match (row.id, row.kind) {
                (TraceId::Edge(edge), _) => {
                    let (a, b) = edge.endpoints();
                    vec![
                        traces.index_of(TraceId::Vertex(a))?,
                        traces.index_of(TraceId::Vertex(b))?,
                    ]
                }
                (TraceId::Vertex(_), TraceKind::Chapter) => Vec::new(),
                (TraceId::Vertex(vertex), _) => {
                    let mut entries = Vec::new();
                    for edge in graph.incident_edges(vertex)? {
                        entries.push(traces.index_of(TraceId::Edge(edge.id))?);
                        if let Some(other) = edge.id.other(vertex) {
                            entries.push(traces.index_of(TraceId::Vertex(other))?);
                        }
                    }
                    entries
                }
            };
            related.push(entries);
        }
        Ok(Self(related))
    }

    pub fn of(&self, trace_index: usize) -> &[usize] {
        self.0.get(trace_index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
