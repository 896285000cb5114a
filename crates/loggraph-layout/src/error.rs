use loggraph_core::{EdgeId, GraphError, VertexId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("Column {column:?} is not present in the graph (available: {available:?})")]
    ColumnMismatch {
        column: String,
        available: Vec<String>,
    },
    #[error("Duplicate vertex row: {0}")]
    DuplicateVertex(VertexId),
    #[error("Duplicate edge row: {0}")]
    DuplicateEdge(EdgeId),
    #[error("No trace for {0}")]
    MissingTrace(String),
    #[error("Edge {edge} has coincident endpoints at ({x}, {y})")]
    DegenerateGeometry { edge: EdgeId, x: f64, y: f64 },
    #[error("Invalid layout config: {0}")]
    InvalidConfig(String),
}
