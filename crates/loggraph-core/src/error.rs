use crate::ids::{ChapterId, EdgeId, VertexId};
use thiserror::Error;

/// Identifier construction and parsing failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("Self-loop on {0} is not allowed")]
    SelfLoop(VertexId),
}

/// Failures of graph construction and graph lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Duplicate vertex: {0}")]
    DuplicateVertex(VertexId),
    #[error("Duplicate edge: {0}")]
    DuplicateEdge(EdgeId),
    #[error("Graph already includes reserved chapter {0}")]
    ReservedChapterExists(ChapterId),
}

impl GraphError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        GraphError::NotFound(what.to_string())
    }
}
