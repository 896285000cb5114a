use crate::StorageError;
use loggraph_core::{LogGraph, Relation, Vertex};
use serde::{Deserialize, Serialize};

pub const DOCUMENT_VERSION: u32 = 1;

/// Node-link document: vertices and edges in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub directed: bool,
    pub vertices: Vec<Vertex>,
    #[serde(default)]
    pub edges: Vec<Relation>,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

impl GraphDocument {
    pub fn from_graph(graph: &LogGraph) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            directed: graph.is_directed(),
            vertices: graph.vertices().cloned().collect(),
            edges: graph.edges().cloned().collect(),
        }
    }

    pub fn into_graph(self) -> Result<LogGraph, StorageError> {
        if self.version > DOCUMENT_VERSION {
            return Err(StorageError::Other(format!(
                "document version {} is newer than supported version {}",
                self.version, DOCUMENT_VERSION
            )));
        }
        Ok(LogGraph::from_parts(self.directed, self.vertices, self.edges)?)
    }
}

pub fn write_json(graph: &LogGraph) -> Result<String, StorageError> {
    Ok(serde_json::to_string_pretty(&GraphDocument::from_graph(
        graph,
    ))?)
}

pub fn read_json(text: &str) -> Result<LogGraph, StorageError> {
    serde_json::from_str::<GraphDocument>(text)?.into_graph()
}
