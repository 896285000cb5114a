pub mod error;
pub mod graph;
pub mod ids;
pub mod record;
pub mod recorder;

pub use error::{GraphError, IdError};
pub use graph::{EdgeIndex, END_STYLE, LogGraph, START_STYLE, VertexIndex};
pub use ids::{
    ChapterId, EdgeId, NodeId, VertexId, edge_id_to_endpoints, is_valid_chapter_id,
    is_valid_node_id,
};
pub use record::{
    ChapterData, ChapterMarker, ChapterMetadata, Content, DEFAULT_STYLE, EventNode, NodeData,
    NodeMetadata, Relation, RelationData, RelationMetadata, Vertex, VertexKind, content_text,
    normalize_name,
};
pub use recorder::{DEFAULT_COLUMN, LogEntry, LogRecorder};
