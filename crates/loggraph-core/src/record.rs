use crate::ids::{ChapterId, EdgeId, NodeId, VertexId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form user payload attached to vertices and edges.
pub type Content = serde_json::Value;

/// Style used when a producer does not name one.
pub const DEFAULT_STYLE: &str = "default";

/// Strips the leading and trailing underscores that mark reserved names.
pub fn normalize_name(name: &str) -> String {
    name.trim_matches('_').to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexKind {
    Node,
    Chapter,
}

impl VertexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VertexKind::Node => "node",
            VertexKind::Chapter => "chapter",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default)]
    pub content: Content,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    pub column: String,
    pub style: String,
    #[serde(default)]
    pub stack: bool,
    pub chapter_id: ChapterId,
}

/// A logged event, placed in a column under its owning chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventNode {
    pub id: NodeId,
    pub data: NodeData,
    pub metadata: NodeMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChapterData {
    pub title: String,
    #[serde(default)]
    pub content: Content,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterMetadata {
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    pub style: String,
}

/// A chapter boundary on the vertical axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterMarker {
    pub id: ChapterId,
    pub data: ChapterData,
    pub metadata: ChapterMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Vertex {
    Node(EventNode),
    Chapter(ChapterMarker),
}

impl Vertex {
    pub fn id(&self) -> VertexId {
        match self {
            Vertex::Node(node) => VertexId::Node(node.id),
            Vertex::Chapter(chapter) => VertexId::Chapter(chapter.id),
        }
    }

    pub fn kind(&self) -> VertexKind {
        match self {
            Vertex::Node(_) => VertexKind::Node,
            Vertex::Chapter(_) => VertexKind::Chapter,
        }
    }

    pub fn style(&self) -> &str {
        match self {
            Vertex::Node(node) => &node.metadata.style,
            Vertex::Chapter(chapter) => &chapter.metadata.style,
        }
    }

    pub fn content(&self) -> &Content {
        match self {
            Vertex::Node(node) => &node.data.content,
            Vertex::Chapter(chapter) => &chapter.data.content,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationData {
    #[serde(default)]
    pub content: Content,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationMetadata {
    pub style: String,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

impl Default for RelationMetadata {
    fn default() -> Self {
        Self {
            style: DEFAULT_STYLE.to_string(),
            time: None,
        }
    }
}

/// An edge between two vertices. `source`/`target` keep the order the
/// producer used; the id is canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: EdgeId,
    pub source: VertexId,
    pub target: VertexId,
    pub data: RelationData,
    pub metadata: RelationMetadata,
}

/// Renders content as display text: strings verbatim, null as empty,
/// everything else as compact JSON.
pub fn content_text(content: &Content) -> String {
    match content {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
