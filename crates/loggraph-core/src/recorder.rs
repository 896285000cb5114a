use crate::error::GraphError;
use crate::graph::LogGraph;
use crate::ids::{ChapterId, NodeId};
use crate::record::{
    ChapterData, ChapterMarker, ChapterMetadata, Content, DEFAULT_STYLE, EventNode, NodeData,
    NodeMetadata, RelationData, RelationMetadata, normalize_name,
};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

/// Column used when an entry does not name one.
pub const DEFAULT_COLUMN: &str = "other";

/// One `log` call: a node and, optionally, a relation to an earlier node.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub column: String,
    pub style: String,
    pub stack: bool,
    pub content: Content,
    pub relates_to: Option<NodeId>,
    pub relation_content: Content,
    pub relation_style: String,
}

impl Default for LogEntry {
    fn default() -> Self {
        Self {
            column: DEFAULT_COLUMN.to_string(),
            style: DEFAULT_STYLE.to_string(),
            stack: false,
            content: Content::Null,
            relates_to: None,
            relation_content: Content::Null,
            relation_style: DEFAULT_STYLE.to_string(),
        }
    }
}

impl LogEntry {
    pub fn new(column: impl Into<String>, content: impl Into<Content>) -> Self {
        Self {
            column: column.into(),
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Append-only producer of a [`LogGraph`].
///
/// Counters are bumped before use: the first node is `NODE_000001`, the first
/// chapter `CHAP_000001`. Nodes logged before any chapter belong to the
/// reserved start chapter `CHAP_000000`.
#[derive(Debug, Clone)]
pub struct LogRecorder {
    graph: LogGraph,
    node_counter: u32,
    chapter_counter: u32,
    current_chapter: ChapterId,
    created: DateTime<Utc>,
}

impl Default for LogRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl LogRecorder {
    pub fn new() -> Self {
        Self::with_graph(LogGraph::new())
    }

    /// Records into a directed graph; edge ids then use the `-->` separator.
    pub fn new_directed() -> Self {
        Self::with_graph(LogGraph::new_directed())
    }

    fn with_graph(graph: LogGraph) -> Self {
        Self {
            graph,
            node_counter: 0,
            chapter_counter: 0,
            current_chapter: ChapterId::start(),
            created: Utc::now(),
        }
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn current_chapter(&self) -> ChapterId {
        self.current_chapter
    }

    /// Creates one event node, plus one relation when `relates_to` is set.
    pub fn log(&mut self, entry: LogEntry) -> Result<NodeId, GraphError> {
        if let Some(target) = entry.relates_to
            && !self.graph.contains_vertex(target.into())
        {
            return Err(GraphError::not_found(target));
        }

        let node_id = NodeId::new(self.node_counter + 1)?;
        let now = Utc::now();
        self.graph.add_node(EventNode {
            id: node_id,
            data: NodeData {
                content: entry.content,
            },
            metadata: NodeMetadata {
                time: Some(now),
                column: normalize_name(&entry.column),
                style: normalize_name(&entry.style),
                stack: entry.stack,
                chapter_id: self.current_chapter,
            },
        })?;
        self.node_counter += 1;

        if let Some(target) = entry.relates_to {
            self.graph.add_edge(
                node_id.into(),
                target.into(),
                RelationData {
                    content: entry.relation_content,
                },
                RelationMetadata {
                    style: normalize_name(&entry.relation_style),
                    time: Some(now),
                },
            )?;
        }

        tracing::trace!("logged {} into {}", node_id, self.current_chapter);
        Ok(node_id)
    }

    /// Opens a new chapter; subsequent nodes belong to it.
    pub fn new_chapter(
        &mut self,
        title: impl Into<String>,
        style: &str,
        content: Content,
    ) -> Result<ChapterId, GraphError> {
        let chapter_id = ChapterId::new(self.chapter_counter + 1)?;
        self.graph.add_chapter(ChapterMarker {
            id: chapter_id,
            data: ChapterData {
                title: title.into(),
                content,
            },
            metadata: ChapterMetadata {
                time: Some(Utc::now()),
                style: normalize_name(style),
            },
        })?;
        self.chapter_counter += 1;
        self.current_chapter = chapter_id;
        Ok(chapter_id)
    }

    pub fn graph(&self) -> &LogGraph {
        &self.graph
    }

    /// Owned copy of the graph recorded so far.
    pub fn snapshot(&self) -> LogGraph {
        self.graph.clone()
    }

    /// Chapter by chapter listing of the recorded node ids.
    pub fn report(&self) -> String {
        let mut out = String::new();
        for (chapter_id, node_ids) in self.graph.chapters_with_nodes() {
            let _ = writeln!(out, "ChapterID = '{chapter_id}'");
            for node_id in node_ids {
                let _ = writeln!(out, "   NodeID = '{node_id}'");
            }
        }
        out
    }
}
