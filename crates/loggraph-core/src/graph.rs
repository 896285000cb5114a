use crate::error::GraphError;
use crate::ids::{ChapterId, EdgeId, NodeId, VertexId};
use crate::record::{
    ChapterData, ChapterMarker, ChapterMetadata, EventNode, NodeData, NodeMetadata, Relation,
    RelationData, RelationMetadata, Vertex,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Style of the synthesized start chapter.
pub const START_STYLE: &str = "__start__";
/// Style of the synthesized end chapter.
pub const END_STYLE: &str = "__end__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexIndex(pub usize);

impl fmt::Display for VertexIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeIndex(pub usize);

impl fmt::Display for EdgeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attributed log graph: event nodes and chapter markers connected by
/// relations. Vertices and edges live in insertion-ordered arenas; ids map to
/// arena slots.
///
/// The graph is append-only. Cloning it is how producers hand a snapshot to
/// the layout engine.
#[derive(Debug, Clone, Default)]
pub struct LogGraph {
    directed: bool,
    vertices: Vec<Vertex>,
    edges: Vec<Relation>,
    vertex_map: HashMap<VertexId, VertexIndex>,
    edge_map: HashMap<(VertexId, VertexId), EdgeIndex>,
    incidence: Vec<Vec<EdgeIndex>>,
}

impl LogGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_directed() -> Self {
        Self {
            directed: true,
            ..Self::default()
        }
    }

    /// Rebuilds a graph from its parts, validating every insertion.
    pub fn from_parts(
        directed: bool,
        vertices: impl IntoIterator<Item = Vertex>,
        edges: impl IntoIterator<Item = Relation>,
    ) -> Result<Self, GraphError> {
        let mut graph = if directed {
            Self::new_directed()
        } else {
            Self::new()
        };
        for vertex in vertices {
            graph.add_vertex(vertex)?;
        }
        for edge in edges {
            graph.add_edge(edge.source, edge.target, edge.data, edge.metadata)?;
        }
        Ok(graph)
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> Result<VertexIndex, GraphError> {
        let id = vertex.id();
        if self.vertex_map.contains_key(&id) {
            return Err(GraphError::DuplicateVertex(id));
        }
        let idx = VertexIndex(self.vertices.len());
        self.vertices.push(vertex);
        self.incidence.push(Vec::new());
        self.vertex_map.insert(id, idx);
        Ok(idx)
    }

    pub fn add_node(&mut self, node: EventNode) -> Result<VertexIndex, GraphError> {
        self.add_vertex(Vertex::Node(node))
    }

    pub fn add_chapter(&mut self, chapter: ChapterMarker) -> Result<VertexIndex, GraphError> {
        self.add_vertex(Vertex::Chapter(chapter))
    }

    /// Connects two existing, distinct vertices.
    pub fn add_edge(
        &mut self,
        source: VertexId,
        target: VertexId,
        data: RelationData,
        metadata: RelationMetadata,
    ) -> Result<EdgeId, GraphError> {
        let id = EdgeId::new(source, target, self.directed)?;
        let src = self.index_of(source)?;
        let dst = self.index_of(target)?;
        let key = id.endpoints();
        if self.edge_map.contains_key(&key) {
            return Err(GraphError::DuplicateEdge(id));
        }

        let idx = EdgeIndex(self.edges.len());
        self.edges.push(Relation {
            id,
            source,
            target,
            data,
            metadata,
        });
        self.edge_map.insert(key, idx);
        self.incidence[src.0].push(idx);
        self.incidence[dst.0].push(idx);
        Ok(id)
    }

    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertex_map.contains_key(&id)
    }

    pub fn index_of(&self, id: VertexId) -> Result<VertexIndex, GraphError> {
        self.vertex_map
            .get(&id)
            .copied()
            .ok_or_else(|| GraphError::not_found(id))
    }

    /// Vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Relation> {
        self.edges.iter()
    }

    /// Distinct column names used by event nodes, sorted.
    pub fn columns(&self) -> Vec<String> {
        let columns: BTreeSet<&str> = self
            .vertices
            .iter()
            .filter_map(|vertex| match vertex {
                Vertex::Node(node) => Some(node.metadata.column.as_str()),
                Vertex::Chapter(_) => None,
            })
            .collect();
        columns.into_iter().map(str::to_string).collect()
    }

    /// Every chapter id known to the graph, ascending.
    pub fn chapter_ids(&self) -> Vec<ChapterId> {
        self.chapters_with_nodes().into_keys().collect()
    }

    /// Groups event nodes under their owning chapter. Chapters without nodes
    /// map to an empty list; nodes keep their creation order.
    pub fn chapters_with_nodes(&self) -> BTreeMap<ChapterId, Vec<NodeId>> {
        let mut chapters: BTreeMap<ChapterId, Vec<NodeId>> = BTreeMap::new();
        for vertex in &self.vertices {
            match vertex {
                Vertex::Node(node) => chapters
                    .entry(node.metadata.chapter_id)
                    .or_default()
                    .push(node.id),
                Vertex::Chapter(chapter) => {
                    chapters.entry(chapter.id).or_default();
                }
            }
        }
        chapters
    }

    pub fn vertex(&self, id: VertexId) -> Result<&Vertex, GraphError> {
        let idx = self.index_of(id)?;
        Ok(&self.vertices[idx.0])
    }

    pub fn event_node(&self, id: NodeId) -> Result<&EventNode, GraphError> {
        match self.vertex(id.into())? {
            Vertex::Node(node) => Ok(node),
            Vertex::Chapter(_) => Err(GraphError::not_found(id)),
        }
    }

    pub fn chapter_marker(&self, id: ChapterId) -> Result<&ChapterMarker, GraphError> {
        match self.vertex(id.into())? {
            Vertex::Chapter(chapter) => Ok(chapter),
            Vertex::Node(_) => Err(GraphError::not_found(id)),
        }
    }

    pub fn node_data(&self, id: NodeId) -> Result<(&NodeData, &NodeMetadata), GraphError> {
        self.event_node(id).map(|node| (&node.data, &node.metadata))
    }

    pub fn chapter_data(
        &self,
        id: ChapterId,
    ) -> Result<(&ChapterData, &ChapterMetadata), GraphError> {
        self.chapter_marker(id)
            .map(|chapter| (&chapter.data, &chapter.metadata))
    }

    pub fn node_column(&self, id: NodeId) -> Result<&str, GraphError> {
        self.event_node(id).map(|node| node.metadata.column.as_str())
    }

    /// Looks an edge up by its endpoints, in either order.
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<&Relation> {
        self.edge_map
            .get(&(a, b))
            .or_else(|| self.edge_map.get(&(b, a)))
            .map(|idx| &self.edges[idx.0])
    }

    pub fn relation(&self, id: &EdgeId) -> Result<&Relation, GraphError> {
        let (a, b) = id.endpoints();
        self.edge_between(a, b)
            .ok_or_else(|| GraphError::not_found(id))
    }

    pub fn edge_data(
        &self,
        id: &EdgeId,
    ) -> Result<(&RelationData, &RelationMetadata), GraphError> {
        self.relation(id).map(|edge| (&edge.data, &edge.metadata))
    }

    /// Parses an edge id string and fetches the edge.
    pub fn edge_data_by_str(
        &self,
        id: &str,
    ) -> Result<(&RelationData, &RelationMetadata), GraphError> {
        let (a, b) = crate::ids::edge_id_to_endpoints(id)?;
        self.edge_between(a, b)
            .map(|edge| (&edge.data, &edge.metadata))
            .ok_or_else(|| GraphError::not_found(id))
    }

    /// Edges touching `id`, in both directions, in insertion order.
    pub fn incident_edges(
        &self,
        id: VertexId,
    ) -> Result<impl Iterator<Item = &Relation> + '_, GraphError> {
        let idx = self.index_of(id)?;
        Ok(self.incidence[idx.0]
            .iter()
            .map(move |edge_idx| &self.edges[edge_idx.0]))
    }

    /// Vertices directly connected to `id`.
    pub fn neighbors(
        &self,
        id: VertexId,
    ) -> Result<impl Iterator<Item = VertexId> + '_, GraphError> {
        Ok(self
            .incident_edges(id)?
            .filter_map(move |edge| edge.id.other(id)))
    }

    /// Adds the reserved start and end chapters. When a reserved chapter is
    /// already present this fails, unless `reject_existing` is false.
    pub fn ensure_boundary_chapters(
        &mut self,
        start_title: &str,
        end_title: &str,
        reject_existing: bool,
    ) -> Result<(), GraphError> {
        let boundaries = [
            (ChapterId::start(), start_title, START_STYLE),
            (ChapterId::last(), end_title, END_STYLE),
        ];
        for (id, title, style) in boundaries {
            if self.contains_vertex(id.into()) {
                if reject_existing {
                    return Err(GraphError::ReservedChapterExists(id));
                }
                continue;
            }
            tracing::debug!("Inserting boundary chapter {} ({:?})", id, title);
            self.add_chapter(ChapterMarker {
                id,
                data: ChapterData {
                    title: title.to_string(),
                    content: serde_json::Value::Null,
                },
                metadata: ChapterMetadata {
                    time: None,
                    style: style.to_string(),
                },
            })?;
        }
        Ok(())
    }

    /// Checks that every node points at an existing chapter.
    pub fn validate(&self) -> Result<(), GraphError> {
        for vertex in &self.vertices {
            if let Vertex::Node(node) = vertex {
                let chapter = node.metadata.chapter_id;
                if !matches!(self.vertex(chapter.into()), Ok(Vertex::Chapter(_))) {
                    return Err(GraphError::NotFound(format!(
                        "{chapter} (chapter of {})",
                        node.id
                    )));
                }
            }
        }
        Ok(())
    }
}
