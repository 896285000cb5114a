use crate::columns::{ColumnLayout, resolve_column_order};
use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::partition::{
    ActiveArea, EdgePartitions, PartitionName, VertexPartitions, active_partition,
    partition_edges, partition_vertices,
};
use crate::positions::{VertexPosition, compute_positions};
use crate::render::{
    Point, Primitive, RenderBackend, Scene, SegmentRequest, ShapeRequest, StyleSheet, TraceInfo,
    excerpt,
};
use crate::traces::{RelatedTraces, TraceId, TraceKind, TraceTable};
use loggraph_core::{ChapterId, LogGraph, Vertex, VertexId};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

/// Everything one layout pass derives from a graph. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutSnapshot {
    pub column_order: Vec<String>,
    pub columns: ColumnLayout,
    pub positions: Vec<VertexPosition>,
    pub vertex_partitions: VertexPartitions,
    pub active_areas: Vec<ActiveArea>,
    pub edge_partitions: EdgePartitions,
    pub traces: TraceTable,
    pub related: RelatedTraces,
    pub node_width: f64,
    pub chapter_width: f64,
    #[serde(skip)]
    position_index: HashMap<VertexId, usize>,
}

impl LayoutSnapshot {
    pub fn position(&self, id: VertexId) -> Option<&VertexPosition> {
        self.position_index.get(&id).map(|&idx| &self.positions[idx])
    }

    /// Figure height over its unit width.
    pub fn aspect_ratio(&self) -> f64 {
        self.max_y()
    }

    pub fn max_y(&self) -> f64 {
        self.positions.iter().map(|p| p.y).fold(0.0, f64::max)
    }

    pub fn active_partition(&self, y: f64) -> Option<PartitionName> {
        active_partition(&self.active_areas, y)
    }

    pub fn trace_kind(&self, trace_index: usize) -> Option<TraceKind> {
        self.traces.get(trace_index).map(|row| row.kind)
    }
}

/// Scroll target of a chapter marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterLocation {
    pub id: ChapterId,
    pub title: String,
    pub y: f64,
    pub scroll_absolute: f64,
    /// `y` over the largest chapter `y`.
    pub scroll_relative: f64,
}

impl ChapterLocation {
    /// Last chapter at or above relative scroll position `scroll`; the first
    /// chapter when scrolled above every marker.
    pub fn current(locations: &[ChapterLocation], scroll: f64) -> Option<&ChapterLocation> {
        locations
            .iter()
            .rev()
            .find(|location| location.scroll_relative <= scroll)
            .or_else(|| locations.first())
    }
}

/// Serializable form of a snapshot, for viewers and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutExport<'a> {
    pub aspect_ratio: f64,
    pub chapters: Vec<ChapterLocation>,
    #[serde(flatten)]
    pub snapshot: &'a LayoutSnapshot,
}

/// Owns a graph and publishes the layout derived from it.
///
/// Every pass builds a fresh [`LayoutSnapshot`]; the published `Arc` is only
/// replaced when the pass succeeds.
#[derive(Debug)]
pub struct LayoutEngine {
    graph: LogGraph,
    config: LayoutConfig,
    current: Arc<LayoutSnapshot>,
}

impl LayoutEngine {
    /// Adds the reserved boundary chapters and runs a strict first pass.
    pub fn new(graph: LogGraph, config: LayoutConfig) -> Result<Self, LayoutError> {
        config.validate()?;
        let graph = Self::prepare(graph, &config)?;
        let snapshot = layout_pass(&graph, &config, None, true)?;
        Ok(Self {
            graph,
            config,
            current: Arc::new(snapshot),
        })
    }

    fn prepare(mut graph: LogGraph, config: &LayoutConfig) -> Result<LogGraph, LayoutError> {
        graph.ensure_boundary_chapters(
            &config.start_title,
            &config.end_title,
            config.reject_existing_boundaries,
        )?;
        graph.validate()?;
        Ok(graph)
    }

    /// Swaps in a new graph, laid out with its own default column order.
    pub fn load_graph(&mut self, graph: LogGraph) -> Result<Arc<LayoutSnapshot>, LayoutError> {
        let graph = Self::prepare(graph, &self.config)?;
        let snapshot = layout_pass(&graph, &self.config, None, true)?;
        self.graph = graph;
        Ok(self.publish(snapshot))
    }

    /// Re-lays out with `order`, dropping names the graph does not use.
    pub fn update_column_order(
        &mut self,
        order: &[String],
    ) -> Result<Arc<LayoutSnapshot>, LayoutError> {
        let snapshot = layout_pass(&self.graph, &self.config, Some(order), false)?;
        Ok(self.publish(snapshot))
    }

    /// Like [`Self::update_column_order`] but unknown names are an error.
    pub fn update_column_order_strict(
        &mut self,
        order: &[String],
    ) -> Result<Arc<LayoutSnapshot>, LayoutError> {
        let snapshot = layout_pass(&self.graph, &self.config, Some(order), true)?;
        Ok(self.publish(snapshot))
    }

    fn publish(&mut self, snapshot: LayoutSnapshot) -> Arc<LayoutSnapshot> {
        self.current = Arc::new(snapshot);
        Arc::clone(&self.current)
    }

    pub fn snapshot(&self) -> Arc<LayoutSnapshot> {
        Arc::clone(&self.current)
    }

    pub fn graph(&self) -> &LogGraph {
        &self.graph
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.current.aspect_ratio()
    }

    pub fn active_partition(&self, y: f64) -> Option<PartitionName> {
        self.current.active_partition(y)
    }

    pub fn chapters(&self) -> Result<Vec<ChapterLocation>, LayoutError> {
        let snapshot = &self.current;
        let chapter_positions: Vec<&VertexPosition> = snapshot
            .positions
            .iter()
            .filter(|p| p.id.is_chapter())
            .collect();
        let max_y = chapter_positions.iter().map(|p| p.y).fold(0.0, f64::max);

        let mut locations = Vec::with_capacity(chapter_positions.len());
        for position in chapter_positions {
            let Some(id) = position.id.as_chapter() else {
                continue;
            };
            let (data, _) = self.graph.chapter_data(id)?;
            locations.push(ChapterLocation {
                id,
                title: data.title.clone(),
                y: position.y,
                scroll_absolute: position.y,
                scroll_relative: if max_y > 0.0 { position.y / max_y } else { 0.0 },
            });
        }
        Ok(locations)
    }

    /// Drawing request for one trace.
    pub fn primitive(&self, trace_index: usize) -> Result<Primitive, LayoutError> {
        let snapshot = &self.current;
        let row = snapshot
            .traces
            .get(trace_index)
            .ok_or_else(|| LayoutError::MissingTrace(format!("trace index {trace_index}")))?;
        let sizing = &self.config.sizing;
        let center_of = |id: VertexId| {
            snapshot
                .position(id)
                .map(|p| Point::new(p.x, p.y))
                .ok_or_else(|| LayoutError::MissingTrace(id.to_string()))
        };

        match row.id {
            TraceId::Edge(edge_id) => {
                let relation = self.graph.relation(&edge_id)?;
                Ok(Primitive::Edge(SegmentRequest {
                    edge: edge_id,
                    start: center_of(relation.source)?,
                    end: center_of(relation.target)?,
                    thickness: sizing.edge_width,
                    style: relation.metadata.style.clone(),
                }))
            }
            TraceId::Vertex(vertex_id) => {
                let center = center_of(vertex_id)?;
                match self.graph.vertex(vertex_id)? {
                    Vertex::Node(node) => Ok(Primitive::Node(ShapeRequest {
                        center,
                        width: snapshot.node_width,
                        height: sizing.node_height,
                        style: node.metadata.style.clone(),
                    })),
                    Vertex::Chapter(chapter) => Ok(Primitive::Chapter(ShapeRequest {
                        center,
                        width: snapshot.chapter_width,
                        height: sizing.chapter_height,
                        style: chapter.metadata.style.clone(),
                    })),
                }
            }
        }
    }

    pub fn trace_info(&self, trace_index: usize) -> Result<TraceInfo, LayoutError> {
        let row = self
            .current
            .traces
            .get(trace_index)
            .ok_or_else(|| LayoutError::MissingTrace(format!("trace index {trace_index}")))?;
        let excerpt_len = self.config.excerpt_len;
        let (style, title, content) = match row.id {
            TraceId::Edge(edge_id) => {
                let relation = self.graph.relation(&edge_id)?;
                (&relation.metadata.style, None, &relation.data.content)
            }
            TraceId::Vertex(vertex_id) => match self.graph.vertex(vertex_id)? {
                Vertex::Node(node) => (
                    &node.metadata.style,
                    Some(node.metadata.column.clone()),
                    &node.data.content,
                ),
                Vertex::Chapter(chapter) => (
                    &chapter.metadata.style,
                    Some(chapter.data.title.clone()),
                    &chapter.data.content,
                ),
            },
        };
        Ok(TraceInfo {
            trace_index,
            kind: row.kind,
            trace_style: style.clone(),
            title,
            excerpt: excerpt(content, excerpt_len),
        })
    }

    /// Builds one visual per trace, in trace order.
    ///
    /// Coincident edge endpoints fail with `DegenerateGeometry` unless
    /// `suppress_degenerate` is set, in which case they are drawn anyway.
    pub fn render<B: RenderBackend>(
        &self,
        backend: &mut B,
        styles: &StyleSheet,
        suppress_degenerate: bool,
    ) -> Result<Scene<B::Visual>, LayoutError> {
        let mut visuals = Vec::with_capacity(self.current.traces.len());
        for trace_index in 0..self.current.traces.len() {
            let primitive = self.primitive(trace_index)?;
            if let Primitive::Edge(segment) = &primitive
                && let Err(err) = segment.check()
            {
                if !suppress_degenerate {
                    return Err(err);
                }
                tracing::warn!("{}", err);
            }
            let info = self.trace_info(trace_index)?;
            let style = styles.resolve(info.kind, &info.trace_style);
            visuals.push(backend.build(&primitive, info, &style));
        }
        Ok(Scene::new(visuals))
    }

    pub fn export(&self) -> Result<LayoutExport<'_>, LayoutError> {
        Ok(LayoutExport {
            aspect_ratio: self.aspect_ratio(),
            chapters: self.chapters()?,
            snapshot: &self.current,
        })
    }

    /// Human readable dump of the current snapshot.
    pub fn report(&self) -> String {
        let snapshot = &self.current;
        let mut out = String::new();
        let _ = writeln!(out, "column order: {}", snapshot.column_order.join(", "));
        let _ = writeln!(out, "columns:");
        for slot in &snapshot.columns.slots {
            let _ = writeln!(
                out,
                "  {:<12} center={:.3} width={:.3}",
                slot.name, slot.center, slot.width
            );
        }
        let _ = writeln!(out, "positions:");
        for p in &snapshot.positions {
            let _ = writeln!(
                out,
                "  {:<12} {:<8} x={:.3} y={:.3}",
                p.id.to_string(),
                p.kind.as_str(),
                p.x,
                p.y
            );
        }
        let _ = writeln!(out, "partitions:");
        for area in &snapshot.active_areas {
            let members: Vec<String> = snapshot
                .vertex_partitions
                .members(area.partition.0)
                .iter()
                .map(ToString::to_string)
                .collect();
            let _ = writeln!(
                out,
                "  {} active=[{:.3}, {:.3}] {}",
                area.partition,
                area.start,
                area.end,
                members.join(" ")
            );
        }
        let _ = writeln!(out, "traces: {}", snapshot.traces.len());
        out
    }
}

/// One full pass over `graph`. Pure; callers decide whether to publish.
pub fn layout_pass(
    graph: &LogGraph,
    config: &LayoutConfig,
    requested_order: Option<&[String]>,
    strict: bool,
) -> Result<LayoutSnapshot, LayoutError> {
    config.validate()?;
    let sizing = &config.sizing;

    let column_order = resolve_column_order(&graph.columns(), requested_order, strict)?;
    let columns = ColumnLayout::new(&column_order, sizing.margin_rel_col);
    tracing::debug!("Column order: {:?}", column_order);

    let positions = compute_positions(graph, &columns, sizing)?;

    let connected = config.include_connected_edges.then_some(graph);
    let (vertex_partitions, active_areas) =
        partition_vertices(&positions, sizing.window_height, connected)?;
    let edge_partitions = partition_edges(graph.edges(), &vertex_partitions)?;

    let traces = TraceTable::build(graph, &positions);
    let related = RelatedTraces::build(graph, &traces)?;
    tracing::debug!(
        "Linearized {} traces ({} edges)",
        traces.len(),
        graph.edge_count()
    );

    let position_index = positions
        .iter()
        .enumerate()
        .map(|(idx, p)| (p.id, idx))
        .collect();

    Ok(LayoutSnapshot {
        node_width: sizing.node_width_rel_col * columns.max_column_width,
        chapter_width: sizing.chapter_width_rel_fig,
        column_order,
        columns,
        positions,
        vertex_partitions,
        active_areas,
        edge_partitions,
        traces,
        related,
        position_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use loggraph_core::{LogEntry, LogRecorder};
    use serde_json::json;

    fn engine() -> LayoutEngine {
        let mut recorder = LogRecorder::new();
        recorder.new_chapter("A", "default", json!("intro")).unwrap();
        let first = recorder.log(LogEntry::new("X", "x".repeat(80))).unwrap();
        recorder
            .log(LogEntry {
                relates_to: Some(first),
                ..LogEntry::new("Y", "y")
            })
            .unwrap();
        LayoutEngine::new(recorder.snapshot(), LayoutConfig::default()).unwrap()
    }

    #[test]
    fn test_chapter_locations() {
        let engine = engine();
        let chapters = engine.chapters().unwrap();
        let titles: Vec<&str> = chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["START", "A", "END"]);
        assert_eq!(chapters.last().unwrap().scroll_relative, 1.0);

        assert_eq!(
            ChapterLocation::current(&chapters, 1.0).unwrap().title,
            "END"
        );
        assert_eq!(
            ChapterLocation::current(&chapters, -1.0).unwrap().title,
            "START"
        );
    }

    #[test]
    fn test_trace_info_and_primitives() {
        let engine = engine();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.trace_kind(0), Some(TraceKind::Edge));

        let node_trace = snapshot
            .traces
            .index_of(TraceId::Vertex(
                loggraph_core::NodeId::new(1).unwrap().into(),
            ))
            .unwrap();
        let info = engine.trace_info(node_trace).unwrap();
        assert_eq!(info.title.as_deref(), Some("X"));
        assert_eq!(info.excerpt.chars().count(), 54);

        match engine.primitive(node_trace).unwrap() {
            Primitive::Node(shape) => {
                assert!((shape.width - 0.7 * 0.5).abs() < 1e-12);
                assert_eq!(shape.height, 0.05);
            }
            other => panic!("expected node primitive, got {other:?}"),
        }
        assert!(engine.primitive(999).is_err());
    }

    #[test]
    fn test_load_graph_uses_new_default_columns() {
        let mut engine = engine();
        let mut recorder = LogRecorder::new();
        recorder.new_chapter("B", "default", json!(null)).unwrap();
        recorder.log(LogEntry::new("B", "b")).unwrap();
        recorder.log(LogEntry::new("A", "a")).unwrap();

        let snapshot = engine.load_graph(recorder.snapshot()).unwrap();
        assert_eq!(snapshot.column_order, vec!["A", "B"]);
        let xs: Vec<f64> = snapshot
            .positions
            .iter()
            .filter(|p| p.kind == loggraph_core::VertexKind::Node)
            .map(|p| p.x)
            .collect();
        assert_eq!(xs, vec![0.75, 0.25]);
        assert!(Arc::ptr_eq(&snapshot, &engine.snapshot()));
    }

    #[test]
    fn test_layout_pass_rejects_non_positive_window() {
        let engine = engine();
        for window_height in [0.0, -1.0] {
            let mut config = LayoutConfig::default();
            config.sizing.window_height = window_height;
            let err = layout_pass(engine.graph(), &config, None, true).unwrap_err();
            assert!(matches!(err, LayoutError::InvalidConfig(_)));
        }
    }

    #[test]
    fn test_report_mentions_partitions() {
        let report = engine().report();
        assert!(report.contains("partition_0"));
        assert!(report.contains("CHAP_999999"));
    }
}
