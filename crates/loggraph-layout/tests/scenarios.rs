use loggraph_core::{
    ChapterId, LogEntry, LogGraph, LogRecorder, NodeId, VertexId, VertexKind,
};
use loggraph_layout::{
    EXTRA_COLUMN, LayoutConfig, LayoutEngine, LayoutError, OutlineBackend, Primitive, StyleSheet,
    TraceId, TraceKind, VertexPosition, Visual, layout_pass, partition_vertices,
};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn stacked(column: &str, relates_to: Option<NodeId>) -> LogEntry {
    LogEntry {
        stack: true,
        relates_to,
        ..LogEntry::new(column, json!(null))
    }
}

fn two_column_graph() -> anyhow::Result<LogGraph> {
    let mut recorder = LogRecorder::new();
    recorder.new_chapter("A", "default", json!(null))?;
    let x = recorder.log(LogEntry::new("X", "x"))?;
    recorder.log(LogEntry {
        relates_to: Some(x),
        ..LogEntry::new("Y", "y")
    })?;
    recorder.log(LogEntry::new("Y", "y again"))?;
    Ok(recorder.snapshot())
}

fn node_position(positions: &[VertexPosition], counter: u32) -> anyhow::Result<&VertexPosition> {
    let id: VertexId = NodeId::new(counter)?.into();
    positions
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| anyhow::anyhow!("no position for {id}"))
}

#[test]
fn stacked_pair_alternates_around_column_center() -> anyhow::Result<()> {
    let mut recorder = LogRecorder::new();
    recorder.new_chapter("A", "default", json!(null))?;
    let first = recorder.log(stacked("X", None))?;
    recorder.log(stacked("X", Some(first)))?;

    let engine = LayoutEngine::new(recorder.snapshot(), LayoutConfig::default())?;
    let snapshot = engine.snapshot();
    let a = node_position(&snapshot.positions, 1)?;
    let b = node_position(&snapshot.positions, 2)?;

    let center = snapshot.columns.slot_for("X")?.center;
    let hop = snapshot.columns.max_column_width * engine.config().sizing.margin_rel_col;
    assert_eq!(a.x, center);
    assert!((b.x - (center - hop)).abs() < 1e-12);
    assert!(b.y > a.y);

    assert_eq!(snapshot.edge_partitions.ids().len(), 1);
    let edge_trace = snapshot
        .traces
        .rows()
        .iter()
        .position(|row| row.kind == TraceKind::Edge)
        .ok_or_else(|| anyhow::anyhow!("no edge trace"))?;
    match engine.primitive(edge_trace)? {
        Primitive::Edge(segment) => {
            let ends = [(segment.start.x, segment.start.y), (segment.end.x, segment.end.y)];
            assert!(ends.contains(&(a.x, a.y)));
            assert!(ends.contains(&(b.x, b.y)));
        }
        other => panic!("expected an edge primitive, got {other:?}"),
    }
    Ok(())
}

#[test]
fn lenient_order_folds_unlisted_columns_into_extra() -> anyhow::Result<()> {
    let mut engine = LayoutEngine::new(two_column_graph()?, LayoutConfig::default())?;
    let snapshot = engine.update_column_order(&["X".to_string(), "missing".to_string()])?;

    assert_eq!(snapshot.column_order, vec!["X", EXTRA_COLUMN]);
    for counter in [2, 3] {
        let position = node_position(&snapshot.positions, counter)?;
        assert_eq!(position.column.as_deref(), Some(EXTRA_COLUMN));
    }
    assert_eq!(
        node_position(&snapshot.positions, 1)?.column.as_deref(),
        Some("X")
    );
    Ok(())
}

#[test]
fn sliding_window_membership() -> anyhow::Result<()> {
    let ys = [0.0, 0.4, 0.9, 1.6, 2.5];
    let positions: Vec<VertexPosition> = ys
        .iter()
        .enumerate()
        .map(|(idx, &y)| {
            Ok(VertexPosition {
                id: NodeId::new(idx as u32 + 1)?.into(),
                kind: VertexKind::Node,
                x: 0.5,
                y,
                column: Some("X".to_string()),
            })
        })
        .collect::<anyhow::Result<_>>()?;

    let (table, areas) = partition_vertices(&positions, 1.0, None)?;
    assert_eq!(table.partition_count(), 7);

    let expected: [&[usize]; 7] = [&[0, 1], &[1, 2], &[2], &[3], &[3, 4], &[4], &[]];
    for (partition, members) in expected.iter().enumerate() {
        let got: Vec<VertexId> = table.members(partition);
        let want: Vec<VertexId> = members.iter().map(|&i| positions[i].id).collect();
        assert_eq!(got, want, "partition_{partition}");
    }

    let bounds: Vec<(f64, f64)> = areas.iter().map(|a| (a.start, a.end)).collect();
    assert_eq!(
        bounds,
        vec![
            (-0.5, 0.25),
            (0.25, 0.75),
            (0.75, 1.25),
            (1.25, 1.75),
            (1.75, 2.25),
            (2.25, 2.75),
            (2.75, 3.25),
        ]
    );
    assert_eq!(areas[6].partition.to_string(), "partition_6");
    Ok(())
}

#[test]
fn boundary_chapters_are_added_once() -> anyhow::Result<()> {
    let engine = LayoutEngine::new(two_column_graph()?, LayoutConfig::default())?;
    let chapters = engine.graph().chapter_ids();
    assert_eq!(chapters.first(), Some(&ChapterId::start()));
    assert_eq!(chapters.last(), Some(&ChapterId::last()));
    assert_eq!(
        chapters.iter().filter(|c| c.is_start() || c.is_last()).count(),
        2
    );
    assert_eq!(chapters.last().map(ToString::to_string).as_deref(), Some("CHAP_999999"));

    let prepared = engine.graph().clone();
    let err = LayoutEngine::new(prepared.clone(), LayoutConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        LayoutError::Graph(loggraph_core::GraphError::ReservedChapterExists(_))
    ));

    let config = LayoutConfig {
        reject_existing_boundaries: false,
        ..LayoutConfig::default()
    };
    let engine = LayoutEngine::new(prepared, config)?;
    assert_eq!(engine.graph().chapter_ids().len(), 3);
    Ok(())
}

#[test]
fn failed_update_keeps_published_snapshot() -> anyhow::Result<()> {
    let mut engine = LayoutEngine::new(two_column_graph()?, LayoutConfig::default())?;
    let before = engine.snapshot();

    let err = engine
        .update_column_order_strict(&["Z".to_string()])
        .unwrap_err();
    assert!(matches!(err, LayoutError::ColumnMismatch { .. }));
    assert!(Arc::ptr_eq(&before, &engine.snapshot()));

    let after = engine.update_column_order_strict(&["Y".to_string(), "X".to_string()])?;
    assert_eq!(after.column_order, vec!["Y", "X"]);
    assert!(!Arc::ptr_eq(&before, &after));
    Ok(())
}

#[test]
fn layout_pass_is_deterministic() -> anyhow::Result<()> {
    let engine = LayoutEngine::new(two_column_graph()?, LayoutConfig::default())?;
    let first = layout_pass(engine.graph(), engine.config(), None, true)?;
    let second = layout_pass(engine.graph(), engine.config(), None, true)?;
    assert_eq!(first.column_order, second.column_order);
    assert_eq!(first.positions, second.positions);
    assert_eq!(first.vertex_partitions, second.vertex_partitions);
    assert_eq!(first.traces, second.traces);
    assert_eq!(first.related, second.related);
    Ok(())
}

#[test]
fn selecting_a_trace_highlights_its_neighbourhood() -> anyhow::Result<()> {
    let engine = LayoutEngine::new(two_column_graph()?, LayoutConfig::default())?;
    let snapshot = engine.snapshot();
    let styles = StyleSheet::default();
    let mut scene = engine.render(&mut OutlineBackend, &styles, false)?;
    assert_eq!(scene.visuals().len(), snapshot.traces.len());

    let node = snapshot
        .traces
        .index_of(TraceId::Vertex(NodeId::new(1)?.into()))?;
    scene.select(node, &snapshot.related, &styles)?;

    let selected = styles.resolve_selected(TraceKind::Node, "default");
    let base = styles.resolve(TraceKind::Node, "default");
    let mut expected = vec![node];
    expected.extend_from_slice(snapshot.related.of(node));
    assert_eq!(scene.highlighted(), expected.as_slice());
    assert_eq!(scene.visuals()[node].style, selected);

    let chapter = snapshot
        .traces
        .index_of(TraceId::Vertex(ChapterId::start().into()))?;
    scene.select(chapter, &snapshot.related, &styles)?;
    assert_eq!(scene.highlighted(), &[chapter]);
    assert_eq!(scene.visuals()[node].style, base);
    assert_eq!(scene.visuals()[node].info().trace_index, node);

    assert!(scene.select(usize::MAX, &snapshot.related, &styles).is_err());
    Ok(())
}

#[derive(Debug, Clone)]
struct Step {
    new_chapter: bool,
    column: usize,
    stack: bool,
    relate: Option<usize>,
}

fn steps_strategy() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(
        (
            prop::bool::weighted(0.2),
            0usize..4,
            any::<bool>(),
            prop::option::of(0usize..64),
        )
            .prop_map(|(new_chapter, column, stack, relate)| Step {
                new_chapter,
                column,
                stack,
                relate,
            }),
        1..40,
    )
}

fn build_graph(steps: &[Step]) -> LogGraph {
    let mut recorder = LogRecorder::new();
    let mut nodes: Vec<NodeId> = Vec::new();
    for step in steps {
        if step.new_chapter {
            recorder
                .new_chapter("chapter", "default", json!(null))
                .unwrap();
        }
        let relates_to = step
            .relate
            .filter(|_| !nodes.is_empty())
            .map(|idx| nodes[idx % nodes.len()]);
        let entry = LogEntry {
            stack: step.stack,
            relates_to,
            ..LogEntry::new(format!("col{}", step.column), json!(null))
        };
        nodes.push(recorder.log(entry).unwrap());
    }
    recorder.snapshot()
}

proptest! {
    #[test]
    fn prop_layout_invariants(steps in steps_strategy()) {
        let engine = LayoutEngine::new(build_graph(&steps), LayoutConfig::default()).unwrap();
        let snapshot = engine.snapshot();

        prop_assert_eq!(snapshot.positions.len(), engine.graph().vertex_count());
        prop_assert!(snapshot.positions.windows(2).all(|w| w[0].y < w[1].y));

        for (id, row) in snapshot.vertex_partitions.rows() {
            prop_assert!(row.iter().any(|m| *m), "{} is in no partition", id);
        }

        for (edge, row) in snapshot.edge_partitions.rows() {
            let (a, b) = edge.endpoints();
            let row_a = snapshot.vertex_partitions.row(a).unwrap();
            let row_b = snapshot.vertex_partitions.row(b).unwrap();
            for (idx, member) in row.iter().enumerate() {
                prop_assert_eq!(*member, row_a[idx] || row_b[idx]);
            }
        }

        prop_assert_eq!(snapshot.traces.len(), engine.graph().vertex_count() + engine.graph().edge_count());
        for row in snapshot.traces.rows() {
            if row.kind == TraceKind::Chapter {
                prop_assert!(snapshot.related.of(row.index).is_empty());
                continue;
            }
            for &other in snapshot.related.of(row.index) {
                let other_kind = snapshot.trace_kind(other).unwrap();
                if row.kind == TraceKind::Edge || other_kind == TraceKind::Edge {
                    prop_assert!(snapshot.related.of(other).contains(&row.index));
                }
            }
        }
    }

    #[test]
    fn prop_stacking_offset_never_exceeds_hop(steps in steps_strategy()) {
        let engine = LayoutEngine::new(build_graph(&steps), LayoutConfig::default()).unwrap();
        let snapshot = engine.snapshot();
        let hop = snapshot.columns.max_column_width * engine.config().sizing.margin_rel_col;
        for position in snapshot.positions.iter().filter(|p| p.kind == VertexKind::Node) {
            let column = position.column.as_deref().unwrap();
            let center = snapshot.columns.slot_for(column).unwrap().center;
            prop_assert!((position.x - center).abs() <= hop + 1e-12);
        }
    }
}
