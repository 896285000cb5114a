//! Render adapter: turns layout rows into backend-agnostic primitives and
//! keeps the highlight state of the visuals a backend produced for them.

use crate::error::LayoutError;
use crate::traces::{RelatedTraces, TraceKind};
use loggraph_core::{EdgeId, content_text};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Style name looked up when a requested style is missing.
pub const FALLBACK_STYLE: &str = "__default__";
pub const SELECTED_SUFFIX: &str = "_selected";
const EXCERPT_ELLIPSIS: &str = " ...";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRequest {
    pub center: Point,
    pub width: f64,
    pub height: f64,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRequest {
    pub edge: EdgeId,
    pub start: Point,
    pub end: Point,
    pub thickness: f64,
    pub style: String,
}

impl SegmentRequest {
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }

    pub fn check(&self) -> Result<(), LayoutError> {
        if self.is_degenerate() {
            return Err(LayoutError::DegenerateGeometry {
                edge: self.edge,
                x: self.start.x,
                y: self.start.y,
            });
        }
        Ok(())
    }
}

/// What to draw for one trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Node(ShapeRequest),
    Chapter(ShapeRequest),
    Edge(SegmentRequest),
}

impl Primitive {
    pub fn kind(&self) -> TraceKind {
        match self {
            Primitive::Node(_) => TraceKind::Node,
            Primitive::Chapter(_) => TraceKind::Chapter,
            Primitive::Edge(_) => TraceKind::Edge,
        }
    }

    pub fn style(&self) -> &str {
        match self {
            Primitive::Node(shape) | Primitive::Chapter(shape) => &shape.style,
            Primitive::Edge(segment) => &segment.style,
        }
    }
}

/// Data carried by every visual so a viewer can map it back to the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceInfo {
    pub trace_index: usize,
    pub kind: TraceKind,
    pub trace_style: String,
    pub title: Option<String>,
    pub excerpt: String,
}

/// Shortens content to `max_len` characters, marking the cut with ` ...`.
pub fn excerpt(content: &Value, max_len: usize) -> String {
    let text = content_text(content);
    if text.chars().count() <= max_len {
        return text;
    }
    let mut short: String = text.chars().take(max_len).collect();
    short.push_str(EXCERPT_ELLIPSIS);
    short
}

pub type StyleBag = BTreeMap<String, Value>;

/// Named style bags per trace kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSheet {
    pub node: BTreeMap<String, StyleBag>,
    pub chapter: BTreeMap<String, StyleBag>,
    pub edge: BTreeMap<String, StyleBag>,
}

impl Default for StyleSheet {
    fn default() -> Self {
        fn bag(pairs: &[(&str, Value)]) -> StyleBag {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect()
        }
        let base = |color: &str| bag(&[("fillcolor", Value::from(color))]);

        let mut sheet = Self {
            node: BTreeMap::new(),
            chapter: BTreeMap::new(),
            edge: BTreeMap::new(),
        };
        for table in [&mut sheet.node, &mut sheet.chapter, &mut sheet.edge] {
            table.insert(FALLBACK_STYLE.to_string(), base("#d0d0d0"));
            table.insert(format!("{FALLBACK_STYLE}{SELECTED_SUFFIX}"), base("#ffb000"));
        }
        sheet
            .chapter
            .insert(loggraph_core::START_STYLE.to_string(), base("#6fbf73"));
        sheet
            .chapter
            .insert(loggraph_core::END_STYLE.to_string(), base("#e57373"));
        sheet
    }
}

impl StyleSheet {
    fn table(&self, kind: TraceKind) -> &BTreeMap<String, StyleBag> {
        match kind {
            TraceKind::Node => &self.node,
            TraceKind::Chapter => &self.chapter,
            TraceKind::Edge => &self.edge,
        }
    }

    /// Bag for `name`, else the kind's `__default__`, else empty.
    pub fn resolve(&self, kind: TraceKind, name: &str) -> StyleBag {
        let table = self.table(kind);
        table
            .get(name)
            .or_else(|| table.get(FALLBACK_STYLE))
            .cloned()
            .unwrap_or_default()
    }

    /// Highlight variant of `name`, falling back to `__default___selected`.
    pub fn resolve_selected(&self, kind: TraceKind, name: &str) -> StyleBag {
        let table = self.table(kind);
        table
            .get(&format!("{name}{SELECTED_SUFFIX}"))
            .or_else(|| table.get(&format!("{FALLBACK_STYLE}{SELECTED_SUFFIX}")))
            .cloned()
            .unwrap_or_default()
    }
}

pub trait Visual {
    fn info(&self) -> &TraceInfo;
    fn set_style(&mut self, style: &StyleBag);
}

/// A drawing surface. Builds one visual per primitive.
pub trait RenderBackend {
    type Visual: Visual;

    fn build(&mut self, primitive: &Primitive, info: TraceInfo, style: &StyleBag) -> Self::Visual;
}

/// Visuals indexed by trace index, with the current highlight.
#[derive(Debug, Clone)]
pub struct Scene<V> {
    visuals: Vec<V>,
    highlighted: Vec<usize>,
}

impl<V: Visual> Scene<V> {
    pub fn new(visuals: Vec<V>) -> Self {
        Self {
            visuals,
            highlighted: Vec::new(),
        }
    }

    pub fn visuals(&self) -> &[V] {
        &self.visuals
    }

    pub fn highlighted(&self) -> &[usize] {
        &self.highlighted
    }

    /// Restores base styles on the previous highlight, then applies the
    /// `_selected` variant to `trace_index` and its related traces.
    pub fn select(
        &mut self,
        trace_index: usize,
        related: &RelatedTraces,
        styles: &StyleSheet,
    ) -> Result<(), LayoutError> {
        if trace_index >= self.visuals.len() {
            return Err(LayoutError::MissingTrace(format!(
                "trace index {trace_index}"
            )));
        }
        self.clear_selection(styles);

        let mut selection = vec![trace_index];
        selection.extend(related.of(trace_index).iter().copied());
        for &idx in &selection {
            let Some(visual) = self.visuals.get_mut(idx) else {
                tracing::warn!("Related trace {} has no visual", idx);
                continue;
            };
            let style = styles.resolve_selected(visual.info().kind, &visual.info().trace_style);
            visual.set_style(&style);
        }
        self.highlighted = selection;
        Ok(())
    }

    pub fn clear_selection(&mut self, styles: &StyleSheet) {
        for idx in std::mem::take(&mut self.highlighted) {
            if let Some(visual) = self.visuals.get_mut(idx) {
                let style = styles.resolve(visual.info().kind, &visual.info().trace_style);
                visual.set_style(&style);
            }
        }
    }
}

/// Polygon outline produced by [`OutlineBackend`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub info: TraceInfo,
    pub points: Vec<Point>,
    pub closed: bool,
    pub style: StyleBag,
}

impl Visual for Outline {
    fn info(&self) -> &TraceInfo {
        &self.info
    }

    fn set_style(&mut self, style: &StyleBag) {
        self.style = style.clone();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeGeometry {
    Straight,
    Perpendicular,
    Skew,
}

/// Reference backend emitting plain outlines: rectangles for nodes,
/// hexagons for chapters and knee-routed polylines for edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineBackend;

impl OutlineBackend {
    pub fn rectangle(shape: &ShapeRequest) -> Vec<Point> {
        let (cx, cy) = (shape.center.x, shape.center.y);
        let (hw, hh) = (shape.width / 2.0, shape.height / 2.0);
        let (left, right, top, bottom) = (cx - hw, cx + hw, cy + hh, cy - hh);
        vec![
            Point::new(left, top),
            Point::new(left, bottom),
            Point::new(right, bottom),
            Point::new(right, top),
            Point::new(left, top),
        ]
    }

    pub fn hexagon(shape: &ShapeRequest) -> Vec<Point> {
        let (cx, cy) = (shape.center.x, shape.center.y);
        let (hw, hh) = (shape.width / 2.0, shape.height / 2.0);
        let (left, right, top, bottom) = (cx - hw, cx + hw, cy + hh, cy - hh);
        let skew = hh;
        vec![
            Point::new(left, cy),
            Point::new(left + skew, top),
            Point::new(right - skew, top),
            Point::new(right, cy),
            Point::new(right - skew, bottom),
            Point::new(left + skew, bottom),
            Point::new(left, cy),
        ]
    }

    pub fn edge_geometry(start: Point, end: Point) -> EdgeGeometry {
        let dx = (start.x - end.x).abs();
        let dy = (start.y - end.y).abs();
        if start.y == end.y {
            EdgeGeometry::Straight
        } else if dy <= dx {
            EdgeGeometry::Perpendicular
        } else {
            EdgeGeometry::Skew
        }
    }

    pub fn route(start: Point, end: Point) -> Vec<Point> {
        let mid_y = (start.y + end.y) / 2.0;
        match Self::edge_geometry(start, end) {
            EdgeGeometry::Straight => vec![start, end],
            EdgeGeometry::Perpendicular => vec![
                start,
                Point::new(start.x, mid_y),
                Point::new(end.x, mid_y),
                end,
            ],
            EdgeGeometry::Skew => {
                let skew = (start.x - end.x).abs() / (std::f64::consts::PI / 12.0).cos();
                // knees ordered along the edge direction so the line never doubles back
                let (knee_start, knee_end) = if start.y < end.y {
                    (mid_y - skew / 2.0, mid_y + skew / 2.0)
                } else {
                    (mid_y + skew / 2.0, mid_y - skew / 2.0)
                };
                vec![
                    start,
                    Point::new(start.x, knee_start),
                    Point::new(end.x, knee_end),
                    end,
                ]
            }
        }
    }
}

impl OutlineBackend {
    /// Widens `path` into a closed polygon `width` across, mitred at the knees.
    /// Paths with fewer than two distinct points come back unchanged.
    pub fn stroke(path: &[Point], width: f64) -> Vec<Point> {
        let mut points: Vec<Point> = Vec::with_capacity(path.len());
        for point in path {
            if points.last() != Some(point) {
                points.push(*point);
            }
        }
        if points.len() < 2 || width <= 0.0 {
            return points;
        }

        let normals: Vec<(f64, f64)> = points
            .windows(2)
            .map(|pair| {
                let (dx, dy) = (pair[1].x - pair[0].x, pair[1].y - pair[0].y);
                let len = dx.hypot(dy);
                (-dy / len, dx / len)
            })
            .collect();
        let half = width / 2.0;
        let last = points.len() - 1;
        let offsets: Vec<(f64, f64)> = (0..points.len())
            .map(|i| {
                if i == 0 {
                    return normals[0];
                }
                if i == last {
                    return normals[last - 1];
                }
                let (a, b) = (normals[i - 1], normals[i]);
                let (mx, my) = (a.0 + b.0, a.1 + b.1);
                let len = mx.hypot(my);
                if len < 1e-12 {
                    return b;
                }
                let (mx, my) = (mx / len, my / len);
                let scale = 1.0 / (mx * b.0 + my * b.1);
                (mx * scale, my * scale)
            })
            .collect();

        let side = |sign: f64| {
            points.iter().zip(&offsets).map(move |(p, (ox, oy))| {
                Point::new(p.x + sign * ox * half, p.y + sign * oy * half)
            })
        };
        let mut outline: Vec<Point> = side(1.0).collect();
        outline.extend(side(-1.0).rev());
        outline.push(outline[0]);
        outline
    }
}

impl RenderBackend for OutlineBackend {
    type Visual = Outline;

    fn build(&mut self, primitive: &Primitive, info: TraceInfo, style: &StyleBag) -> Outline {
        let (points, closed) = match primitive {
            Primitive::Node(shape) => (Self::rectangle(shape), true),
            Primitive::Chapter(shape) => (Self::hexagon(shape), true),
            Primitive::Edge(segment) => {
                let route = Self::route(segment.start, segment.end);
                let outline = Self::stroke(&route, segment.thickness);
                let closed = outline.len() > route.len();
                (outline, closed)
            }
        };
        Outline {
            info,
            points,
            closed,
            style: style.clone(),
        }
    }
}
