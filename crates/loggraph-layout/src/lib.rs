pub mod columns;
pub mod config;
pub mod engine;
pub mod error;
pub mod partition;
pub mod positions;
pub mod render;
pub mod traces;

pub use columns::{ColumnLayout, ColumnSlot, EXTRA_COLUMN, resolve_column_order};
pub use config::{DEFAULT_SIZING, LayoutConfig, Sizing};
pub use engine::{ChapterLocation, LayoutEngine, LayoutExport, LayoutSnapshot, layout_pass};
pub use error::LayoutError;
pub use partition::{
    ActiveArea, EdgePartitions, PartitionName, VertexPartitions, active_partition,
    partition_edges, partition_vertices,
};
pub use positions::{VertexPosition, compute_positions};
pub use render::{
    EdgeGeometry, FALLBACK_STYLE, Outline, OutlineBackend, Point, Primitive, RenderBackend,
    SELECTED_SUFFIX, Scene, SegmentRequest, ShapeRequest, StyleBag, StyleSheet, TraceInfo, Visual,
    excerpt,
};
pub use traces::{RelatedTraces, TraceId, TraceKind, TraceRow, TraceTable};
