use crate::error::LayoutError;
use loggraph_core::normalize_name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Synthetic column that collects every column left out of a requested order.
pub const EXTRA_COLUMN: &str = "__extra__";

/// Resolves the column order for a layout pass.
///
/// Without a request the graph's columns are used in sorted order. A request
/// is normalized and matched against the graph; unknown names fail in strict
/// mode and are dropped with a warning otherwise. When the result does not
/// cover every graph column, [`EXTRA_COLUMN`] is appended.
pub fn resolve_column_order(
    graph_columns: &[String],
    requested: Option<&[String]>,
    strict: bool,
) -> Result<Vec<String>, LayoutError> {
    let available: BTreeSet<&str> = graph_columns.iter().map(String::as_str).collect();

    let mut order: Vec<String> = match requested {
        None => available.iter().map(|c| c.to_string()).collect(),
        Some(names) => {
            let mut order = Vec::with_capacity(names.len());
            for name in names {
                let name = normalize_name(name);
                if !available.contains(name.as_str()) {
                    if strict {
                        return Err(LayoutError::ColumnMismatch {
                            column: name,
                            available: available.iter().map(|c| c.to_string()).collect(),
                        });
                    }
                    tracing::warn!("Dropping unknown column {:?} from requested order", name);
                    continue;
                }
                if !order.contains(&name) {
                    order.push(name);
                }
            }
            order
        }
    };

    if order.len() != available.len() || order.is_empty() {
        order.push(EXTRA_COLUMN.to_string());
    }
    Ok(order)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSlot {
    pub name: String,
    pub center: f64,
    /// Usable width once the margin is taken off.
    pub width: f64,
}

/// Horizontal placement of the resolved columns across the unit-wide figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub slots: Vec<ColumnSlot>,
    pub max_column_width: f64,
}

impl ColumnLayout {
    pub fn new(order: &[String], margin_rel_col: f64) -> Self {
        let max_column_width = 1.0 / order.len().max(1) as f64;
        let margin = max_column_width * margin_rel_col;
        let slots = order
            .iter()
            .enumerate()
            .map(|(idx, name)| ColumnSlot {
                name: name.clone(),
                center: max_column_width * (idx as f64 + 0.5),
                width: max_column_width - margin,
            })
            .collect();
        Self {
            slots,
            max_column_width,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.name.as_str())
    }

    /// Slot for `column`, falling back to [`EXTRA_COLUMN`].
    pub fn slot_for(&self, column: &str) -> Result<&ColumnSlot, LayoutError> {
        self.slots
            .iter()
            .find(|slot| slot.name == column)
            .or_else(|| self.slots.iter().find(|slot| slot.name == EXTRA_COLUMN))
            .ok_or_else(|| LayoutError::ColumnMismatch {
                column: column.to_string(),
                available: self.names().map(str::to_string).collect(),
            })
    }
}
