//! Per-cell change lookup for presentation layers.
//!
//! A renderer that highlights individual cells needs, for every affected
//! cell, the current value, the committed value, and a classification —
//! keyed by `(row, col, field)` — without re-running the diff. This module
//! derives that lookup from a sheet's change records.

use std::collections::BTreeMap;

use grid_model::CellValue;
use serde::Serialize;

use crate::Change;

/// Key of one affected cell: worksheet row, column ordinal, field name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct CellKey {
    pub row: u32,
    pub col: u32,
    pub field: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellChangeKind {
    Added,
    Removed,
    Modified,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellChange {
    pub kind: CellChangeKind,
    pub current: Option<CellValue>,
    pub committed: Option<CellValue>,
}

/// Derive the per-cell lookup for one sheet's change records.
///
/// Sheet-level records carry no cell data and are skipped; `ROW_REMOVED`
/// carries only the row index (the committed row's cells are not in the
/// report) and is skipped as well. A `VALUE_CHANGED` record with one absent
/// side classifies as added/removed rather than modified.
pub fn cell_changes(changes: &[Change]) -> BTreeMap<CellKey, CellChange> {
    let mut cells = BTreeMap::new();

    for change in changes {
        match change {
            Change::SheetAdded { .. } | Change::SheetRemoved { .. } | Change::RowRemoved { .. } => {
            }
            Change::RowAdded { row, current_data } => {
                for cell in current_data {
                    cells.insert(
                        CellKey {
                            row: *row,
                            col: cell.col,
                            field: cell.field.clone(),
                        },
                        CellChange {
                            kind: CellChangeKind::Added,
                            current: Some(cell.value.clone()),
                            committed: None,
                        },
                    );
                }
            }
            Change::ColumnAdded {
                row,
                col,
                field,
                value,
            } => {
                cells.insert(
                    CellKey {
                        row: *row,
                        col: *col,
                        field: field.clone(),
                    },
                    CellChange {
                        kind: CellChangeKind::Added,
                        current: Some(value.clone()),
                        committed: None,
                    },
                );
            }
            Change::ColumnRemoved {
                row,
                col,
                field,
                value,
            } => {
                cells.insert(
                    CellKey {
                        row: *row,
                        col: *col,
                        field: field.clone(),
                    },
                    CellChange {
                        kind: CellChangeKind::Removed,
                        current: None,
                        committed: Some(value.clone()),
                    },
                );
            }
            Change::ValueChanged {
                row,
                col,
                column,
                current_value,
                committed_value,
            } => {
                let kind = match (current_value, committed_value) {
                    (Some(_), Some(_)) => CellChangeKind::Modified,
                    (Some(_), None) => CellChangeKind::Added,
                    (None, Some(_)) => CellChangeKind::Removed,
                    // The engine never emits a record with both sides absent.
                    (None, None) => continue,
                };
                cells.insert(
                    CellKey {
                        row: *row,
                        col: *col,
                        field: column.clone(),
                    },
                    CellChange {
                        kind,
                        current: current_value.clone(),
                        committed: committed_value.clone(),
                    },
                );
            }
        }
    }

    cells
}
