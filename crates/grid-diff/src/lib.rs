//! Cell-granular diff engine for two workbook snapshots.
//!
//! The engine compares a "current" snapshot (typically the working-copy file)
//! against a "committed" snapshot (typically the version at git HEAD) and
//! classifies every discrepancy at sheet, row, column, or value granularity.
//! It is a pure function over already-materialized [`Workbook`] values: no
//! I/O, no shared state, and a missing snapshot degrades to an empty workbook
//! instead of failing.
//!
//! Record ordering is explicit and deterministic: sheets in lexicographic
//! name order, row indices ascending, column ordinals ascending within a row,
//! field names in lexicographic order within a column.

pub mod cli;
mod format;
mod summary;
mod view;

use std::collections::{BTreeMap, BTreeSet};

use grid_model::{Cell, CellValue, Row, Workbook};
use serde::Serialize;

pub use format::format_report;
pub use summary::{summarize, Summary};
pub use view::{cell_changes, CellChange, CellChangeKind, CellKey};

/// Classification of a single [`Change`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ChangeKind {
    #[serde(rename = "SHEET_ADDED")]
    SheetAdded,
    #[serde(rename = "SHEET_REMOVED")]
    SheetRemoved,
    #[serde(rename = "ROW_ADDED")]
    RowAdded,
    #[serde(rename = "ROW_REMOVED")]
    RowRemoved,
    #[serde(rename = "COLUMN_ADDED")]
    ColumnAdded,
    #[serde(rename = "COLUMN_REMOVED")]
    ColumnRemoved,
    #[serde(rename = "VALUE_CHANGED")]
    ValueChanged,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::SheetAdded => "SHEET_ADDED",
            ChangeKind::SheetRemoved => "SHEET_REMOVED",
            ChangeKind::RowAdded => "ROW_ADDED",
            ChangeKind::RowRemoved => "ROW_REMOVED",
            ChangeKind::ColumnAdded => "COLUMN_ADDED",
            ChangeKind::ColumnRemoved => "COLUMN_REMOVED",
            ChangeKind::ValueChanged => "VALUE_CHANGED",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One atomic discrepancy between the two snapshots.
///
/// A column ordinal present on only one side always yields
/// [`Change::ColumnAdded`] / [`Change::ColumnRemoved`], never
/// [`Change::ValueChanged`]; value comparison only applies when the ordinal
/// exists on both sides. Absent values are `None` and strictly differ from
/// any present value, including [`CellValue::Empty`] and an explicit empty
/// string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Change {
    /// Sheet exists only in the current snapshot.
    #[serde(rename = "SHEET_ADDED")]
    SheetAdded { name: String },
    /// Sheet exists only in the committed snapshot.
    #[serde(rename = "SHEET_REMOVED")]
    SheetRemoved { name: String },
    /// Row index exists only in the current snapshot; carries the full
    /// current-side cell data so consumers can render the new row.
    #[serde(rename = "ROW_ADDED", rename_all = "camelCase")]
    RowAdded { row: u32, current_data: Vec<Cell> },
    /// Row index exists only in the committed snapshot.
    #[serde(rename = "ROW_REMOVED")]
    RowRemoved { row: u32 },
    /// Column ordinal exists only in the current side of a matched row.
    #[serde(rename = "COLUMN_ADDED")]
    ColumnAdded {
        row: u32,
        col: u32,
        field: String,
        value: CellValue,
    },
    /// Column ordinal exists only in the committed side of a matched row.
    #[serde(rename = "COLUMN_REMOVED")]
    ColumnRemoved {
        row: u32,
        col: u32,
        field: String,
        value: CellValue,
    },
    /// The two sides hold strictly different values for a field of a column
    /// ordinal present in both. `None` means the field is absent on that
    /// side (e.g. the logical column was renamed at the same ordinal).
    #[serde(rename = "VALUE_CHANGED", rename_all = "camelCase")]
    ValueChanged {
        row: u32,
        col: u32,
        column: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_value: Option<CellValue>,
        #[serde(skip_serializing_if = "Option::is_none")]
        committed_value: Option<CellValue>,
    },
}

impl Change {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::SheetAdded { .. } => ChangeKind::SheetAdded,
            Change::SheetRemoved { .. } => ChangeKind::SheetRemoved,
            Change::RowAdded { .. } => ChangeKind::RowAdded,
            Change::RowRemoved { .. } => ChangeKind::RowRemoved,
            Change::ColumnAdded { .. } => ChangeKind::ColumnAdded,
            Change::ColumnRemoved { .. } => ChangeKind::ColumnRemoved,
            Change::ValueChanged { .. } => ChangeKind::ValueChanged,
        }
    }

    /// Human-readable one-line description of the change.
    pub fn message(&self) -> String {
        match self {
            Change::SheetAdded { name } => {
                format!("Sheet '{name}' was added to current file")
            }
            Change::SheetRemoved { name } => {
                format!("Sheet '{name}' was removed from current file")
            }
            Change::RowAdded { row, .. } => format!("Row {row} was added"),
            Change::RowRemoved { row } => format!("Row {row} was removed"),
            Change::ColumnAdded { row, col, .. } => {
                format!("Column {col} in row {row} was added")
            }
            Change::ColumnRemoved { row, col, .. } => {
                format!("Column {col} in row {row} was removed")
            }
            Change::ValueChanged {
                row, col, column, ..
            } => {
                format!("Value changed in row {row}, column {col} ({column})")
            }
        }
    }
}

/// Complete result of one comparison: sheet name to that sheet's change
/// records. Sheets with zero differences are omitted entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiffReport {
    pub sheets: BTreeMap<String, Vec<Change>>,
}

impl DiffReport {
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Total number of change records across all sheets.
    pub fn len(&self) -> usize {
        self.sheets.values().map(|changes| changes.len()).sum()
    }

    pub fn sheet(&self, name: &str) -> Option<&[Change]> {
        self.sheets.get(name).map(|changes| changes.as_slice())
    }
}

/// Compare two workbook snapshots and report every discrepancy exactly once.
///
/// `None` on either side means "no data available" (e.g. no committed version
/// exists) and is treated as an empty workbook: every sheet of the other side
/// is then reported as added or removed wholesale.
pub fn compare(current: Option<&Workbook>, committed: Option<&Workbook>) -> DiffReport {
    let empty = BTreeMap::new();
    let current_sheets = current.map(|wb| &wb.sheets).unwrap_or(&empty);
    let committed_sheets = committed.map(|wb| &wb.sheets).unwrap_or(&empty);

    let names: BTreeSet<&str> = current_sheets
        .keys()
        .chain(committed_sheets.keys())
        .map(|name| name.as_str())
        .collect();

    let mut report = DiffReport::default();
    for name in names {
        match (current_sheets.get(name), committed_sheets.get(name)) {
            (None, Some(_)) => {
                report.sheets.insert(
                    name.to_string(),
                    vec![Change::SheetRemoved {
                        name: name.to_string(),
                    }],
                );
            }
            (Some(_), None) => {
                report.sheets.insert(
                    name.to_string(),
                    vec![Change::SheetAdded {
                        name: name.to_string(),
                    }],
                );
            }
            (Some(current_rows), Some(committed_rows)) => {
                let changes = diff_rows(current_rows, committed_rows);
                if !changes.is_empty() {
                    report.sheets.insert(name.to_string(), changes);
                }
            }
            (None, None) => unreachable!("name came from the union of both key sets"),
        }
    }

    report
}

/// Build a row-index lookup for one side of a sheet.
///
/// Row indices are unique per the model invariant; should an upstream bug
/// violate that, the last occurrence wins rather than failing the comparison.
fn row_lookup(rows: &[Row]) -> BTreeMap<u32, &[Cell]> {
    rows.iter().map(|row| (row.row, row.data.as_slice())).collect()
}

fn diff_rows(current: &[Row], committed: &[Row]) -> Vec<Change> {
    let current_rows = row_lookup(current);
    let committed_rows = row_lookup(committed);

    let indices: BTreeSet<u32> = current_rows
        .keys()
        .chain(committed_rows.keys())
        .copied()
        .collect();

    let mut changes = Vec::new();
    for row in indices {
        match (
            current_rows.get(&row).copied(),
            committed_rows.get(&row).copied(),
        ) {
            (None, Some(_)) => changes.push(Change::RowRemoved { row }),
            (Some(data), None) => changes.push(Change::RowAdded {
                row,
                current_data: data.to_vec(),
            }),
            (Some(current_data), Some(committed_data)) => {
                diff_row_cells(row, current_data, committed_data, &mut changes);
            }
            (None, None) => unreachable!("index came from the union of both key sets"),
        }
    }

    changes
}

fn cell_lookup<'a>(data: &'a [Cell]) -> BTreeMap<u32, &'a Cell> {
    data.iter().map(|cell| (cell.col, cell)).collect()
}

fn diff_row_cells(row: u32, current: &[Cell], committed: &[Cell], changes: &mut Vec<Change>) {
    let current_cols = cell_lookup(current);
    let committed_cols = cell_lookup(committed);

    let cols: BTreeSet<u32> = current_cols
        .keys()
        .chain(committed_cols.keys())
        .copied()
        .collect();

    for col in cols {
        match (
            current_cols.get(&col).copied(),
            committed_cols.get(&col).copied(),
        ) {
            (None, Some(cell)) => changes.push(Change::ColumnRemoved {
                row,
                col,
                field: cell.field.clone(),
                value: cell.value.clone(),
            }),
            (Some(cell), None) => changes.push(Change::ColumnAdded {
                row,
                col,
                field: cell.field.clone(),
                value: cell.value.clone(),
            }),
            (Some(current_cell), Some(committed_cell)) => {
                // Match by field name, not position: the same ordinal can
                // hold different logical columns after a header rename.
                let fields: BTreeSet<&str> =
                    [current_cell.field.as_str(), committed_cell.field.as_str()]
                        .into_iter()
                        .collect();

                for field in fields {
                    let current_value = (current_cell.field == field)
                        .then(|| current_cell.value.clone());
                    let committed_value = (committed_cell.field == field)
                        .then(|| committed_cell.value.clone());
                    if current_value != committed_value {
                        changes.push(Change::ValueChanged {
                            row,
                            col,
                            column: field.to_string(),
                            current_value,
                            committed_value,
                        });
                    }
                }
            }
            (None, None) => unreachable!("ordinal came from the union of both key sets"),
        }
    }
}
