use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::CellValue;

/// One populated cell within a row.
///
/// `col` is metadata (the 1-based logical column ordinal, unique within a
/// row); `field` / `value` are the single semantic payload. The same logical
/// column keeps the same `field` name across versions even when its `col`
/// ordinal shifts, which is why the diff engine matches values by field name
/// rather than by position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// 1-based logical column ordinal.
    pub col: u32,
    /// Header/key of the logical column this cell belongs to.
    pub field: String,
    pub value: CellValue,
}

impl Cell {
    pub fn new(col: u32, field: impl Into<String>, value: impl Into<CellValue>) -> Self {
        Self {
            col,
            field: field.into(),
            value: value.into(),
        }
    }
}

/// One populated row within a sheet.
///
/// `row` is the 1-based worksheet row number and is the stable identifier
/// rows are matched by; the position of a `Row` within its sheet carries no
/// meaning for diffing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// 1-based worksheet row number, unique within a sheet.
    pub row: u32,
    pub data: Vec<Cell>,
}

impl Row {
    pub fn new(row: u32, data: Vec<Cell>) -> Self {
        Self { row, data }
    }
}

/// A full workbook snapshot: sheet name to that sheet's populated rows.
///
/// Absence of a sheet name means the sheet does not exist in this version.
/// Snapshots are built once by a loader and consumed read-only by the diff
/// engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: BTreeMap<String, Vec<Row>>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Insert a sheet, replacing any previous sheet of the same name.
    pub fn insert_sheet(&mut self, name: impl Into<String>, rows: Vec<Row>) {
        self.sheets.insert(name.into(), rows);
    }

    pub fn sheet(&self, name: &str) -> Option<&[Row]> {
        self.sheets.get(name).map(|rows| rows.as_slice())
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(|name| name.as_str())
    }
}
