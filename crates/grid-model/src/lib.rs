//! Core in-memory data model for workbook version comparison.
//!
//! Sheets are modeled as sparse sequences of index-tagged records rather than
//! dense 2-D grids: a [`Row`] carries its 1-based worksheet row number, and a
//! [`Cell`] carries its 1-based logical column ordinal plus exactly one named
//! field. Loaders build these structures once per comparison; the diff engine
//! consumes them read-only.

mod addressing;
mod value;
mod workbook;

pub use addressing::{column_index_from_letter, column_letter, ColumnRefError};
pub use value::CellValue;
pub use workbook::{Cell, Row, Workbook};
