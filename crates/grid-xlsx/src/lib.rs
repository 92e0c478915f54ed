//! XLSX loader for workbook version comparison.
//!
//! Parses an `.xlsx` package (from a path or in-memory bytes, e.g. a git
//! blob) into the sparse header-keyed row model consumed by `grid-diff`:
//! the first populated row of each sheet is treated as the header row and
//! defines the field name of every logical column; each later populated row
//! becomes a [`Row`] keyed by its actual 1-based worksheet row number, with
//! one [`Cell`] per non-empty cell.
//!
//! Only the parts needed for cell values are read (workbook metadata, the
//! workbook relationships, shared strings, and the worksheet parts). Styles,
//! formulas, and formatting are intentionally not modeled.

mod shared_strings;
mod sheet;

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use grid_model::{ColumnRefError, Workbook};
use roxmltree::Document;
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_TYPE_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";

#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] ZipError),
    #[error("part {part} is not valid UTF-8")]
    Utf8 {
        part: String,
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("xml parse error in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: roxmltree::Error,
    },
    #[error("missing required part: {0}")]
    MissingPart(String),
    #[error("invalid cell reference {cell_ref:?} in {part}")]
    InvalidCellRef { part: String, cell_ref: String },
    #[error("invalid column reference: {0}")]
    ColumnRef(#[from] ColumnRefError),
}

/// Read a workbook snapshot from an `.xlsx` file on disk.
pub fn read_workbook_from_path(path: impl AsRef<Path>) -> Result<Workbook, XlsxError> {
    let mut file = File::open(path.as_ref())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    read_workbook_from_bytes(&bytes)
}

/// Read a workbook snapshot from in-memory `.xlsx` bytes (e.g. a git blob).
pub fn read_workbook_from_bytes(bytes: &[u8]) -> Result<Workbook, XlsxError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let workbook_xml = read_part_required(&mut archive, WORKBOOK_PART)?;
    let workbook_rels = read_part_required(&mut archive, WORKBOOK_RELS_PART)?;

    let rels = parse_relationships(&workbook_rels)?;
    let sheets = parse_sheet_entries(&workbook_xml, &rels)?;

    let shared_strings_part = rels
        .shared_strings_target
        .clone()
        .unwrap_or_else(|| SHARED_STRINGS_PART.to_string());
    let shared_strings = match read_part_optional(&mut archive, &shared_strings_part)? {
        Some(bytes) => {
            let xml = part_str(&shared_strings_part, &bytes)?;
            shared_strings::parse_shared_strings(xml, &shared_strings_part)?
        }
        None => Vec::new(),
    };

    let mut workbook = Workbook::new();
    for entry in sheets {
        let bytes = read_part_optional(&mut archive, &entry.part)?
            .ok_or_else(|| XlsxError::MissingPart(entry.part.clone()))?;
        let xml = part_str(&entry.part, &bytes)?;
        let rows = sheet::parse_sheet_rows(xml, &shared_strings, &entry.part)?;
        workbook.insert_sheet(entry.name, rows);
    }

    Ok(workbook)
}

struct SheetEntry {
    name: String,
    part: String,
}

struct WorkbookRels {
    /// Relationship Id -> resolved part name.
    targets: std::collections::BTreeMap<String, String>,
    shared_strings_target: Option<String>,
}

fn parse_relationships(bytes: &[u8]) -> Result<WorkbookRels, XlsxError> {
    let xml = part_str(WORKBOOK_RELS_PART, bytes)?;
    let doc = parse_xml(WORKBOOK_RELS_PART, xml)?;

    let mut rels = WorkbookRels {
        targets: Default::default(),
        shared_strings_target: None,
    };

    for node in doc
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == "Relationship")
    {
        let Some(id) = node.attribute("Id") else {
            continue;
        };
        let target = resolve_target(node.attribute("Target").unwrap_or_default());
        if node.attribute("Type") == Some(REL_TYPE_SHARED_STRINGS) {
            rels.shared_strings_target = Some(target.clone());
        }
        rels.targets.insert(id.to_string(), target);
    }

    Ok(rels)
}

/// Resolve a workbook-relative relationship target to a package part name.
fn resolve_target(target: &str) -> String {
    let target = target.replace('\\', "/");
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

fn parse_sheet_entries(bytes: &[u8], rels: &WorkbookRels) -> Result<Vec<SheetEntry>, XlsxError> {
    let xml = part_str(WORKBOOK_PART, bytes)?;
    let doc = parse_xml(WORKBOOK_PART, xml)?;

    let mut entries = Vec::new();
    for node in doc
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == "sheet")
    {
        let Some(name) = node.attribute("name") else {
            continue;
        };
        let Some(rel_id) = node.attribute((REL_NS, "id")) else {
            continue;
        };
        let Some(part) = rels.targets.get(rel_id) else {
            continue;
        };
        entries.push(SheetEntry {
            name: name.to_string(),
            part: part.clone(),
        });
    }

    Ok(entries)
}

fn read_part_required<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>, XlsxError> {
    read_part_optional(archive, name)?.ok_or_else(|| XlsxError::MissingPart(name.to_string()))
}

fn read_part_optional<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, XlsxError> {
    match archive.by_name(name) {
        Ok(mut file) => {
            // ZIP metadata is untrusted; read without pre-allocating to the
            // advertised uncompressed size.
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            Ok(Some(bytes))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn part_str<'a>(part: &str, bytes: &'a [u8]) -> Result<&'a str, XlsxError> {
    std::str::from_utf8(bytes).map_err(|source| XlsxError::Utf8 {
        part: part.to_string(),
        source,
    })
}

fn parse_xml<'a>(part: &str, xml: &'a str) -> Result<Document<'a>, XlsxError> {
    Document::parse(xml).map_err(|source| XlsxError::Xml {
        part: part.to_string(),
        source,
    })
}
