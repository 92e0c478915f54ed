use std::collections::BTreeMap;

use grid_model::{column_index_from_letter, column_letter, Cell, CellValue, Row};
use roxmltree::Node;

use crate::{parse_xml, XlsxError};

/// Parse one worksheet part into header-keyed sparse rows.
///
/// The first populated row is the header row: its cell text defines the
/// field name of every logical column (falling back to the A1 column letter
/// for columns with a blank or missing header). Each later populated row
/// becomes a [`Row`] keyed by its actual 1-based worksheet row number. The
/// `col` ordinal of a cell is its absolute 1-based worksheet column index,
/// which stays stable across versions; the diff engine matches values by
/// field name when columns shift anyway.
pub(crate) fn parse_sheet_rows(
    xml: &str,
    shared_strings: &[String],
    part: &str,
) -> Result<Vec<Row>, XlsxError> {
    let doc = parse_xml(part, xml)?;

    let Some(sheet_data) = doc
        .descendants()
        .find(|node| node.is_element() && node.tag_name().name() == "sheetData")
    else {
        return Ok(Vec::new());
    };

    // Populated rows only, keyed by worksheet row number (blank rows carry
    // no data and are skipped, like the header-keyed JSON the model mirrors).
    let mut populated: Vec<(u32, Vec<(u32, CellValue)>)> = Vec::new();
    let mut next_row = 1u32;

    for row_node in sheet_data
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "row")
    {
        let row_num = match row_node.attribute("r") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| XlsxError::InvalidCellRef {
                    part: part.to_string(),
                    cell_ref: raw.to_string(),
                })?,
            None => next_row,
        };
        next_row = row_num + 1;

        let mut cells: Vec<(u32, CellValue)> = Vec::new();
        let mut next_col = 1u32;
        for cell_node in row_node
            .children()
            .filter(|node| node.is_element() && node.tag_name().name() == "c")
        {
            let col = match cell_node.attribute("r") {
                Some(cell_ref) => column_from_cell_ref(cell_ref, part)?,
                None => next_col,
            };
            next_col = col + 1;

            if let Some(value) = cell_value(cell_node, shared_strings) {
                cells.push((col, value));
            }
        }

        if !cells.is_empty() {
            populated.push((row_num, cells));
        }
    }

    populated.sort_by_key(|(row_num, _)| *row_num);

    let mut rows_iter = populated.into_iter();
    let Some((_, header_cells)) = rows_iter.next() else {
        return Ok(Vec::new());
    };

    let headers: BTreeMap<u32, String> = header_cells
        .into_iter()
        .map(|(col, value)| {
            let text = value.to_string();
            let field = if text.is_empty() {
                column_letter(col)
            } else {
                text
            };
            (col, field)
        })
        .collect();

    let rows = rows_iter
        .map(|(row_num, cells)| {
            let data = cells
                .into_iter()
                .map(|(col, value)| {
                    let field = headers
                        .get(&col)
                        .cloned()
                        .unwrap_or_else(|| column_letter(col));
                    Cell { col, field, value }
                })
                .collect();
            Row::new(row_num, data)
        })
        .collect();

    Ok(rows)
}

fn column_from_cell_ref(cell_ref: &str, part: &str) -> Result<u32, XlsxError> {
    let letters: String = cell_ref.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    if letters.is_empty() {
        return Err(XlsxError::InvalidCellRef {
            part: part.to_string(),
            cell_ref: cell_ref.to_string(),
        });
    }
    Ok(column_index_from_letter(&letters)?)
}

/// Extract the scalar value of a `<c>` element, or `None` for an empty cell.
fn cell_value(cell: Node<'_, '_>, shared_strings: &[String]) -> Option<CellValue> {
    match cell.attribute("t").unwrap_or("n") {
        "inlineStr" => {
            let is = child_element(cell, "is")?;
            let mut text = String::new();
            for t in is
                .descendants()
                .filter(|node| node.is_element() && node.tag_name().name() == "t")
            {
                text.push_str(t.text().unwrap_or_default());
            }
            Some(CellValue::String(text))
        }
        "s" => {
            let v = element_text(cell, "v")?;
            let idx: usize = v.trim().parse().ok()?;
            // Dangling shared-string indices degrade to an empty string
            // rather than failing the whole load.
            Some(CellValue::String(
                shared_strings.get(idx).cloned().unwrap_or_default(),
            ))
        }
        // Formula-produced strings and error values are surfaced as their
        // string form; styles and formulas themselves are not modeled.
        "str" | "e" => Some(CellValue::String(element_text(cell, "v")?)),
        "b" => Some(CellValue::Boolean(element_text(cell, "v")?.trim() != "0")),
        _ => {
            let v = element_text(cell, "v")?;
            match v.trim().parse::<f64>() {
                Ok(n) => Some(CellValue::Number(n)),
                Err(_) => Some(CellValue::String(v)),
            }
        }
    }
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == name)
}

fn element_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child_element(node, name)?.text().map(str::to_string)
}
