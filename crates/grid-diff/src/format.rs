use std::fmt::Write as _;

use grid_model::CellValue;

use crate::{Change, DiffReport};

/// Render a report as plain text, grouped by sheet.
///
/// One line per record (its message); value changes additionally print both
/// sides on indented lines. Absent values render as `(none)`.
pub fn format_report(report: &DiffReport) -> String {
    let mut out = String::new();

    for (sheet_name, changes) in &report.sheets {
        let _ = writeln!(out, "\n=== Sheet: {sheet_name} ===");

        for change in changes {
            let _ = writeln!(out, "{}", change.message());
            if let Change::ValueChanged {
                current_value,
                committed_value,
                ..
            } = change
            {
                let _ = writeln!(out, "  Current: {}", render_value(current_value.as_ref()));
                let _ = writeln!(
                    out,
                    "  Committed: {}",
                    render_value(committed_value.as_ref())
                );
            }
        }
    }

    out
}

fn render_value(value: Option<&CellValue>) -> String {
    match value {
        None => "(none)".to_string(),
        Some(value) => value.to_string(),
    }
}
