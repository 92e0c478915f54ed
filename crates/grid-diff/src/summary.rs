use std::collections::BTreeMap;

use serde::Serialize;

use crate::{ChangeKind, DiffReport};

/// Aggregate counts derived from a [`DiffReport`].
///
/// Invariant: `total_differences` equals the sum of record counts across all
/// sheets and equals the sum of all `by_type` counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Number of sheets with at least one difference.
    pub total_sheets: usize,
    /// Number of change records across all sheets.
    pub total_differences: usize,
    /// Record count per change classification; kinds with zero records are
    /// omitted.
    pub by_type: BTreeMap<ChangeKind, usize>,
}

/// Walk every record in the report once and aggregate the counts.
pub fn summarize(report: &DiffReport) -> Summary {
    let mut summary = Summary {
        total_sheets: report.sheets.len(),
        ..Summary::default()
    };

    for changes in report.sheets.values() {
        for change in changes {
            summary.total_differences += 1;
            *summary.by_type.entry(change.kind()).or_insert(0) += 1;
        }
    }

    summary
}
