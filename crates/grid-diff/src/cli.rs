use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use crate::{compare, format_report, summarize, Change};

#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// CLI arguments for the `grid_diff` binary.
///
/// This lives in the library crate so the binary stays a thin wrapper and the
/// command surface can be integration-tested.
#[derive(Parser)]
#[command(
    about = "Diff a workbook against its committed (git HEAD) version or a second file.",
    long_about = "Diff a workbook against its committed (git HEAD) version or a second file.\n\n\
                  Exits with code 1 when differences are found, 0 when the snapshots match."
)]
pub struct Args {
    /// Current workbook (working copy).
    current: PathBuf,

    /// Compare against this workbook instead of the committed git version.
    #[arg(long, value_name = "PATH")]
    against: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Maximum number of diffs to include in JSON output (default: unlimited).
    #[arg(long)]
    max_diffs: Option<usize>,
}

#[derive(Debug, Serialize)]
struct JsonChange<'a> {
    message: String,
    #[serde(flatten)]
    change: &'a Change,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    current: &'a str,
    committed: &'a str,
    summary: &'a crate::Summary,
    sheets: BTreeMap<&'a str, Vec<JsonChange<'a>>>,
}

pub fn run() -> Result<()> {
    run_with_args(Args::parse())
}

pub fn run_with_args(args: Args) -> Result<()> {
    let current = grid_xlsx::read_workbook_from_path(&args.current)
        .with_context(|| format!("read workbook {}", args.current.display()))?;

    let (committed, committed_label) = match &args.against {
        Some(path) => {
            let workbook = grid_xlsx::read_workbook_from_path(path)
                .with_context(|| format!("read workbook {}", path.display()))?;
            (Some(workbook), path.display().to_string())
        }
        None => {
            let label = format!("HEAD:{}", args.current.display());
            match grid_git::committed_workbook(&args.current)? {
                Some(workbook) => (Some(workbook), label),
                None => {
                    eprintln!(
                        "warning: no committed version of {} found; treating it as empty",
                        args.current.display()
                    );
                    (None, label)
                }
            }
        }
    };

    let report = compare(Some(&current), committed.as_ref());
    let summary = summarize(&report);

    match args.format {
        OutputFormat::Text => {
            println!("Workbook diff report");
            println!("  current: {}", args.current.display());
            println!("  committed: {committed_label}");
            println!();

            if report.is_empty() {
                println!("No differences.");
                return Ok(());
            }

            println!(
                "Summary: sheets={} differences={}",
                summary.total_sheets, summary.total_differences
            );
            for (kind, count) in &summary.by_type {
                println!("  {kind}: {count}");
            }
            print!("{}", format_report(&report));
        }
        OutputFormat::Json => {
            let current_label = args.current.display().to_string();

            let mut budget = args.max_diffs.unwrap_or(usize::MAX);
            let mut sheets: BTreeMap<&str, Vec<JsonChange<'_>>> = BTreeMap::new();
            for (name, changes) in &report.sheets {
                let taken: Vec<JsonChange<'_>> = changes
                    .iter()
                    .take(budget)
                    .map(|change| JsonChange {
                        message: change.message(),
                        change,
                    })
                    .collect();
                budget -= taken.len();
                sheets.insert(name.as_str(), taken);
            }

            let json_report = JsonReport {
                current: &current_label,
                committed: &committed_label,
                summary: &summary,
                sheets,
            };

            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer(&mut handle, &json_report)?;
            handle.write_all(b"\n")?;

            if report.is_empty() {
                return Ok(());
            }
        }
    }

    std::process::exit(1);
}
