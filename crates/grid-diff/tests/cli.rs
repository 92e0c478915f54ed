use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::process::Command;

use zip::write::FileOptions;
use zip::ZipWriter;

fn make_workbook(name: &str) -> Vec<u8> {
    let workbook_xml = r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;
    let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;
    let sheet = format!(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1"><c r="A1" t="inlineStr"><is><t>Name</t></is></c></row>
    <row r="2"><c r="A2" t="inlineStr"><is><t>{name}</t></is></c></row>
  </sheetData>
</worksheet>"#
    );

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::<()>::default();
    for (part, content) in [
        ("xl/workbook.xml", workbook_xml),
        ("xl/_rels/workbook.xml.rels", rels),
        ("xl/worksheets/sheet1.xml", sheet.as_str()),
    ] {
        writer.start_file(part, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn grid_diff() -> Command {
    Command::new(env!("CARGO_BIN_EXE_grid_diff"))
}

#[test]
fn two_file_diff_reports_value_change_as_json() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let current = tmp.path().join("current.xlsx");
    let committed = tmp.path().join("committed.xlsx");
    fs::write(&current, make_workbook("Alice")).unwrap();
    fs::write(&committed, make_workbook("Bob")).unwrap();

    let out = grid_diff()
        .arg(&current)
        .arg("--against")
        .arg(&committed)
        .args(["--format", "json"])
        .output()
        .expect("run grid_diff");

    assert_eq!(out.status.code(), Some(1), "differences exit with 1: {out:?}");

    let json: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("stdout is a JSON report");
    assert_eq!(json["summary"]["totalSheets"], 1);
    assert_eq!(json["summary"]["totalDifferences"], 1);
    assert_eq!(json["summary"]["byType"]["VALUE_CHANGED"], 1);

    let record = &json["sheets"]["Sheet1"][0];
    assert_eq!(record["type"], "VALUE_CHANGED");
    assert_eq!(record["row"], 2);
    assert_eq!(record["col"], 1);
    assert_eq!(record["column"], "Name");
    assert_eq!(record["currentValue"]["value"], "Alice");
    assert_eq!(record["committedValue"]["value"], "Bob");
    assert_eq!(record["message"], "Value changed in row 2, column 1 (Name)");
}

#[test]
fn identical_files_exit_cleanly() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let a = tmp.path().join("a.xlsx");
    let b = tmp.path().join("b.xlsx");
    fs::write(&a, make_workbook("Alice")).unwrap();
    fs::write(&b, make_workbook("Alice")).unwrap();

    let out = grid_diff()
        .arg(&a)
        .arg("--against")
        .arg(&b)
        .output()
        .expect("run grid_diff");

    assert!(out.status.success(), "clean diff exits 0: {out:?}");
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("No differences."), "got: {text}");
}

#[test]
fn max_diffs_truncates_json_records_but_not_counts() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let current = tmp.path().join("current.xlsx");
    let committed = tmp.path().join("committed.xlsx");
    fs::write(&current, make_workbook("Alice")).unwrap();
    fs::write(&committed, make_workbook("Bob")).unwrap();

    let out = grid_diff()
        .arg(&current)
        .arg("--against")
        .arg(&committed)
        .args(["--format", "json", "--max-diffs", "0"])
        .output()
        .expect("run grid_diff");

    let json: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("stdout is a JSON report");
    assert_eq!(json["summary"]["totalDifferences"], 1);
    assert_eq!(json["sheets"]["Sheet1"].as_array().unwrap().len(), 0);
}

#[test]
fn git_mode_diffs_against_head() {
    if Command::new("git").arg("--version").output().is_err() {
        return;
    }

    let tmp = tempfile::tempdir().expect("tempdir");
    let repo = tmp.path();
    run_git(repo, &["init"]);
    run_git(repo, &["config", "user.email", "test@example.com"]);
    run_git(repo, &["config", "user.name", "Test"]);

    let book = repo.join("book.xlsx");
    fs::write(&book, make_workbook("Bob")).unwrap();
    run_git(repo, &["add", "book.xlsx"]);
    run_git(repo, &["commit", "-m", "add book"]);
    fs::write(&book, make_workbook("Alice")).unwrap();

    let out = grid_diff().arg(&book).output().expect("run grid_diff");
    assert_eq!(out.status.code(), Some(1), "differences exit with 1: {out:?}");

    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("Value changed in row 2, column 1 (Name)"), "got: {text}");
    assert!(text.contains("  Current: Alice"), "got: {text}");
    assert!(text.contains("  Committed: Bob"), "got: {text}");
}

#[test]
fn untracked_file_warns_and_reports_sheet_added() {
    if Command::new("git").arg("--version").output().is_err() {
        return;
    }

    let tmp = tempfile::tempdir().expect("tempdir");
    let repo = tmp.path();
    run_git(repo, &["init"]);

    let book = repo.join("new.xlsx");
    fs::write(&book, make_workbook("Alice")).unwrap();

    let out = grid_diff().arg(&book).output().expect("run grid_diff");
    assert_eq!(out.status.code(), Some(1), "differences exit with 1: {out:?}");

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("no committed version"), "got: {stderr}");
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("Sheet 'Sheet1' was added to current file"), "got: {text}");
}

fn run_git(repo: &Path, args: &[&str]) {
    let out = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .expect("git should run");
    assert!(out.status.success(), "git {args:?} failed: {out:?}");
}
