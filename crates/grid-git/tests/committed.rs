use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::process::Command;

use grid_model::{Cell, CellValue, Row};
use pretty_assertions::assert_eq;
use zip::write::FileOptions;
use zip::ZipWriter;

fn git_available() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

fn run_git(repo: &Path, args: &[&str]) {
    let out = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .expect("git should run");
    assert!(out.status.success(), "git {args:?} failed: {out:?}");
}

/// Build a one-sheet workbook with a `Name` header and a single data row.
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

fn init_repo(repo: &Path) {
    run_git(repo, &["init"]);
    run_git(repo, &["config", "user.email", "test@example.com"]);
    run_git(repo, &["config", "user.name", "Test"]);
}

#[test]
fn committed_version_is_read_from_head() {
    if !git_available() {
        return;
    }

    let tmp = tempfile::tempdir().expect("tempdir");
    let repo = tmp.path();
    init_repo(repo);

    let book = repo.join("book.xlsx");
    fs::write(&book, make_workbook("Bob")).expect("write v1");
    run_git(repo, &["add", "book.xlsx"]);
    run_git(repo, &["commit", "-m", "add book"]);

    // Working copy moves on; HEAD should still say Bob.
    fs::write(&book, make_workbook("Alice")).expect("write v2");

    let committed = grid_git::committed_workbook(&book)
        .expect("load committed version")
        .expect("committed version exists");
    assert_eq!(
        committed.sheet("Sheet1"),
        Some(&[Row::new(
            2,
            vec![Cell::new(1, "Name", CellValue::String("Bob".to_string()))]
        )][..])
    );

    let current = grid_xlsx::read_workbook_from_path(&book).expect("read working copy");
    assert_eq!(
        current.sheet("Sheet1"),
        Some(&[Row::new(2, vec![Cell::new(1, "Name", "Alice")])][..])
    );
}

#[test]
fn untracked_file_has_no_committed_version() {
    if !git_available() {
        return;
    }

    let tmp = tempfile::tempdir().expect("tempdir");
    let repo = tmp.path();
    init_repo(repo);

    let book = repo.join("untracked.xlsx");
    fs::write(&book, make_workbook("Bob")).expect("write workbook");

    let committed = grid_git::committed_workbook(&book).expect("load committed version");
    assert!(committed.is_none());
}

#[test]
fn staged_but_uncommitted_file_has_no_committed_version() {
    if !git_available() {
        return;
    }

    let tmp = tempfile::tempdir().expect("tempdir");
    let repo = tmp.path();
    init_repo(repo);

    let book = repo.join("staged.xlsx");
    fs::write(&book, make_workbook("Bob")).expect("write workbook");
    run_git(repo, &["add", "staged.xlsx"]);

    let committed = grid_git::committed_workbook(&book).expect("load committed version");
    assert!(committed.is_none());
}
