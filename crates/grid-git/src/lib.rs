//! Committed-version loader: extracts the git HEAD copy of a workbook.
//!
//! Shells out to the `git` binary (`rev-parse`, `ls-files --error-unmatch`,
//! `cat-file blob`) rather than linking a git library, and parses the blob
//! bytes with `grid-xlsx`. "No committed version exists" (untracked file,
//! unborn HEAD, file not in HEAD) is a first-class `Ok(None)`, not an error:
//! the diff engine treats a missing snapshot as an empty workbook.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use grid_model::Workbook;
use grid_xlsx::XlsxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to run git (is git installed?): {0}")]
    Spawn(#[source] std::io::Error),
    #[error("{path} is not inside a git repository: {stderr}")]
    NotARepository { path: PathBuf, stderr: String },
    #[error("{path} is outside the repository root {root}")]
    OutsideRepository { path: PathBuf, root: PathBuf },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse committed workbook: {0}")]
    Workbook(#[from] XlsxError),
}

/// Load the committed (HEAD) version of the workbook at `path`.
///
/// Returns `Ok(None)` when the repository has no committed version of the
/// file; fails only when git itself is unusable or the blob is not a valid
/// workbook.
pub fn committed_workbook(path: &Path) -> Result<Option<Workbook>, GitError> {
    let file = std::fs::canonicalize(path)?;
    let dir = file.parent().unwrap_or_else(|| Path::new("."));

    let output = git(dir, &["rev-parse", "--show-toplevel"])?;
    if !output.status.success() {
        return Err(GitError::NotARepository {
            path: file,
            stderr: stderr_text(&output),
        });
    }
    let toplevel = std::fs::canonicalize(stdout_text(&output).trim())?;

    let relative = file
        .strip_prefix(&toplevel)
        .map_err(|_| GitError::OutsideRepository {
            path: file.clone(),
            root: toplevel.clone(),
        })?;
    let relative = relative.to_string_lossy().replace('\\', "/");

    let tracked = git(&toplevel, &["ls-files", "--error-unmatch", "--", &relative])?;
    if !tracked.status.success() {
        return Ok(None);
    }

    let blob = git(&toplevel, &["cat-file", "blob", &format!("HEAD:{relative}")])?;
    if !blob.status.success() {
        // Tracked but not yet in any commit (staged only, or unborn HEAD).
        return Ok(None);
    }

    Ok(Some(grid_xlsx::read_workbook_from_bytes(&blob.stdout)?))
}

fn git(dir: &Path, args: &[&str]) -> Result<Output, GitError> {
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(GitError::Spawn)
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}
