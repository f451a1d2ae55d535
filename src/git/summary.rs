//! Compact change summaries (`git diff --compact-summary`)

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{git_command, FileChangeType};
use crate::error::Result;

/// A per-file entry of a compact summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    /// Prior path for renames and copies
    pub old_path: Option<String>,
    pub change_type: FileChangeType,
    pub is_binary: bool,
    pub additions: Option<u32>,
    pub deletions: Option<u32>,
    pub changes: Option<u32>,
}

/// Aggregated compact summary for an endpoint pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitDiffSummary {
    pub commit_a: String,
    pub commit_b: String,
    pub files: Vec<FileChange>,
    pub total_files_changed: usize,
    pub total_additions: u32,
    pub total_deletions: u32,
}

/// Parse a single line of `git diff --compact-summary` output.
///
/// Lines without a `|` (including the trailing totals line) yield `None`.
///
/// Examples of accepted input:
/// ```text
///  file.txt | 10 +++++-----
///  new_file.py (new) | 25 +++++++++++++++++++++++++
///  old_file.txt (gone) | 5 -----
///  renamed.txt => new_name.txt | 0
///  file.bin | Bin 0 -> 1024 bytes
/// ```
pub fn parse_compact_summary_line(line: &str) -> Option<FileChange> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (file_part, changes_part) = line.split_once('|')?;
    let file_part = file_part.trim();
    let changes_part = changes_part.trim();

    let (path, old_path, change_type) = if let Some((old, new)) = file_part.split_once(" => ") {
        (
            new.trim().to_string(),
            Some(old.trim().to_string()),
            FileChangeType::Renamed,
        )
    } else if let Some(stripped) = file_part.strip_suffix(" (new)") {
        (stripped.trim().to_string(), None, FileChangeType::Added)
    } else if let Some(stripped) = file_part.strip_suffix(" (gone)") {
        (stripped.trim().to_string(), None, FileChangeType::Deleted)
    } else {
        (file_part.to_string(), None, FileChangeType::Modified)
    };

    let mut change = FileChange {
        path,
        old_path,
        change_type,
        is_binary: false,
        additions: None,
        deletions: None,
        changes: None,
    };

    if changes_part.starts_with("Bin") {
        // Byte counts after "Bin" are not retained
        change.is_binary = true;
    } else if let Some(total) = changes_part.split_whitespace().next() {
        // A non-numeric total leaves all counts unset without failing
        if let Ok(total) = total.parse::<u32>() {
            change.changes = Some(total);
            change.additions = Some(changes_part.matches('+').count() as u32);
            change.deletions = Some(changes_part.matches('-').count() as u32);
        }
    }

    Some(change)
}

/// Parse full `git diff --compact-summary` output.
pub fn parse_compact_summary(output: &str) -> Vec<FileChange> {
    output.lines().filter_map(parse_compact_summary_line).collect()
}

/// Run `git diff --compact-summary` and aggregate the parsed output.
///
/// With `commit_b = None` the single endpoint is compared against its
/// implicit parent (`a^ -> a`).
pub async fn get_compact_summary(
    repo: &Path,
    commit_a: &str,
    commit_b: Option<&str>,
) -> Result<GitDiffSummary> {
    let (commit_a, commit_b) = match commit_b {
        Some(b) => (commit_a.to_string(), b.to_string()),
        None => (format!("{commit_a}^"), commit_a.to_string()),
    };

    let output = git_command(
        repo,
        &["diff", "--compact-summary", &commit_a, &commit_b],
    )
    .await?;

    let files = parse_compact_summary(&output);
    let total_additions = files.iter().filter_map(|f| f.additions).sum();
    let total_deletions = files.iter().filter_map(|f| f.deletions).sum();

    Ok(GitDiffSummary {
        commit_a,
        commit_b,
        total_files_changed: files.len(),
        total_additions,
        total_deletions,
        files,
    })
}
