//! Git gateway and raw-output parsers
//!
//! Every query goes through a `git` subprocess and a pure text parser, so
//! the daemon works against any repository the installed git can read. The
//! parsers are stateless functions from raw stdout to structured values and
//! are unit-tested without a repository.

mod branch;
mod diff;
mod discover;
mod log;
mod summary;
mod tag;

pub use branch::{get_current_branch, list_branches, parse_branches, GitBranch};
pub use diff::{
    get_commit_diff, get_diff, parse_hunk_header, parse_unified_diff, DiffFile, DiffHunk,
    FileChangeType, GitDiff,
};
pub use discover::find_git_repos;
pub use log::{get_log, parse_log, Commit};
pub use summary::{
    get_compact_summary, parse_compact_summary, parse_compact_summary_line, FileChange,
    GitDiffSummary,
};
pub use tag::{list_tags, parse_tags, GitTag};

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::{DiffscopeError, Result};

/// Diff algorithm passed to `git diff --diff-algorithm`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAlgorithm {
    #[default]
    Myers,
    Minimal,
    Patience,
    Histogram,
}

impl DiffAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Myers => "myers",
            Self::Minimal => "minimal",
            Self::Patience => "patience",
            Self::Histogram => "histogram",
        }
    }
}

/// Per-session options applied to git queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitFlags {
    /// Maximum number of log entries fetched per push
    pub max_count: u32,
    /// Context lines around each hunk (`--unified`)
    pub context_lines: u32,
    pub diff_algo: DiffAlgorithm,
    pub ignore_all_space: bool,
}

impl Default for GitFlags {
    fn default() -> Self {
        Self {
            max_count: 25,
            context_lines: 3,
            diff_algo: DiffAlgorithm::Myers,
            ignore_all_space: false,
        }
    }
}

/// Run a git subcommand in `repo` and return raw stdout.
///
/// A non-zero exit status is an error carrying trimmed stderr as detail.
/// Stdout is returned untrimmed; leading whitespace is significant for
/// compact-summary output.
pub async fn git_command(repo: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .await
        .map_err(|e| DiffscopeError::Git {
            message: format!("failed to execute git: {}", e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DiffscopeError::Git {
            message: format!("git {} failed: {}", args.join(" "), stderr.trim()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
