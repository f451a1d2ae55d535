//! Unified diff retrieval and parsing

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{git_command, GitFlags};
use crate::error::{DiffscopeError, Result};

static HUNK_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))?").unwrap());

/// How a file changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileChangeType {
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
}

impl FileChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Deleted => "deleted",
            Self::Modified => "modified",
            Self::Renamed => "renamed",
            Self::Copied => "copied",
        }
    }
}

/// One `@@` region of a unified diff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffHunk {
    pub header: String,
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    /// Raw content lines, each prefixed `+`, `-` or space
    pub content: Vec<String>,
    pub added_lines: u32,
    pub removed_lines: u32,
}

/// All hunks of a single file within a diff
///
/// Renames and copies are not distinguished at this layer; the patch stream
/// only carries explicit markers for added and deleted files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffFile {
    pub file_path: String,
    pub change_type: FileChangeType,
    pub hunks: Vec<DiffHunk>,
}

/// A full parsed diff between two endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitDiff {
    pub from_commit: String,
    pub to_commit: String,
    /// Files in order of first appearance in the raw stream
    pub files: Vec<DiffFile>,
}

/// Extract line ranges from a hunk header like `@@ -10,7 +12,9 @@`.
///
/// Omitted counts default to 1.
pub fn parse_hunk_header(header: &str) -> Result<(u32, u32, u32, u32)> {
    let caps = HUNK_HEADER
        .captures(header)
        .ok_or_else(|| DiffscopeError::Parse {
            message: format!("invalid hunk header: {}", header),
        })?;

    let num = |i: usize, default: u32| {
        caps.get(i)
            .map(|m| m.as_str().parse().unwrap_or(default))
            .unwrap_or(default)
    };

    Ok((num(1, 0), num(2, 1), num(3, 0), num(4, 1)))
}

/// Fold the lines of raw `git diff --patch` output into file/hunk records.
///
/// The single-commit variant (`git show --pretty=format:`) produces the
/// same textual body and is parsed by this function too.
pub fn parse_unified_diff(output: &str) -> Result<Vec<DiffFile>> {
    let mut files: Vec<DiffFile> = Vec::new();
    let mut current_file: Option<DiffFile> = None;
    let mut current_hunk: Option<DiffHunk> = None;

    for line in output.lines() {
        if line.starts_with("diff --git") {
            if let Some(file) = current_file.as_mut() {
                if let Some(hunk) = current_hunk.take() {
                    file.hunks.push(hunk);
                }
            }
            if let Some(file) = current_file.take() {
                files.push(file);
            }
            current_file = Some(DiffFile {
                file_path: String::new(),
                change_type: FileChangeType::Modified,
                hunks: Vec::new(),
            });
            current_hunk = None;
        } else if line.starts_with("new file mode") {
            if let Some(file) = current_file.as_mut() {
                file.change_type = FileChangeType::Added;
            }
        } else if line.starts_with("deleted file mode") {
            if let Some(file) = current_file.as_mut() {
                file.change_type = FileChangeType::Deleted;
            }
        } else if line.starts_with("--- ") || line.starts_with("+++ ") {
            // Path is set at most once per file, preferring the +++ b/ form.
            // `--- /dev/null` and `+++ /dev/null` match neither prefix.
            if let Some(file) = current_file.as_mut() {
                if file.file_path.is_empty() {
                    if let Some(path) = line
                        .strip_prefix("+++ b/")
                        .or_else(|| line.strip_prefix("--- a/"))
                    {
                        file.file_path = path.to_string();
                    }
                }
            }
        } else if line.starts_with("@@") {
            let finished = current_hunk.take();
            if let (Some(file), Some(hunk)) = (current_file.as_mut(), finished) {
                file.hunks.push(hunk);
            }
            let header = line.trim();
            let (old_start, old_count, new_start, new_count) = parse_hunk_header(header)?;
            current_hunk = Some(DiffHunk {
                header: header.to_string(),
                old_start,
                old_count,
                new_start,
                new_count,
                content: Vec::new(),
                added_lines: 0,
                removed_lines: 0,
            });
        } else if let Some(hunk) = current_hunk.as_mut() {
            hunk.content.push(line.to_string());
            if line.starts_with('+') && !line.starts_with("+++") {
                hunk.added_lines += 1;
            } else if line.starts_with('-') && !line.starts_with("---") {
                hunk.removed_lines += 1;
            }
        }
    }

    if let Some(file) = current_file.as_mut() {
        if let Some(hunk) = current_hunk.take() {
            file.hunks.push(hunk);
        }
    }
    if let Some(file) = current_file.take() {
        files.push(file);
    }

    Ok(files)
}

fn diff_option_args(flags: &GitFlags) -> (String, String) {
    (
        format!("--unified={}", flags.context_lines),
        format!("--diff-algorithm={}", flags.diff_algo.as_str()),
    )
}

/// Run `git diff` between two endpoints and return the parsed output.
pub async fn get_diff(
    repo: &Path,
    commit_a: &str,
    commit_b: &str,
    flags: &GitFlags,
    paths: Option<&[String]>,
) -> Result<GitDiff> {
    let (unified, algo) = diff_option_args(flags);

    let mut args = vec![
        "diff",
        "--patch",
        "--no-color",
        "--find-renames",
        "--find-copies",
        unified.as_str(),
        algo.as_str(),
    ];
    if flags.ignore_all_space {
        args.push("--ignore-all-space");
    }
    args.push(commit_a);
    args.push(commit_b);
    if let Some(paths) = paths {
        if !paths.is_empty() {
            args.push("--");
            args.extend(paths.iter().map(String::as_str));
        }
    }

    let output = git_command(repo, &args).await?;
    Ok(GitDiff {
        from_commit: commit_a.to_string(),
        to_commit: commit_b.to_string(),
        files: parse_unified_diff(&output)?,
    })
}

/// Run `git show` on a single commit and return the parsed diff against
/// its implicit parent. `--pretty=format:` drops the commit metadata so the
/// body is a plain unified diff.
pub async fn get_commit_diff(
    repo: &Path,
    commit: &str,
    flags: &GitFlags,
    paths: Option<&[String]>,
) -> Result<GitDiff> {
    let (unified, algo) = diff_option_args(flags);

    let mut args = vec![
        "show",
        "--patch",
        "--no-color",
        "--find-renames",
        "--find-copies",
        unified.as_str(),
        algo.as_str(),
        "--pretty=format:",
    ];
    if flags.ignore_all_space {
        args.push("--ignore-all-space");
    }
    args.push(commit);
    if let Some(paths) = paths {
        if !paths.is_empty() {
            args.push("--");
            args.extend(paths.iter().map(String::as_str));
        }
    }

    let output = git_command(repo, &args).await?;
    Ok(GitDiff {
        from_commit: commit.to_string(),
        to_commit: commit.to_string(),
        files: parse_unified_diff(&output)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hunk_header_full() {
        let (os, oc, ns, nc) = parse_hunk_header("@@ -10,7 +12,9 @@").unwrap();
        assert_eq!((os, oc, ns, nc), (10, 7, 12, 9));
    }

    #[test]
    fn test_hunk_header_default_counts() {
        let (os, oc, ns, nc) = parse_hunk_header("@@ -1 +1,2 @@").unwrap();
        assert_eq!((os, oc, ns, nc), (1, 1, 1, 2));

        let (os, oc, ns, nc) = parse_hunk_header("@@ -5,3 +7 @@").unwrap();
        assert_eq!((os, oc, ns, nc), (5, 3, 7, 1));
    }

    #[test]
    fn test_hunk_header_with_context() {
        let (os, _, ns, _) = parse_hunk_header("@@ -10,7 +12,9 @@ fn main() {").unwrap();
        assert_eq!((os, ns), (10, 12));
    }

    #[test]
    fn test_invalid_hunk_header() {
        let err = parse_hunk_header("@@ broken @@").unwrap_err();
        assert!(err.to_string().contains("invalid hunk header"));
    }

    const SAMPLE_DIFF: &str = "\
diff --git a/src/lib.rs b/src/lib.rs
index 1111111..2222222 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,4 +1,5 @@
 fn existing() {}
-fn removed() {}
+fn replaced() {}
+fn added() {}
 // trailing context
diff --git a/new.txt b/new.txt
new file mode 100644
index 0000000..3333333
--- /dev/null
+++ b/new.txt
@@ -0,0 +1,2 @@
+hello
+world
diff --git a/gone.txt b/gone.txt
deleted file mode 100644
index 4444444..0000000
--- a/gone.txt
+++ /dev/null
@@ -1 +0,0 @@
-goodbye
";

    #[test]
    fn test_parse_unified_diff_files_in_order() {
        let files = parse_unified_diff(SAMPLE_DIFF).unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(files[0].file_path, "src/lib.rs");
        assert_eq!(files[1].file_path, "new.txt");
        assert_eq!(files[2].file_path, "gone.txt");
    }

    #[test]
    fn test_parse_unified_diff_change_types() {
        let files = parse_unified_diff(SAMPLE_DIFF).unwrap();
        assert_eq!(files[0].change_type, FileChangeType::Modified);
        assert_eq!(files[1].change_type, FileChangeType::Added);
        assert_eq!(files[2].change_type, FileChangeType::Deleted);
    }

    #[test]
    fn test_parse_unified_diff_line_counts() {
        let files = parse_unified_diff(SAMPLE_DIFF).unwrap();

        // file markers (---/+++) must not count as added/removed lines
        let hunk = &files[0].hunks[0];
        assert_eq!(hunk.added_lines, 2);
        assert_eq!(hunk.removed_lines, 1);
        assert_eq!(hunk.content.len(), 5);

        assert_eq!(files[1].hunks[0].added_lines, 2);
        assert_eq!(files[1].hunks[0].removed_lines, 0);
        assert_eq!(files[2].hunks[0].removed_lines, 1);
    }

    #[test]
    fn test_deleted_file_path_from_minus_marker() {
        // With +++ pointing at /dev/null, the path comes from --- a/
        let files = parse_unified_diff(SAMPLE_DIFF).unwrap();
        assert_eq!(files[2].file_path, "gone.txt");
    }

    #[test]
    fn test_parse_empty_diff() {
        assert!(parse_unified_diff("").unwrap().is_empty());
    }

    #[test]
    fn test_diff_roundtrip() {
        let diff = GitDiff {
            from_commit: "abc".to_string(),
            to_commit: "def".to_string(),
            files: parse_unified_diff(SAMPLE_DIFF).unwrap(),
        };
        let json = serde_json::to_string(&diff).unwrap();
        let reparsed: GitDiff = serde_json::from_str(&json).unwrap();
        assert_eq!(diff, reparsed);
    }
}
