//! Branch listing and current-branch resolution

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::git_command;
use crate::error::{DiffscopeError, Result};

/// Prefix git uses for remote-tracking refs in `git branch --all` output
const REMOTE_PREFIX: &str = "remotes/";

/// A single entry of `git branch --list --all`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitBranch {
    /// Ref name with the `remotes/` prefix stripped
    pub name: String,
    /// Whether this is the checked-out branch (`* ` marker)
    pub is_current: bool,
    pub is_remote: bool,
    /// Remote name, derived from the second path segment of the raw ref
    pub remote: Option<String>,
    /// Target of a symbolic ref like `remotes/origin/HEAD -> origin/main`
    pub points_to: Option<String>,
}

/// Parse the output of `git branch --list --all --no-color`.
pub fn parse_branches(output: &str) -> Vec<GitBranch> {
    let mut branches = Vec::new();

    for raw in output.lines() {
        let mut line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let is_current = line.starts_with('*');
        if is_current {
            line = line[1..].trim_start();
        }

        // Symbolic refs carry an arrow to their target
        let (name_part, points_to) = match line.split_once("->") {
            Some((name, target)) => (name.trim(), Some(target.trim().to_string())),
            None => (line, None),
        };

        let is_remote = name_part.starts_with(REMOTE_PREFIX);
        let remote = if is_remote {
            name_part.split('/').nth(1).map(str::to_string)
        } else {
            None
        };
        let name = name_part
            .strip_prefix(REMOTE_PREFIX)
            .unwrap_or(name_part)
            .to_string();

        branches.push(GitBranch {
            name,
            is_current,
            is_remote,
            remote,
            points_to,
        });
    }

    branches
}

/// Run `git branch --list --all` and parse its output.
pub async fn list_branches(repo: &Path) -> Result<Vec<GitBranch>> {
    let output = git_command(repo, &["branch", "--list", "--all", "--no-color"]).await?;
    Ok(parse_branches(&output))
}

/// Resolve the currently checked-out branch of `repo`.
pub async fn get_current_branch(repo: &Path) -> Result<GitBranch> {
    list_branches(repo)
        .await?
        .into_iter()
        .find(|b| b.is_current)
        .ok_or_else(|| DiffscopeError::Git {
            message: format!("failed to get current branch for repo {}", repo.display()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_current_branch() {
        let branches = parse_branches("* main\n  feature\n");
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].name, "main");
        assert!(branches[0].is_current);
        assert!(!branches[0].is_remote);
        assert!(!branches[1].is_current);
        assert_eq!(branches[1].name, "feature");
    }

    #[test]
    fn test_current_marker_absent_from_name() {
        for branch in parse_branches("* main\n* remotes/origin/main\n") {
            assert!(branch.is_current);
            assert!(!branch.name.starts_with("* "));
        }
    }

    #[test]
    fn test_parse_remote_branch() {
        let branches = parse_branches("  remotes/origin/feature\n");
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].name, "origin/feature");
        assert!(branches[0].is_remote);
        assert_eq!(branches[0].remote.as_deref(), Some("origin"));
        assert_eq!(branches[0].points_to, None);
    }

    #[test]
    fn test_parse_symbolic_ref() {
        let branches = parse_branches("  remotes/origin/HEAD -> origin/main\n");
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].name, "origin/HEAD");
        assert!(branches[0].is_remote);
        assert_eq!(branches[0].remote.as_deref(), Some("origin"));
        assert_eq!(branches[0].points_to.as_deref(), Some("origin/main"));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let branches = parse_branches("\n  main\n\n");
        assert_eq!(branches.len(), 1);
    }

    #[test]
    fn test_branch_roundtrip() {
        let branches = parse_branches("* main\n  remotes/origin/HEAD -> origin/main\n");
        let json = serde_json::to_string(&branches).unwrap();
        let reparsed: Vec<GitBranch> = serde_json::from_str(&json).unwrap();
        assert_eq!(branches, reparsed);
    }
}
