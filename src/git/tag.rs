//! Tag listing

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::git_command;
use crate::error::Result;

/// A single entry of `git tag --list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitTag {
    pub name: String,
    pub message: Option<String>,
}

/// Parse the output of `git tag --list`.
///
/// Each non-blank line is split on the first run of whitespace into a name
/// and an optional trailing message.
pub fn parse_tags(output: &str) -> Vec<GitTag> {
    let mut tags = Vec::new();

    for raw in output.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let (name, message) = match line.find(char::is_whitespace) {
            Some(idx) => {
                let message = line[idx..].trim_start();
                (
                    line[..idx].to_string(),
                    (!message.is_empty()).then(|| message.to_string()),
                )
            }
            None => (line.to_string(), None),
        };

        tags.push(GitTag { name, message });
    }

    tags
}

/// Run `git tag --list` and parse its output.
pub async fn list_tags(repo: &Path) -> Result<Vec<GitTag>> {
    let output = git_command(repo, &["tag", "--list", "--no-color"]).await?;
    Ok(parse_tags(&output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_only() {
        let tags = parse_tags("v1.0.0\nv1.1.0\n");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "v1.0.0");
        assert_eq!(tags[0].message, None);
    }

    #[test]
    fn test_parse_name_with_message() {
        let tags = parse_tags("v2.0.0    second major release\n");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "v2.0.0");
        assert_eq!(tags[0].message.as_deref(), Some("second major release"));
    }

    #[test]
    fn test_blank_lines_skipped() {
        assert!(parse_tags("\n\n").is_empty());
    }
}
