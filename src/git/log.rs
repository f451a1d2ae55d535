//! Commit log retrieval and parsing

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::git_command;
use crate::error::{DiffscopeError, Result};

// Private separator tokens unlikely to occur in commit text. Records are
// delimited by RECORD_SEP, the five fields within a record by FIELD_SEP.
const RECORD_SEP: &str = "<<<><<>>>";
const FIELD_SEP: &str = "><><><<>>";

/// A single log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub short_hash: String,
    pub summary: String,
    pub body: String,
    pub author: String,
    pub date: DateTime<FixedOffset>,
}

/// Parse the output of `git log` in diffscope's private record format.
///
/// A record that does not split into exactly five fields is a hard error.
pub fn parse_log(output: &str) -> Result<Vec<Commit>> {
    let mut commits = Vec::new();

    for record in output.trim().split(RECORD_SEP) {
        if record.is_empty() {
            continue;
        }

        let fields: Vec<&str> = record.split(FIELD_SEP).collect();
        let [short_hash, author, date, summary, body] = fields[..] else {
            return Err(DiffscopeError::Parse {
                message: format!(
                    "malformed log record: expected 5 fields, got {}",
                    fields.len()
                ),
            });
        };

        let date =
            DateTime::parse_from_rfc3339(date.trim()).map_err(|e| DiffscopeError::Parse {
                message: format!("invalid commit date {:?}: {}", date.trim(), e),
            })?;

        commits.push(Commit {
            short_hash: short_hash.trim().to_string(),
            author: author.trim().to_string(),
            date,
            summary: summary.trim().to_string(),
            body: body.trim().to_string(),
        });
    }

    Ok(commits)
}

/// Run `git log` for at most `max_count` entries and parse the output.
///
/// With `branch = None` the log starts at HEAD.
pub async fn get_log(repo: &Path, branch: Option<&str>, max_count: u32) -> Result<Vec<Commit>> {
    let format = format!(
        "--pretty=format:{RECORD_SEP}%h{FIELD_SEP}%an{FIELD_SEP}%ad{FIELD_SEP}%s{FIELD_SEP}%b"
    );
    let max = format!("--max-count={max_count}");

    let mut args = vec!["log", max.as_str(), format.as_str(), "--date=iso-strict"];
    if let Some(branch) = branch {
        args.push(branch);
    }

    let output = git_command(repo, &args).await?;
    parse_log(&output)
}
