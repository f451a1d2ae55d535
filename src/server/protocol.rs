//! Wire protocol message types
//!
//! Both directions use JSON with a `type` discriminant in kebab-case.
//! Clients send exactly one command object per text frame; the server sends
//! a JSON array of one or more event objects per text frame (the batcher's
//! flush unit).

use serde::{Deserialize, Serialize};

use crate::error::{DiffscopeError, Result};
use crate::git::{Commit, GitBranch, GitDiff, GitDiffSummary, GitTag};
use crate::server::session::SessionState;

/// Client-to-server command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    Ping,
    Pong,
    Heartbeat {
        timestamp: i64,
    },
    SetCommitA {
        commit: String,
    },
    ResetCommitA,
    SetCommitB {
        commit: String,
    },
    ResetCommitB,
    SwapCommits,
    ContextInc,
    ContextDec,
    ContextReset,
    IgnoreAllSpace {
        value: bool,
    },
    RepoSelect {
        repo: String,
    },
    /// Request an immediate diff, optionally scoped to explicit paths
    GetDiff {
        #[serde(default)]
        paths: Option<Vec<String>>,
    },
    BranchSelect {
        branch: String,
    },
    OpenPath {
        path: String,
    },
    ClosePath {
        path: String,
    },
    SetOpenPaths {
        paths: Vec<String>,
    },
}

/// Server-to-client event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    SessionState {
        state: SessionState,
    },
    Repos {
        repos: Vec<String>,
    },
    Branches {
        branches: Vec<GitBranch>,
    },
    Tags {
        tags: Vec<GitTag>,
    },
    Commits {
        commits: Vec<Commit>,
    },
    /// `partial` is true when the diff is scoped to a subset of the view
    /// rather than the full open set
    Diff {
        diff: GitDiff,
        partial: bool,
    },
    DiffSummary {
        summary: GitDiffSummary,
    },
    Ping,
    Pong,
    Heartbeat {
        timestamp: i64,
    },
}

/// Decode one inbound text frame into a command.
///
/// A payload matching no known shape is a decode error, which is fatal to
/// the connection.
pub fn decode_client_message(text: &str) -> Result<ClientMessage> {
    serde_json::from_str(text).map_err(|e| DiffscopeError::Decode {
        message: format!("{}: {}", e, text),
    })
}
