//! diffscope: browse git history and diffs through a live WebSocket view
//!
//! The daemon discovers git repositories below a root directory at startup
//! and serves a bidirectional message stream per client. Clients navigate
//! by sending commands (select a repo or branch, pin comparison endpoints,
//! expand file paths, tweak diff options); the server reacts by running git
//! subcommands, parsing their raw output into structured entities and
//! pushing the results back as batched, ordered events.
//!
//! Two subsystems do the work:
//!
//! - [`git`]: a subprocess gateway plus pure text parsers for branch
//!   listings, tag listings, commit logs, unified diffs and compact change
//!   summaries.
//! - [`server`]: the per-connection session engine with debounced change
//!   detection, the wire protocol and the outbound batcher.

pub mod error;
pub mod git;
pub mod server;

// Re-export commonly used types
pub use error::{DiffscopeError, Result};
pub use git::{
    Commit, DiffAlgorithm, DiffFile, DiffHunk, FileChange, FileChangeType, GitBranch, GitDiff,
    GitDiffSummary, GitFlags, GitTag,
};
pub use server::{ClientMessage, ConnectionRegistry, ServerMessage, SessionEngine, SessionState};
