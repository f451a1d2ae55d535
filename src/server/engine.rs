//! Session engine: command dispatch and debounced recomputation
//!
//! The engine owns one connection's [`SessionState`]. Inbound commands
//! mutate the state and raise a change signal; a watcher coalesces bursts
//! of signals into a single recomputation pass that pushes refreshed data
//! to the outbound queue.

use std::path::Path;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{mpsc, Mutex, Notify};

use crate::error::{DiffscopeError, Result};
use crate::git::{
    get_commit_diff, get_compact_summary, get_current_branch, get_diff, get_log, list_branches,
    list_tags,
};
use crate::server::protocol::{ClientMessage, ServerMessage};
use crate::server::session::SessionState;

/// Window opened by the first change signal; mutations landing inside it
/// collapse into one recomputation pass
pub const DEBOUNCE_INTERVAL: Duration = Duration::from_millis(100);

/// Tags pushed per repository selection
const MAX_TAGS: usize = 50;

/// State machine for one connection
pub struct SessionEngine {
    state: Mutex<SessionState>,
    changed: Notify,
    events: mpsc::Sender<ServerMessage>,
}

impl SessionEngine {
    pub fn new(events: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            changed: Notify::new(),
            events,
        }
    }

    /// Snapshot of the current session state.
    pub async fn state(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// Apply one inbound command in arrival order.
    pub async fn handle_command(&self, msg: ClientMessage) -> Result<()> {
        match msg {
            ClientMessage::Heartbeat { .. } => {}
            ClientMessage::SetCommitA { commit } => {
                self.state.lock().await.commit_a = Some(commit);
                self.changed.notify_one();
            }
            ClientMessage::ResetCommitA => {
                self.state.lock().await.commit_a = None;
                self.changed.notify_one();
            }
            ClientMessage::SetCommitB { commit } => {
                self.state.lock().await.commit_b = Some(commit);
                self.changed.notify_one();
            }
            ClientMessage::ResetCommitB => {
                self.state.lock().await.commit_b = None;
                self.changed.notify_one();
            }
            ClientMessage::SwapCommits => {
                {
                    let mut state = self.state.lock().await;
                    let a = state.commit_a.take();
                    state.commit_a = state.commit_b.take();
                    state.commit_b = a;
                }
                self.changed.notify_one();
            }
            ClientMessage::ContextInc => {
                self.state.lock().await.git_flags.context_lines += 1;
                self.changed.notify_one();
            }
            ClientMessage::ContextDec => {
                let mut state = self.state.lock().await;
                if state.git_flags.context_lines > 0 {
                    state.git_flags.context_lines -= 1;
                    drop(state);
                    self.changed.notify_one();
                }
            }
            ClientMessage::ContextReset => {
                let mut state = self.state.lock().await;
                if state.git_flags.context_lines != 3 {
                    state.git_flags.context_lines = 3;
                    drop(state);
                    self.changed.notify_one();
                }
            }
            ClientMessage::IgnoreAllSpace { value } => {
                self.state.lock().await.git_flags.ignore_all_space = value;
                self.changed.notify_one();
            }
            ClientMessage::GetDiff { paths } => {
                // Explicit requests bypass the debounce path entirely.
                // Without explicit paths the diff covers the open set, or
                // everything when nothing is expanded.
                let state = self.state().await;
                match paths {
                    Some(paths) => self.push_diff(Some(&paths), true, &state).await?,
                    None if !state.open_paths.is_empty() => {
                        let open = state.open_paths.clone();
                        self.push_diff(Some(&open), false, &state).await?;
                    }
                    None => self.push_diff(None, false, &state).await?,
                }
            }
            ClientMessage::RepoSelect { repo } => self.select_repo(repo).await?,
            ClientMessage::BranchSelect { branch } => self.select_branch(branch).await?,
            ClientMessage::OpenPath { path } => {
                self.state.lock().await.open_path(path);
                self.changed.notify_one();
            }
            ClientMessage::ClosePath { path } => {
                if self.state.lock().await.close_path(&path) {
                    self.changed.notify_one();
                }
            }
            ClientMessage::SetOpenPaths { paths } => {
                self.state.lock().await.open_paths = paths;
                self.changed.notify_one();
            }
            ClientMessage::Ping | ClientMessage::Pong => {
                tracing::warn!("unhandled client message: {:?}", msg);
            }
        }

        Ok(())
    }

    /// Debounced recomputation loop; runs for the connection's lifetime.
    ///
    /// The first change signal opens a window of [`DEBOUNCE_INTERVAL`];
    /// every further mutation landing inside it is absorbed into the same
    /// pass, so a burst of commands yields one recomputation over the final
    /// state. Each pass echoes the session state, then refreshes the
    /// summary and any expanded diffs if repo, branch or an endpoint
    /// changed, or pushes a diff for newly expanded paths only if nothing
    /// else did.
    pub async fn watch_changes(&self) -> Result<()> {
        loop {
            let prev = self.state().await;
            self.changed.notified().await;
            tokio::time::sleep(DEBOUNCE_INTERVAL).await;
            // Consume the permit of any signal raised while the window was
            // open; its mutation is already in the snapshot below.
            let _ = self.changed.notified().now_or_never();

            let state = self.state().await;
            self.push(ServerMessage::SessionState {
                state: state.clone(),
            })
            .await?;

            if state.targets_changed(&prev) {
                self.push_summary(&state).await?;
                if !state.open_paths.is_empty() {
                    let open = state.open_paths.clone();
                    self.push_diff(Some(&open), false, &state).await?;
                }
            } else {
                let new_paths = state.newly_opened(&prev);
                if !new_paths.is_empty() {
                    self.push_diff(Some(&new_paths), true, &state).await?;
                }
            }
        }
    }

    async fn select_repo(&self, repo: String) -> Result<()> {
        {
            let state = self.state.lock().await;
            if state.repo.as_deref() == Some(repo.as_str()) {
                return Ok(());
            }
        }

        let current = get_current_branch(Path::new(&repo)).await?;
        {
            let mut state = self.state.lock().await;
            state.commit_a = None;
            state.commit_b = None;
            state.repo = Some(repo.clone());
            state.branch = Some(current.name);
        }

        self.push_repo_data(Path::new(&repo)).await?;
        self.changed.notify_one();
        Ok(())
    }

    async fn select_branch(&self, branch: String) -> Result<()> {
        let (repo, max_count) = {
            let mut state = self.state.lock().await;
            if state.branch.as_deref() == Some(branch.as_str()) {
                return Ok(());
            }
            state.branch = Some(branch.clone());
            (state.repo.clone(), state.git_flags.max_count)
        };

        if let Some(repo) = repo {
            let commits = get_log(Path::new(&repo), Some(&branch), max_count).await?;
            self.push(ServerMessage::Commits { commits }).await?;
        }
        self.changed.notify_one();
        Ok(())
    }

    /// Push branch list, tag list and recent commits for a freshly selected
    /// repository, followed by a session-state echo.
    async fn push_repo_data(&self, repo: &Path) -> Result<()> {
        let max_count = self.state.lock().await.git_flags.max_count;

        let branches = list_branches(repo).await?;
        let mut tags = list_tags(repo).await?;
        tags.truncate(MAX_TAGS);
        let commits = get_log(repo, None, max_count).await?;

        self.push(ServerMessage::Branches { branches }).await?;
        self.push(ServerMessage::Tags { tags }).await?;
        self.push(ServerMessage::Commits { commits }).await?;

        let state = self.state().await;
        self.push(ServerMessage::SessionState { state }).await?;
        Ok(())
    }

    /// Push a compact summary for the current endpoints, if any.
    async fn push_summary(&self, state: &SessionState) -> Result<()> {
        let Some(repo) = &state.repo else {
            return Ok(());
        };

        let summary = match (&state.commit_a, &state.commit_b) {
            (Some(a), Some(b)) => get_compact_summary(Path::new(repo), a, Some(b)).await?,
            (Some(a), None) => get_compact_summary(Path::new(repo), a, None).await?,
            _ => return Ok(()),
        };

        self.push(ServerMessage::DiffSummary { summary }).await
    }

    /// Push a full diff for the current endpoints, if any. Both endpoints
    /// give a range diff; a lone first endpoint diffs a single commit
    /// against its implicit parent.
    async fn push_diff(
        &self,
        paths: Option<&[String]>,
        partial: bool,
        state: &SessionState,
    ) -> Result<()> {
        let Some(repo) = &state.repo else {
            return Ok(());
        };

        let diff = match (&state.commit_a, &state.commit_b) {
            (Some(a), Some(b)) => {
                get_diff(Path::new(repo), a, b, &state.git_flags, paths).await?
            }
            (Some(a), None) => {
                get_commit_diff(Path::new(repo), a, &state.git_flags, paths).await?
            }
            _ => return Ok(()),
        };

        self.push(ServerMessage::Diff { diff, partial }).await
    }

    async fn push(&self, msg: ServerMessage) -> Result<()> {
        self.events
            .send(msg)
            .await
            .map_err(|_| DiffscopeError::ChannelClosed)
    }
}
