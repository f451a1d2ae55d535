//! Per-connection navigation state

use serde::{Deserialize, Serialize};

use crate::git::GitFlags;

/// Everything a connection has selected so far.
///
/// Created when the connection opens, mutated only by that connection's
/// engine, discarded on close. There is no state beyond which optional
/// fields are populated: no repo means nothing else is meaningful, a single
/// endpoint means "commit against its parent", two endpoints mean a range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub commit_a: Option<String>,
    pub commit_b: Option<String>,
    /// Files expanded to full diff view, in insertion order
    pub open_paths: Vec<String>,
    pub git_flags: GitFlags,
}

impl SessionState {
    /// Expand a path; a no-op if already expanded.
    pub fn open_path(&mut self, path: String) {
        if !self.open_paths.contains(&path) {
            self.open_paths.push(path);
        }
    }

    /// Collapse a path, returning whether it was expanded.
    pub fn close_path(&mut self, path: &str) -> bool {
        match self.open_paths.iter().position(|p| p == path) {
            Some(idx) => {
                self.open_paths.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Whether repo, branch or either endpoint differs from `prev`.
    pub fn targets_changed(&self, prev: &SessionState) -> bool {
        self.repo != prev.repo
            || self.branch != prev.branch
            || self.commit_a != prev.commit_a
            || self.commit_b != prev.commit_b
    }

    /// Paths expanded since `prev`, in insertion order.
    pub fn newly_opened(&self, prev: &SessionState) -> Vec<String> {
        self.open_paths
            .iter()
            .filter(|p| !prev.open_paths.contains(p))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_path_idempotent() {
        let mut state = SessionState::default();
        state.open_path("a.txt".to_string());
        state.open_path("b.txt".to_string());
        state.open_path("a.txt".to_string());
        assert_eq!(state.open_paths, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_close_path_absent_is_noop() {
        let mut state = SessionState::default();
        state.open_path("a.txt".to_string());
        assert!(!state.close_path("missing.txt"));
        assert!(state.close_path("a.txt"));
        assert!(state.open_paths.is_empty());
    }

    #[test]
    fn test_expand_collapse_net_effect() {
        // the final set equals the net effect of applying each op in order
        let mut state = SessionState::default();
        let ops = [
            ("open", "a"),
            ("open", "b"),
            ("close", "a"),
            ("open", "c"),
            ("open", "b"),
            ("close", "x"),
            ("open", "a"),
        ];
        for (op, path) in ops {
            match op {
                "open" => state.open_path(path.to_string()),
                _ => {
                    state.close_path(path);
                }
            }
        }
        assert_eq!(state.open_paths, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_targets_changed() {
        let prev = SessionState::default();
        let mut state = prev.clone();
        assert!(!state.targets_changed(&prev));

        state.commit_b = Some("abc".to_string());
        assert!(state.targets_changed(&prev));

        let mut state = prev.clone();
        state.open_path("a.txt".to_string());
        assert!(!state.targets_changed(&prev));
    }

    #[test]
    fn test_newly_opened() {
        let mut prev = SessionState::default();
        prev.open_path("a.txt".to_string());

        let mut state = prev.clone();
        state.open_path("b.txt".to_string());
        state.open_path("c.txt".to_string());
        assert_eq!(state.newly_opened(&prev), vec!["b.txt", "c.txt"]);
        assert!(prev.newly_opened(&state).is_empty());
    }
}
