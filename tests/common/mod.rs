//! Common test utilities for diffscope integration tests

#![allow(dead_code)]

pub mod test_repo;

pub use test_repo::TestRepo;

use std::process::Command;

/// Whether a usable git binary is on PATH. Tests that need a real
/// repository skip themselves when it is missing.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
