//! Repository discovery at startup

use std::fs;
use std::io;
use std::path::Path;

/// Walk `root` and collect every directory that contains a `.git`
/// directory, without recursing into found repositories.
///
/// An unreadable `root` is an error (fatal to startup); unreadable
/// subdirectories are skipped. The result is sorted for a stable listing.
pub fn find_git_repos(root: &Path) -> io::Result<Vec<String>> {
    let mut repos = Vec::new();
    visit(root, &mut repos, true)?;
    repos.sort();
    Ok(repos)
}

fn visit(dir: &Path, repos: &mut Vec<String>, is_root: bool) -> io::Result<()> {
    if dir.join(".git").is_dir() {
        repos.push(dir.display().to_string());
        return Ok(());
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if is_root => return Err(e),
        Err(_) => return Ok(()),
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            visit(&path, repos, false)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_repos_stops_at_repo_boundary() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();

        // two repos, one of which contains a nested repo that must not be found
        fs::create_dir_all(root.join("one/.git")).unwrap();
        fs::create_dir_all(root.join("one/vendored/.git")).unwrap();
        fs::create_dir_all(root.join("sub/two/.git")).unwrap();
        fs::create_dir_all(root.join("plain")).unwrap();

        let repos = find_git_repos(root).unwrap();
        assert_eq!(repos.len(), 2);
        assert!(repos[0].ends_with("one"));
        assert!(repos[1].ends_with("two"));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        assert!(find_git_repos(Path::new("/definitely/not/a/real/dir")).is_err());
    }

    #[test]
    fn test_root_itself_can_be_a_repo() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join(".git")).unwrap();
        let repos = find_git_repos(tmp.path()).unwrap();
        assert_eq!(repos.len(), 1);
    }
}
