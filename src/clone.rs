//! Repository cloning.
//!
//! Clones the target repository into a unique timestamped directory under
//! the configured clone root, so repeated runs against the same URL never
//! collide. Clone failures are fatal to the run.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Derive a project name from a repository URL or local path.
///
/// Takes the last path segment and strips a `.git` suffix:
/// `https://github.com/org/repo.git` → `repo`.
pub fn project_name(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(trimmed)
        .trim_end_matches(".git");
    if last.is_empty() {
        "project".to_string()
    } else {
        last.to_string()
    }
}

/// Clone `url` into `<base_dir>/<project>_<YYYYmmddHHMMSS>` and return the
/// clone directory.
pub fn clone_repo(url: &str, base_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(base_dir)
        .with_context(|| format!("Failed to create clone directory: {}", base_dir.display()))?;

    let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let dest = base_dir.join(format!("{}_{}", project_name(url), timestamp));

    let output = Command::new("git")
        .args(["clone", "--depth", "1"])
        .arg(url)
        .arg(&dest)
        .output()
        .with_context(|| "Failed to execute 'git clone'. Is git installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git clone failed: {}", stderr.trim());
    }

    Ok(dest)
}

/// Heuristic: does the review target look like a remote URL rather than a
/// local directory?
pub fn looks_like_url(target: &str) -> bool {
    target.starts_with("http://")
        || target.starts_with("https://")
        || target.starts_with("git@")
        || target.starts_with("ssh://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_name_from_https_url() {
        assert_eq!(project_name("https://github.com/org/repo.git"), "repo");
        assert_eq!(project_name("https://github.com/org/repo"), "repo");
        assert_eq!(project_name("https://github.com/org/repo/"), "repo");
    }

    #[test]
    fn project_name_from_ssh_url() {
        assert_eq!(project_name("git@github.com:org/repo.git"), "repo");
    }

    #[test]
    fn project_name_from_local_path() {
        assert_eq!(project_name("/tmp/checkouts/myproj"), "myproj");
    }

    #[test]
    fn url_detection() {
        assert!(looks_like_url("https://github.com/org/repo.git"));
        assert!(looks_like_url("git@github.com:org/repo.git"));
        assert!(!looks_like_url("./local/dir"));
        assert!(!looks_like_url("/abs/path"));
    }
}
