//! Git metadata provider.
//!
//! The core never shells out directly; it asks a [`GitProvider`] for the
//! repository root, HEAD and origin URL. [`ShellGit`] is the real
//! implementation, tests use an in-memory fake.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{AuditError, Result};
use crate::patterns::{RE_REMOTE_SCP, RE_REMOTE_URL};
use crate::types::{RemoteInfo, SessionKey};

/// Repository facts the session layer needs.
pub trait GitProvider {
    fn is_repo(&self) -> bool;
    fn repo_root(&self) -> Option<PathBuf>;
    /// Abbreviated HEAD commit id.
    fn head_commit(&self) -> Option<String>;
    fn remote_url(&self) -> Option<String>;
}

/// Runs the `git` binary in a working directory.
#[derive(Debug, Clone)]
pub struct ShellGit {
    cwd: PathBuf,
}

impl ShellGit {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    /// Provider for the directory containing `file`.
    pub fn for_file(file: &Path) -> Self {
        let dir = if file.is_dir() {
            file.to_path_buf()
        } else {
            file.parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        };
        Self::new(dir)
    }

    fn run(&self, args: &[&str]) -> Option<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.cwd)
            .output()
            .map_err(|e| debug!(error = %e, ?args, "Failed to spawn git"))
            .ok()?;

        if !output.status.success() {
            debug!(?args, status = ?output.status.code(), "git exited with failure");
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() {
            None
        } else {
            Some(stdout)
        }
    }
}

impl GitProvider for ShellGit {
    fn is_repo(&self) -> bool {
        self.run(&["rev-parse", "--is-inside-work-tree"])
            .is_some_and(|out| out == "true")
    }

    fn repo_root(&self) -> Option<PathBuf> {
        self.run(&["rev-parse", "--show-toplevel"]).map(PathBuf::from)
    }

    fn head_commit(&self) -> Option<String> {
        self.run(&["rev-parse", "--short", "HEAD"])
    }

    fn remote_url(&self) -> Option<String> {
        self.run(&["remote", "get-url", "origin"])
    }
}

/// Parses `https://host/owner/repo.git` and `git@host:owner/repo.git` style
/// remotes. A trailing `.git` and slashes are stripped. For nested groups
/// (`host/group/sub/repo`) the last segment is the repo and the rest the owner.
pub fn parse_remote_url(url: &str) -> Option<RemoteInfo> {
    let url = url.trim();
    let (host, path) = RE_REMOTE_URL
        .captures(url)
        .or_else(|| RE_REMOTE_SCP.captures(url))
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))?;

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let (owner, repo) = path.rsplit_once('/')?;
    let owner = owner.trim_matches('/');

    if host.is_empty() || owner.is_empty() || repo.is_empty() {
        return None;
    }

    Some(RemoteInfo {
        host: host.to_ascii_lowercase(),
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

/// Path of `absolute` relative to `repo_root`, with `/` separators.
pub fn relative_path(absolute: &Path, repo_root: &Path) -> Result<String> {
    let relative = absolute
        .strip_prefix(repo_root)
        .map_err(|_| AuditError::OutsideRepository {
            path: absolute.to_path_buf(),
            root: repo_root.to_path_buf(),
        })?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

/// Everything needed to open the session for the current checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoContext {
    pub key: SessionKey,
    pub repo_root: PathBuf,
    pub remote_url: String,
}

/// Resolves the session key of the checkout `git` looks at.
///
/// Missing repository, remote or HEAD and unparsable remotes are hard errors.
pub fn resolve_repo_context(git: &dyn GitProvider) -> Result<RepoContext> {
    if !git.is_repo() {
        return Err(AuditError::NotARepository(
            git.repo_root().unwrap_or_else(|| PathBuf::from(".")),
        ));
    }
    let repo_root = git
        .repo_root()
        .ok_or_else(|| AuditError::NotARepository(PathBuf::from(".")))?;
    let remote_url = git.remote_url().ok_or(AuditError::NoRemote)?;
    let remote =
        parse_remote_url(&remote_url).ok_or_else(|| AuditError::UnparsableRemote(remote_url.clone()))?;
    let commit = git.head_commit().ok_or(AuditError::NoHeadCommit)?;

    Ok(RepoContext {
        key: remote.at_commit(&commit),
        repo_root,
        remote_url,
    })
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;

    /// In-memory provider for tests.
    #[derive(Debug, Clone, Default)]
    pub struct FakeGit {
        pub root: Option<PathBuf>,
        pub head: Option<String>,
        pub remote: Option<String>,
    }

    impl FakeGit {
        pub fn new(root: &Path, head: &str, remote: &str) -> Self {
            Self {
                root: Some(root.to_path_buf()),
                head: Some(head.to_string()),
                remote: Some(remote.to_string()),
            }
        }
    }

    impl GitProvider for FakeGit {
        fn is_repo(&self) -> bool {
            self.root.is_some()
        }
        fn repo_root(&self) -> Option<PathBuf> {
            self.root.clone()
        }
        fn head_commit(&self) -> Option<String> {
            self.head.clone()
        }
        fn remote_url(&self) -> Option<String> {
            self.remote.clone()
        }
    }
}
