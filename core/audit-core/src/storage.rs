//! Storage configuration and path management for audit-notes.
//!
//! `StorageConfig` owns every path decision. Sessions live at
//! `<root>/sessions/<host>/<owner>/<repo>/<commit>/{notes.json, metadata.json}`.
//!
//! ## Design Principles
//!
//! - **Single source of truth**: All path decisions centralized here
//! - **Testable**: `StorageConfig::with_root()` enables test injection
//! - **Pure**: Path resolution never touches the filesystem

use std::path::{Path, PathBuf};

use crate::types::SessionKey;

/// Environment variable that overrides the default data root.
pub const ROOT_ENV_VAR: &str = "AUDIT_NOTES_DIR";

pub const NOTES_FILE_NAME: &str = "notes.json";
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Central configuration for all audit-notes storage paths.
///
/// Production code uses `StorageConfig::default()`; tests use
/// `StorageConfig::with_root(temp_dir)` for isolation.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        if let Some(root) = std::env::var_os(ROOT_ENV_VAR).filter(|v| !v.is_empty()) {
            return Self {
                root: PathBuf::from(root),
            };
        }
        let root = dirs::data_dir()
            .map(|d| d.join("audit-notes"))
            .or_else(|| dirs::home_dir().map(|h| h.join(".audit-notes")))
            .unwrap_or_else(|| PathBuf::from(".audit-notes"));
        Self { root }
    }
}

impl StorageConfig {
    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Returns the root directory for audit-notes data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to config.json (preferences).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Base directory that holds every session tree.
    pub fn sessions_root(&self) -> PathBuf {
        self.root.join("sessions")
    }

    /// Directory holding all commits of one repository.
    pub fn repo_dir(&self, host: &str, owner: &str, repo: &str) -> PathBuf {
        self.sessions_root().join(host).join(owner).join(repo)
    }

    /// Directory of one session. Deterministic string join, no I/O.
    /// Example: <root>/sessions/github.com/ethereum/solidity/a1b2c3d
    pub fn session_dir(&self, key: &SessionKey) -> PathBuf {
        self.repo_dir(&key.host, &key.owner, &key.repo)
            .join(&key.commit)
    }

    pub fn notes_file(session_dir: &Path) -> PathBuf {
        session_dir.join(NOTES_FILE_NAME)
    }

    pub fn metadata_file(session_dir: &Path) -> PathBuf {
        session_dir.join(METADATA_FILE_NAME)
    }
}
