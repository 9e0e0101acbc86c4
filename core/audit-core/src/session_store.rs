//! File-backed session persistence.
//!
//! Each `(host, owner, repo, commit)` maps to exactly one directory holding
//! `notes.json` and `metadata.json`. This module is the only writer of those
//! files; everything else works on loaded copies and writes back through here.
//!
//! # Failure Modes
//!
//! - Missing notes document → empty default (debug log)
//! - Corrupt notes document → empty default (warn log)
//! - Missing metadata → `None`; a session without metadata is not a session
//! - Serialization or write failure → `Err`, the operation aborts
//!
//! # Atomic Writes
//!
//! Uses temp file + rename so other readers never observe a partial document.
//!
//! # Concurrency
//!
//! None. A single writer per session directory is assumed; the last write wins.

use std::io::Write;
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{AuditError, Result};
use crate::storage::{StorageConfig, NOTES_FILE_NAME};
use crate::types::{NotesDocument, RemoteInfo, SessionKey, SessionMetadata};
use crate::walk::{dirs_at_depth, walk_entries, EntryKind, SESSION_DEPTH};

/// Upper bound for store-wide scans. Sessions sit at depth 4, deeper when
/// the owner is a nested group path.
const MAX_SCAN_DEPTH: usize = 8;

// ─────────────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────────────

/// One audit pass over one repository at one commit.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub key: SessionKey,
    pub path: PathBuf,
    pub metadata: SessionMetadata,
}

impl Session {
    /// Loads the current notes document for this session.
    pub fn notes(&self) -> NotesDocument {
        load_notes(&self.path)
    }

    /// Persists `doc` and bumps `last_modified` in the same step.
    ///
    /// The directory is recreated if a cleanup pass removed it in the
    /// meantime, so a cached session stays writable.
    pub fn commit_notes(&mut self, doc: &NotesDocument) -> Result<()> {
        self.commit_notes_with(doc, |_| {})
    }

    /// Like [`Session::commit_notes`], applying `update` to the metadata
    /// before it is saved.
    ///
    /// Metadata is re-read from disk first. Other cached copies of this
    /// session may have written it since this one was loaded, and their
    /// changes must survive. The cached copy is only used when the file is
    /// gone.
    pub fn commit_notes_with<F>(&mut self, doc: &NotesDocument, update: F) -> Result<()>
    where
        F: FnOnce(&mut SessionMetadata),
    {
        ensure_dir(&self.path)?;
        save_notes(&self.path, doc)?;

        let mut metadata = load_metadata(&self.path).unwrap_or_else(|| self.metadata.clone());
        update(&mut metadata);
        metadata.touch();
        save_metadata(&self.path, &metadata)?;
        self.metadata = metadata;
        Ok(())
    }

    /// Metadata as currently stored, falling back to the cached copy.
    pub fn current_metadata(&self) -> SessionMetadata {
        load_metadata(&self.path).unwrap_or_else(|| self.metadata.clone())
    }
}

/// Resolves the directory for a session key. Pure path join, no I/O.
pub fn resolve_path(storage: &StorageConfig, key: &SessionKey) -> PathBuf {
    storage.session_dir(key)
}

/// Idempotent recursive directory creation.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| AuditError::Io {
        context: format!("creating directory {}", path.display()),
        source: e,
    })
}

/// Creates a session directory with fresh metadata and an empty notes document.
///
/// Overwrites whatever documents already exist; callers only use this the
/// first time a commit is seen.
pub fn init_session(
    storage: &StorageConfig,
    key: &SessionKey,
    repo_root: &str,
    repo_url: &str,
) -> Result<Session> {
    let path = resolve_path(storage, key);
    ensure_dir(&path)?;

    let metadata = SessionMetadata::new(repo_url, repo_root, &key.commit);
    save_metadata(&path, &metadata)?;
    save_notes(&path, &NotesDocument::default())?;

    info!(session = %key, path = %path.display(), "Initialized audit session");
    Ok(Session {
        key: key.clone(),
        path,
        metadata,
    })
}

/// Loads an existing session. `None` when the directory has no metadata.
pub fn load_session(storage: &StorageConfig, key: &SessionKey) -> Option<Session> {
    let path = resolve_path(storage, key);
    let metadata = load_metadata(&path)?;
    Some(Session {
        key: key.clone(),
        path,
        metadata,
    })
}

/// Loads the session for `key`, creating it on first use.
pub fn open_or_init_session(
    storage: &StorageConfig,
    key: &SessionKey,
    repo_root: &str,
    repo_url: &str,
) -> Result<Session> {
    match load_session(storage, key) {
        Some(session) => Ok(session),
        None => init_session(storage, key, repo_root, repo_url),
    }
}

/// Sibling sessions (all commits) of one repository, ordered by commit
/// directory name. See [`is_session_dir`] for what counts.
pub fn list_sessions(storage: &StorageConfig, remote: &RemoteInfo) -> Vec<SessionKey> {
    let repo_dir = storage.repo_dir(&remote.host, &remote.owner, &remote.repo);
    dirs_at_depth(&repo_dir, 1)
        .filter(|dir| is_session_dir(dir))
        .filter_map(|dir| {
            dir.file_name()
                .and_then(|n| n.to_str())
                .map(|commit| remote.at_commit(commit))
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Documents
// ─────────────────────────────────────────────────────────────────────────────

enum Loaded<T> {
    Found(T),
    Missing,
    Corrupt,
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Loaded<T> {
    if !path.exists() {
        debug!(path = %path.display(), "Document missing");
        return Loaded::Missing;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read document");
            return Loaded::Corrupt;
        }
    };

    match serde_json::from_str::<T>(&content) {
        Ok(value) => Loaded::Found(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to parse document");
            Loaded::Corrupt
        }
    }
}

/// Loads `notes.json`; missing or unparsable content yields an empty document.
pub fn load_notes(session_dir: &Path) -> NotesDocument {
    match read_document(&StorageConfig::notes_file(session_dir)) {
        Loaded::Found(doc) => doc,
        Loaded::Missing | Loaded::Corrupt => NotesDocument::default(),
    }
}

/// Writes `notes.json` atomically.
pub fn save_notes(session_dir: &Path, doc: &NotesDocument) -> Result<()> {
    write_document(&StorageConfig::notes_file(session_dir), doc)
}

/// Loads `metadata.json`; `None` when missing or unparsable.
pub fn load_metadata(session_dir: &Path) -> Option<SessionMetadata> {
    match read_document(&StorageConfig::metadata_file(session_dir)) {
        Loaded::Found(meta) => Some(meta),
        Loaded::Missing | Loaded::Corrupt => None,
    }
}

/// Writes `metadata.json` atomically.
pub fn save_metadata(session_dir: &Path, metadata: &SessionMetadata) -> Result<()> {
    write_document(&StorageConfig::metadata_file(session_dir), metadata)
}

fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).map_err(|e| AuditError::Serialize {
        context: path.display().to_string(),
        source: e,
    })?;
    atomic_write(path, &content)
}

/// Writes content to a file atomically using temp file + rename.
fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| AuditError::Io {
        context: format!("creating temp file in {}", dir.display()),
        source: e,
    })?;

    tmp.write_all(contents.as_bytes())
        .and_then(|_| tmp.flush())
        .map_err(|e| AuditError::Io {
            context: format!("writing temp file for {}", path.display()),
            source: e,
        })?;

    tmp.persist(path).map_err(|e| AuditError::Io {
        context: format!("persisting temp file to {}", path.display()),
        source: e.error,
    })?;

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Cleanup
// ─────────────────────────────────────────────────────────────────────────────

/// A session directory holds a notes document and no subdirectories.
///
/// A directory with children is an intermediate level of the store, even
/// if a stray notes document sits in it; treating it as a session would let
/// cleanup delete every session below it.
pub fn is_session_dir(dir: &Path) -> bool {
    StorageConfig::notes_file(dir).is_file() && !has_subdirs(dir)
}

fn has_subdirs(dir: &Path) -> bool {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .any(|e| e.file_type().is_ok_and(|t| t.is_dir())),
        // Unreadable: assume the worst so nothing gets deleted.
        Err(_) => true,
    }
}

/// True when the session holds zero notes.
///
/// A corrupt notes document is not considered empty, so cleanup never
/// deletes data it could not read.
pub fn is_session_empty(session_dir: &Path) -> bool {
    match read_document::<NotesDocument>(&StorageConfig::notes_file(session_dir)) {
        Loaded::Found(doc) => doc.notes.is_empty(),
        Loaded::Missing => true,
        Loaded::Corrupt => false,
    }
}

/// Recursively deletes a session directory.
pub fn remove_session_dir(session_dir: &Path) -> Result<()> {
    fs::remove_dir_all(session_dir).map_err(|e| AuditError::Io {
        context: format!("removing session {}", session_dir.display()),
        source: e,
    })
}

/// Deletes the empty sibling sessions of one repository. Returns the count.
pub fn clean_empty_sessions(
    storage: &StorageConfig,
    host: &str,
    owner: &str,
    repo: &str,
) -> Result<usize> {
    let repo_dir = storage.repo_dir(host, owner, repo);
    let empty: Vec<PathBuf> = dirs_at_depth(&repo_dir, 1)
        .filter(|dir| is_session_dir(dir) && is_session_empty(dir))
        .collect();

    for dir in &empty {
        remove_session_dir(dir)?;
        debug!(path = %dir.display(), "Removed empty session");
    }
    Ok(empty.len())
}

/// Scans the whole store for session directories (leaf directories at
/// least [`SESSION_DEPTH`] below `base` holding a notes document), deletes
/// the empty ones, then prunes parent directories left empty, bottom-up,
/// stopping at `base`. Returns the sessions removed.
pub fn clean_all_empty(base: &Path) -> Result<usize> {
    let empty: Vec<PathBuf> = walk_entries(base, MAX_SCAN_DEPTH)
        .filter(|e| {
            e.kind == EntryKind::File
                && e.depth > SESSION_DEPTH
                && e.path.file_name().is_some_and(|n| n == NOTES_FILE_NAME)
        })
        .filter_map(|e| e.path.parent().map(Path::to_path_buf))
        .filter(|dir| is_session_dir(dir) && is_session_empty(dir))
        .collect();

    for dir in &empty {
        remove_session_dir(dir)?;
    }

    for dir in &empty {
        prune_empty_ancestors(base, dir)?;
    }

    if !empty.is_empty() {
        info!(count = empty.len(), base = %base.display(), "Removed empty sessions");
    }
    Ok(empty.len())
}

fn prune_empty_ancestors(base: &Path, removed: &Path) -> Result<()> {
    let mut current = removed.parent();
    while let Some(dir) = current {
        if dir == base || !dir.starts_with(base) || !is_empty_dir(dir) {
            break;
        }
        fs::remove_dir(dir).map_err(|e| AuditError::Io {
            context: format!("pruning directory {}", dir.display()),
            source: e,
        })?;
        current = dir.parent();
    }
    Ok(())
}

fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
