//! Per-path session registry.
//!
//! Remembers which session a file (or directory) resolved to, so repeated
//! operations on the same file skip resolving and loading it again. An entry
//! is reused only while the checkout still resolves to the same repository,
//! remote and HEAD; a commit change swaps in the session for the new commit,
//! creating it on first use.
//!
//! Two paths in one checkout hold separate copies of the same session. The
//! cached metadata can therefore lag behind disk; writes go through
//! [`Session::commit_notes_with`], which reloads it first.
//!
//! The registry is owned by [`AuditEngine`](crate::AuditEngine) and handed
//! around by `&mut`. There is no process-wide cache.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::git::{resolve_repo_context, GitProvider, RepoContext};
use crate::session_store::{open_or_init_session, Session};
use crate::storage::StorageConfig;

#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub context: RepoContext,
    pub session: Session,
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    entries: HashMap<PathBuf, RegistryEntry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `path`, loading or creating it when the cached
    /// entry is missing or stale.
    pub fn session_for(
        &mut self,
        storage: &StorageConfig,
        path: &Path,
        git: &dyn GitProvider,
    ) -> Result<&mut RegistryEntry> {
        let context = resolve_repo_context(git)?;

        match self.entries.entry(path.to_path_buf()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().context != context {
                    debug!(
                        path = %path.display(),
                        from = %occupied.get().context.key,
                        to = %context.key,
                        "Checkout changed, reloading session"
                    );
                    let entry = open_entry(storage, context)?;
                    occupied.insert(entry);
                }
                Ok(occupied.into_mut())
            }
            Entry::Vacant(vacant) => {
                let entry = open_entry(storage, context)?;
                Ok(vacant.insert(entry))
            }
        }
    }

    pub fn invalidate(&mut self, path: &Path) {
        self.entries.remove(path);
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn open_entry(storage: &StorageConfig, context: RepoContext) -> Result<RegistryEntry> {
    let session = open_or_init_session(
        storage,
        &context.key,
        &context.repo_root.to_string_lossy(),
        &context.remote_url,
    )?;
    Ok(RegistryEntry { context, session })
}
