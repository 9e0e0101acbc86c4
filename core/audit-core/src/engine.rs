//! AuditEngine - the main entry point for audit-notes clients.
//!
//! Ties the session registry, note manager, reconciliation and report
//! generators together behind one synchronous API. Every mutating call
//! resolves the session for the given path, applies the change and persists
//! notes and metadata before returning.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use audit_core::{AuditEngine, NoteType, ShellGit};
//!
//! let mut engine = AuditEngine::new();
//! let git = ShellGit::for_file(&file);
//! engine.add_note(&git, &file, &text, 42, NoteType::Finding, "unchecked length")?;
//! ```

use std::path::Path;

use crate::config::{load_config, AuditConfig};
use crate::error::{AuditError, Result};
use crate::fingerprint::fingerprint_in_text;
use crate::git::{relative_path, resolve_repo_context, GitProvider};
use crate::notes::{self, DeleteSelection};
use crate::reconcile::{self, HarmonizeReport, SessionDiff};
use crate::registry::{RegistryEntry, SessionRegistry};
use crate::report::{render_markdown, ReportGrouping};
use crate::session_store::{self, list_sessions};
use crate::stats::{compute_stats, NoteStats};
use crate::storage::StorageConfig;
use crate::types::{Note, NoteType, NotesDocument, SessionKey};

pub struct AuditEngine {
    storage: StorageConfig,
    config: AuditConfig,
    registry: SessionRegistry,
}

impl Default for AuditEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditEngine {
    /// Engine over the default storage location.
    pub fn new() -> Self {
        Self::with_storage(StorageConfig::default())
    }

    /// Engine over a custom storage root (tests, alternate stores).
    pub fn with_storage(storage: StorageConfig) -> Self {
        let config = load_config(&storage);
        Self {
            storage,
            config,
            registry: SessionRegistry::new(),
        }
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    fn entry(&mut self, git: &dyn GitProvider, path: &Path) -> Result<&mut RegistryEntry> {
        self.registry.session_for(&self.storage, path, git)
    }

    fn repo_relative(entry: &RegistryEntry, file: &Path) -> Result<String> {
        relative_path(file, &entry.context.repo_root)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Notes
    // ─────────────────────────────────────────────────────────────────────────────

    /// Adds a note at `line` of `file`, fingerprinting it against
    /// `file_text` (the file's current content).
    pub fn add_note(
        &mut self,
        git: &dyn GitProvider,
        file: &Path,
        file_text: &str,
        line: u32,
        note_type: NoteType,
        text: &str,
    ) -> Result<Note> {
        // Past the last line the context window is empty, and every such
        // note in a file would share one fingerprint.
        let len = file_text.lines().count();
        if line as usize > len {
            return Err(AuditError::LineBeyondEnd { line, len });
        }

        let entry = self.entry(git, file)?;
        let relative = Self::repo_relative(entry, file)?;
        let fingerprint = fingerprint_in_text(&relative, line, file_text);
        let note = notes::new_note(
            &relative,
            line,
            note_type,
            text,
            &entry.session.key.commit,
            Some(fingerprint),
        )?;

        let mut doc = entry.session.notes();
        notes::add_note(&mut doc, note.clone());
        entry.session.commit_notes(&doc)?;

        tracing::debug!(location = %note.location(), note_type = %note.note_type, "Added note");
        Ok(note)
    }

    /// Every note of the current session.
    pub fn all_notes(&mut self, git: &dyn GitProvider, anchor: &Path) -> Result<NotesDocument> {
        Ok(self.entry(git, anchor)?.session.notes())
    }

    /// Notes of one file, in line order.
    pub fn notes_in_file(&mut self, git: &dyn GitProvider, file: &Path) -> Result<Vec<Note>> {
        let entry = self.entry(git, file)?;
        let relative = Self::repo_relative(entry, file)?;
        let doc = entry.session.notes();
        Ok(notes::notes_for_file(&doc, &relative)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Candidates at one location, for delete disambiguation.
    pub fn notes_at(&mut self, git: &dyn GitProvider, file: &Path, line: u32) -> Result<Vec<Note>> {
        let entry = self.entry(git, file)?;
        let relative = Self::repo_relative(entry, file)?;
        let doc = entry.session.notes();
        Ok(notes::notes_at(&doc, &relative, line)
            .into_iter()
            .map(|(_, n)| n.clone())
            .collect())
    }

    pub fn delete_notes(
        &mut self,
        git: &dyn GitProvider,
        file: &Path,
        line: u32,
        selection: DeleteSelection,
    ) -> Result<Vec<Note>> {
        let entry = self.entry(git, file)?;
        let relative = Self::repo_relative(entry, file)?;
        let mut doc = entry.session.notes();
        let removed = notes::delete_at(&mut doc, &relative, line, selection)?;
        entry.session.commit_notes(&doc)?;
        Ok(removed)
    }

    /// Removes every note in `file`. Returns how many were removed.
    pub fn delete_all_in_file(&mut self, git: &dyn GitProvider, file: &Path) -> Result<usize> {
        let entry = self.entry(git, file)?;
        let relative = Self::repo_relative(entry, file)?;
        let mut doc = entry.session.notes();
        let removed = notes::remove_in_file(&mut doc, &relative);
        if removed.is_empty() {
            return Ok(0);
        }
        entry.session.commit_notes(&doc)?;
        Ok(removed.len())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Sessions & Reconciliation
    // ─────────────────────────────────────────────────────────────────────────────

    /// All stored sessions of the repository `git` points at. Does not create
    /// a session for the current commit.
    pub fn list_sessions(&self, git: &dyn GitProvider) -> Result<Vec<SessionKey>> {
        let context = resolve_repo_context(git)?;
        Ok(list_sessions(&self.storage, &context.key.remote()))
    }

    pub fn diff(
        &self,
        git: &dyn GitProvider,
        commit_left: &str,
        commit_right: &str,
    ) -> Result<SessionDiff> {
        let context = resolve_repo_context(git)?;
        reconcile::diff_sessions(&self.storage, &context.key.remote(), commit_left, commit_right)
    }

    /// Restores notes that exist in `source_commit` but not in the current
    /// session. An empty `fingerprints` list restores every such note;
    /// otherwise only notes with a listed fingerprint.
    pub fn restore(
        &mut self,
        git: &dyn GitProvider,
        anchor: &Path,
        source_commit: &str,
        fingerprints: &[String],
    ) -> Result<usize> {
        let storage = self.storage.clone();
        let entry = self.entry(git, anchor)?;
        let source_key = entry.session.key.sibling(source_commit);
        let source = session_store::load_session(&storage, &source_key)
            .ok_or_else(|| AuditError::SessionNotFound(source_commit.to_string()))?;

        let diff = reconcile::diff_notes(&entry.session.notes().notes, &source.notes().notes);
        let chosen: Vec<Note> = diff
            .orphaned_right
            .into_iter()
            .filter(|n| {
                fingerprints.is_empty()
                    || n.fingerprint
                        .as_ref()
                        .is_some_and(|fp| fingerprints.contains(fp))
            })
            .collect();

        reconcile::restore(&mut entry.session, source_commit, &chosen)
    }

    pub fn harmonize(&mut self, git: &dyn GitProvider, anchor: &Path) -> Result<HarmonizeReport> {
        let storage = self.storage.clone();
        let entry = self.entry(git, anchor)?;
        reconcile::harmonize(&storage, &mut entry.session)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reports
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn export_markdown(
        &mut self,
        git: &dyn GitProvider,
        anchor: &Path,
        grouping: Option<ReportGrouping>,
    ) -> Result<String> {
        let grouping = grouping.unwrap_or(self.config.report_grouping);
        let entry = self.entry(git, anchor)?;
        let doc = entry.session.notes();
        Ok(render_markdown(
            &entry.session.key,
            &entry.session.current_metadata(),
            &doc.notes,
            grouping,
        ))
    }

    pub fn stats(&mut self, git: &dyn GitProvider, anchor: &Path) -> Result<NoteStats> {
        let doc = self.all_notes(git, anchor)?;
        Ok(compute_stats(&doc.notes))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Housekeeping
    // ─────────────────────────────────────────────────────────────────────────────

    /// Removes empty sessions of the current repository.
    pub fn clean_empty_sessions(&mut self, git: &dyn GitProvider) -> Result<usize> {
        let context = resolve_repo_context(git)?;
        let key = &context.key;
        let removed =
            session_store::clean_empty_sessions(&self.storage, &key.host, &key.owner, &key.repo)?;
        self.registry.invalidate_all();
        Ok(removed)
    }

    /// Removes empty sessions across the whole store.
    pub fn clean_all_empty(&mut self) -> Result<usize> {
        let removed = session_store::clean_all_empty(&self.storage.sessions_root())?;
        self.registry.invalidate_all();
        Ok(removed)
    }
}
