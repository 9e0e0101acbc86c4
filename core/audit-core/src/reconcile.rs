//! Session reconciliation across commits.
//!
//! Line numbers drift between commits, so notes are matched by fingerprint
//! only. Two notes with the same fingerprint are the same logical annotation.
//! Notes without a fingerprint (documents written before fingerprinting) sit
//! outside every comparison: they are never matched and never orphaned.
//!
//! - [`diff_notes`] classifies fingerprints as matching or orphaned per side.
//! - [`restore`] copies chosen notes from another commit into a session.
//! - [`harmonize`] pulls every unseen fingerprint from all sibling sessions.
//!
//! Nothing is persisted here beyond the sessions themselves.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info};

use crate::error::{AuditError, Result};
use crate::notes::sort_notes;
use crate::session_store::{list_sessions, load_notes, load_session, Session};
use crate::storage::StorageConfig;
use crate::types::{Note, RemoteInfo, SessionKey};

/// A fingerprint present on both sides, with every note carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintMatch {
    pub fingerprint: String,
    pub left: Vec<Note>,
    pub right: Vec<Note>,
}

/// Result of comparing two note collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDiff {
    pub matching: Vec<FingerprintMatch>,
    /// Notes whose fingerprint exists only on the left side.
    pub orphaned_left: Vec<Note>,
    /// Notes whose fingerprint exists only on the right side.
    pub orphaned_right: Vec<Note>,
}

impl SessionDiff {
    pub fn is_identical(&self) -> bool {
        self.orphaned_left.is_empty() && self.orphaned_right.is_empty()
    }
}

/// Outcome of a harmonize run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarmonizeReport {
    pub harmonized: usize,
    /// Sibling commits that contributed at least one note, in contribution order.
    pub contributors: Vec<String>,
}

fn index_by_fingerprint(notes: &[Note]) -> BTreeMap<&str, Vec<Note>> {
    let mut index: BTreeMap<&str, Vec<Note>> = BTreeMap::new();
    for note in notes {
        if let Some(fp) = note.fingerprint.as_deref() {
            index.entry(fp).or_default().push(note.clone());
        }
    }
    index
}

/// Classifies every fingerprinted note of `left` and `right`.
///
/// Each fingerprint lands in exactly one of matching, orphaned-left or
/// orphaned-right. Duplicates sharing a fingerprint are all kept.
/// Output is ordered by fingerprint, orphans by canonical note order.
pub fn diff_notes(left: &[Note], right: &[Note]) -> SessionDiff {
    let mut left_index = index_by_fingerprint(left);
    let mut right_index = index_by_fingerprint(right);

    let shared: Vec<String> = left_index
        .keys()
        .filter(|fp| right_index.contains_key(*fp))
        .map(|fp| fp.to_string())
        .collect();

    let mut diff = SessionDiff::default();
    for fp in shared {
        let left_notes = left_index.remove(fp.as_str()).unwrap_or_default();
        let right_notes = right_index.remove(fp.as_str()).unwrap_or_default();
        diff.matching.push(FingerprintMatch {
            fingerprint: fp,
            left: left_notes,
            right: right_notes,
        });
    }

    diff.orphaned_left = left_index.into_values().flatten().collect();
    diff.orphaned_right = right_index.into_values().flatten().collect();
    sort_notes(&mut diff.orphaned_left);
    sort_notes(&mut diff.orphaned_right);
    diff
}

/// Diffs two stored sessions of the same repository.
///
/// Reports [`AuditError::NotEnoughSessions`] when the repository has fewer
/// than two sessions and [`AuditError::SessionNotFound`] for an unknown commit.
pub fn diff_sessions(
    storage: &StorageConfig,
    remote: &RemoteInfo,
    commit_left: &str,
    commit_right: &str,
) -> Result<SessionDiff> {
    let sessions = list_sessions(storage, remote);
    if sessions.len() < 2 {
        return Err(AuditError::NotEnoughSessions {
            found: sessions.len(),
        });
    }

    let left = require_session(storage, &remote.at_commit(commit_left))?;
    let right = require_session(storage, &remote.at_commit(commit_right))?;

    let diff = diff_notes(&left.notes().notes, &right.notes().notes);
    debug!(
        left = %commit_left,
        right = %commit_right,
        matching = diff.matching.len(),
        orphaned_left = diff.orphaned_left.len(),
        orphaned_right = diff.orphaned_right.len(),
        "Diffed sessions"
    );
    Ok(diff)
}

fn require_session(storage: &StorageConfig, key: &SessionKey) -> Result<Session> {
    load_session(storage, key).ok_or_else(|| AuditError::SessionNotFound(key.commit.clone()))
}

/// Copies `notes` into `target`, retagging them to the target commit and
/// marking `restored_from = source_commit`. File, line, type, text, creation
/// time and fingerprint stay as recorded. Returns the number restored.
pub fn restore(target: &mut Session, source_commit: &str, notes: &[Note]) -> Result<usize> {
    if notes.is_empty() {
        return Ok(0);
    }

    let mut doc = target.notes();
    doc.notes.extend(notes.iter().map(|note| Note {
        restored_from: Some(source_commit.to_string()),
        ..note.carried_to(&target.key.commit)
    }));
    sort_notes(&mut doc.notes);
    target.commit_notes(&doc)?;

    info!(
        session = %target.key,
        from = %source_commit,
        count = notes.len(),
        "Restored notes"
    );
    Ok(notes.len())
}

/// Merges every note from sibling sessions whose fingerprint the target does
/// not have yet.
///
/// Siblings are visited in commit-directory order; when several carry the
/// same fingerprint the first one visited wins. That order is an
/// implementation detail, not a guarantee. Running twice in a row harmonizes
/// nothing the second time.
pub fn harmonize(storage: &StorageConfig, target: &mut Session) -> Result<HarmonizeReport> {
    let siblings: Vec<SessionKey> = list_sessions(storage, &target.key.remote())
        .into_iter()
        .filter(|k| k.commit != target.key.commit)
        .collect();
    if siblings.is_empty() {
        return Err(AuditError::NoSiblingSessions);
    }

    let mut doc = target.notes();
    let mut seen: HashSet<String> = doc
        .notes
        .iter()
        .filter_map(|n| n.fingerprint.clone())
        .collect();

    let mut report = HarmonizeReport::default();
    for sibling in &siblings {
        let sibling_doc = load_notes(&storage.session_dir(sibling));
        let mut contributed = false;
        for note in &sibling_doc.notes {
            let Some(fp) = note.fingerprint.as_deref() else {
                continue;
            };
            if !seen.insert(fp.to_string()) {
                continue;
            }
            doc.notes.push(Note {
                harmonized_from: Some(sibling.commit.clone()),
                ..note.carried_to(&target.key.commit)
            });
            report.harmonized += 1;
            contributed = true;
        }
        if contributed {
            report.contributors.push(sibling.commit.clone());
        }
    }

    if report.harmonized == 0 {
        debug!(session = %target.key, "Nothing new to harmonize");
        return Ok(report);
    }

    sort_notes(&mut doc.notes);
    let contributors = &report.contributors;
    target.commit_notes_with(&doc, |metadata| {
        let history = metadata.harmonized_from.get_or_insert_with(Vec::new);
        for commit in contributors {
            if !history.contains(commit) {
                history.push(commit.clone());
            }
        }
    })?;

    info!(
        session = %target.key,
        count = report.harmonized,
        sources = ?report.contributors,
        "Harmonized notes"
    );
    Ok(report)
}
