//! Core types shared by the session store, note manager and reconciliation.
//!
//! The serialized shape of [`NotesDocument`] and [`SessionMetadata`] is the
//! on-disk format; field names are part of the contract with existing data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuditError;

/// Version string written into every notes document.
pub const NOTES_DOCUMENT_VERSION: &str = "1.0";

// ═══════════════════════════════════════════════════════════════════════════════
// Note Types
// ═══════════════════════════════════════════════════════════════════════════════

/// The kind of annotation a reviewer attached to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Finding,
    Question,
    Safe,
    Suggestion,
    Comment,
    Invariant,
}

impl NoteType {
    /// Every note type in canonical report order.
    pub const ALL: [NoteType; 6] = [
        NoteType::Finding,
        NoteType::Question,
        NoteType::Safe,
        NoteType::Suggestion,
        NoteType::Comment,
        NoteType::Invariant,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NoteType::Finding => "finding",
            NoteType::Question => "question",
            NoteType::Safe => "safe",
            NoteType::Suggestion => "suggestion",
            NoteType::Comment => "comment",
            NoteType::Invariant => "invariant",
        }
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteType {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        NoteType::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| AuditError::UnknownNoteType(s.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Notes
// ═══════════════════════════════════════════════════════════════════════════════

/// A single annotation on a repo-relative file and 1-based line.
///
/// `fingerprint` is optional so documents written before fingerprinting
/// existed still load; such notes never take part in diff or harmonize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub file: String,
    pub line: u32,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub commit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restored_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harmonized_from: Option<String>,
}

impl Note {
    /// Location label used in listings and error messages.
    pub fn location(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }

    /// Copies this note into another session, keeping its historical
    /// location, text, type, creation time and fingerprint.
    pub(crate) fn carried_to(&self, target_commit: &str) -> Note {
        Note {
            commit: target_commit.to_string(),
            restored_from: None,
            harmonized_from: None,
            ..self.clone()
        }
    }
}

/// The persisted notes collection of one session (`notes.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesDocument {
    pub version: String,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Default for NotesDocument {
    fn default() -> Self {
        NotesDocument {
            version: NOTES_DOCUMENT_VERSION.to_string(),
            notes: Vec::new(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Sessions
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-session metadata (`metadata.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub repo_url: String,
    pub repo_root: String,
    pub base_ref: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harmonized_from: Option<Vec<String>>,
}

impl SessionMetadata {
    pub fn new(repo_url: &str, repo_root: &str, commit: &str) -> Self {
        let now = Utc::now();
        SessionMetadata {
            repo_url: repo_url.to_string(),
            repo_root: repo_root.to_string(),
            base_ref: commit.to_string(),
            created_at: now,
            last_modified: now,
            harmonized_from: None,
        }
    }

    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}

/// Host/owner/repo triple parsed from a remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteInfo {
    pub host: String,
    pub owner: String,
    pub repo: String,
}

impl RemoteInfo {
    pub fn at_commit(&self, commit: &str) -> SessionKey {
        SessionKey {
            host: self.host.clone(),
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            commit: commit.to_string(),
        }
    }
}

/// On-disk identity of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub commit: String,
}

impl SessionKey {
    pub fn new(host: &str, owner: &str, repo: &str, commit: &str) -> Self {
        SessionKey {
            host: host.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            commit: commit.to_string(),
        }
    }

    pub fn remote(&self) -> RemoteInfo {
        RemoteInfo {
            host: self.host.clone(),
            owner: self.owner.clone(),
            repo: self.repo.clone(),
        }
    }

    /// The same repository at another commit.
    pub fn sibling(&self, commit: &str) -> SessionKey {
        SessionKey {
            commit: commit.to_string(),
            ..self.clone()
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}@{}",
            self.host, self.owner, self.repo, self.commit
        )
    }
}
