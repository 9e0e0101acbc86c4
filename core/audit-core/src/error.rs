//! Error types for audit-core operations.
//!
//! Three kinds of failure flow through here:
//! - hard failures that abort an operation (git state, serialization, I/O)
//! - informational outcomes the caller reports to the user and moves on
//! - nothing else: soft failures (corrupt or missing documents) never
//!   become errors, they degrade to defaults inside the session store

use std::path::PathBuf;

/// All errors that can occur in audit-core operations.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    // ─────────────────────────────────────────────────────────────────────
    // Repository Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Not inside a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("Repository has no remote named origin")]
    NoRemote,

    #[error("Repository has no HEAD commit")]
    NoHeadCommit,

    #[error("Could not parse remote URL: {0}")]
    UnparsableRemote(String),

    #[error("Path is outside the repository root: {path} (root: {root})")]
    OutsideRepository { path: PathBuf, root: PathBuf },

    // ─────────────────────────────────────────────────────────────────────
    // Session Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Session not found for commit {0}")]
    SessionNotFound(String),

    // ─────────────────────────────────────────────────────────────────────
    // Informational (reported to the user, not fatal)
    // ─────────────────────────────────────────────────────────────────────
    #[error("No notes at {file}:{line}")]
    NoNotesAtLocation { file: String, line: u32 },

    #[error("Need at least two sessions to diff (found {found})")]
    NotEnoughSessions { found: usize },

    #[error("No sibling sessions to harmonize from")]
    NoSiblingSessions,

    // ─────────────────────────────────────────────────────────────────────
    // Note Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Unknown note type: {0}")]
    UnknownNoteType(String),

    #[error("Note text must not be empty")]
    EmptyNoteText,

    #[error("Line numbers start at 1 (got {0})")]
    InvalidLine(u32),

    #[error("Line {line} is past the end of the file ({len} lines)")]
    LineBeyondEnd { line: u32, len: usize },

    #[error("Note index {index} out of range ({len} notes)")]
    IndexOutOfRange { index: usize, len: usize },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {context}: {source}")]
    Serialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AuditError {
    /// True for outcomes that should be shown to the user as information
    /// rather than treated as a failed command.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            AuditError::NoNotesAtLocation { .. }
                | AuditError::NotEnoughSessions { .. }
                | AuditError::NoSiblingSessions
        )
    }
}

/// Convenience type alias for Results using AuditError.
pub type Result<T> = std::result::Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn informational_errors_are_flagged() {
        assert!(AuditError::NotEnoughSessions { found: 1 }.is_informational());
        assert!(AuditError::NoSiblingSessions.is_informational());
        assert!(AuditError::NoNotesAtLocation {
            file: "a.rs".to_string(),
            line: 3
        }
        .is_informational());
        assert!(!AuditError::NoRemote.is_informational());
    }

    #[test]
    fn display_includes_location() {
        let err = AuditError::NoNotesAtLocation {
            file: "src/lib.rs".to_string(),
            line: 42,
        };
        assert_eq!(err.to_string(), "No notes at src/lib.rs:42");
    }

    #[test]
    fn line_beyond_end_is_a_hard_error() {
        let err = AuditError::LineBeyondEnd { line: 50, len: 2 };
        assert!(!err.is_informational());
        assert_eq!(err.to_string(), "Line 50 is past the end of the file (2 lines)");
    }
}
