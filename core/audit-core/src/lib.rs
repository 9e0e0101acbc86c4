//! # audit-core
//!
//! Core library for audit-notes: typed review notes attached to lines of files
//! in a git repository, stored per repository and commit, and reconciled
//! across commits by content fingerprint.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. Every call runs to completion.
//! - **Single writer**: One process per session directory; last write wins.
//! - **Graceful degradation**: Missing or corrupt documents load as empty
//!   defaults; only writes and missing git state are hard errors.
//! - **Fingerprints, not line numbers**: Notes are matched across commits by
//!   a hash of their surrounding text, never by re-mapping lines.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use audit_core::{AuditEngine, NoteType, ShellGit};
//!
//! let mut engine = AuditEngine::new();
//! let git = ShellGit::for_file(&path);
//! engine.add_note(&git, &path, &contents, 12, NoteType::Question, "why unchecked?")?;
//! let report = engine.harmonize(&git, &path)?;
//! ```

pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod git;
pub mod notes;
pub mod patterns;
pub mod reconcile;
pub mod registry;
pub mod report;
pub mod session_store;
pub mod stats;
pub mod storage;
pub mod types;
pub mod walk;

pub use config::{load_config, save_config, AuditConfig};
pub use display::DisplayAttrs;
pub use engine::AuditEngine;
pub use error::{AuditError, Result};
pub use git::{parse_remote_url, relative_path, resolve_repo_context, GitProvider, RepoContext, ShellGit};
pub use notes::DeleteSelection;
pub use reconcile::{diff_notes, FingerprintMatch, HarmonizeReport, SessionDiff};
pub use registry::SessionRegistry;
pub use report::{permalink, render_markdown, ReportGrouping};
pub use session_store::Session;
pub use stats::{compute_stats, render_stats, NoteStats};
pub use storage::StorageConfig;
pub use types::*;
