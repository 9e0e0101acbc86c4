//! Compiled regex patterns for fingerprinting and remote URL parsing.
//!
//! Compiled once on first use and shared across the crate.

use once_cell::sync::Lazy;
use regex::Regex;

// ═══════════════════════════════════════════════════════════════════════════════
// Fingerprint Normalization
// ═══════════════════════════════════════════════════════════════════════════════

pub static RE_WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// ═══════════════════════════════════════════════════════════════════════════════
// Remote URLs
// ═══════════════════════════════════════════════════════════════════════════════

/// `https://host/path`, `http://host/path`, `ssh://[user@]host[:port]/path`,
/// `git://host/path`. Credentials before `@` are discarded.
pub static RE_REMOTE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:https?|ssh|git)://(?:[^@/]+@)?([^/:]+)(?::\d+)?/(.+)$").unwrap()
});

/// scp-like `user@host:path`.
pub static RE_REMOTE_SCP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@/:]+@([^:/]+):(.+)$").unwrap());
