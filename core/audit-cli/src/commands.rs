//! Subcommand implementations.
//!
//! Each command resolves the git checkout (from the file's directory, or the
//! working directory for repository-wide commands), calls the engine and
//! prints the outcome. Output goes to stdout; diagnostics go through tracing.

use std::env;
use std::path::{Path, PathBuf};

use audit_core::{
    render_stats, AuditEngine, AuditError, DeleteSelection, Note, NoteType, ReportGrouping,
    SessionDiff, ShellGit,
};
use fs_err as fs;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{count} notes at {location}; pass --index N or --all")]
    Ambiguous { location: String, count: usize },
}

impl CliError {
    pub fn is_informational(&self) -> bool {
        match self {
            CliError::Audit(e) => e.is_informational(),
            CliError::Ambiguous { .. } => true,
            _ => false,
        }
    }
}

type Result<T> = std::result::Result<T, CliError>;

pub struct Context {
    engine: AuditEngine,
    json: bool,
}

impl Context {
    pub fn new(json: bool) -> Self {
        let mut engine = AuditEngine::new();
        if engine.config().clean_on_start {
            match engine.clean_all_empty() {
                Ok(removed) if removed > 0 => {
                    tracing::info!(removed, "Removed empty sessions on start")
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Startup cleanup failed"),
            }
        }
        Self { engine, json }
    }

    fn emit<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Notes
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn add(&mut self, file: &Path, line: u32, note_type: NoteType, text: &str) -> Result<()> {
        let file = absolute_file(file)?;
        let contents = fs::read_to_string(&file)?;
        let git = ShellGit::for_file(&file);
        let note = self
            .engine
            .add_note(&git, &file, &contents, line, note_type, text)?;

        if self.json {
            return self.emit(&note);
        }
        println!("Added {} at {}", note.note_type, note.location());
        Ok(())
    }

    pub fn list(&mut self, file: Option<&Path>) -> Result<()> {
        let notes = match file {
            Some(file) => {
                let file = absolute_file(file)?;
                let git = ShellGit::for_file(&file);
                self.engine.notes_in_file(&git, &file)?
            }
            None => {
                let (git, anchor) = cwd_git()?;
                self.engine.all_notes(&git, &anchor)?.notes
            }
        };

        if self.json {
            return self.emit(&notes);
        }
        if notes.is_empty() {
            println!("No notes.");
        }
        print_notes(&notes);
        Ok(())
    }

    pub fn delete(
        &mut self,
        file: &Path,
        line: u32,
        index: Option<usize>,
        all: bool,
    ) -> Result<()> {
        let file = absolute_file(file)?;
        let git = ShellGit::for_file(&file);

        let selection = match (index, all) {
            (Some(i), _) => DeleteSelection::One(i),
            (None, true) => DeleteSelection::AllAtLocation,
            (None, false) => {
                let candidates = self.engine.notes_at(&git, &file, line)?;
                if candidates.len() > 1 {
                    for (i, note) in candidates.iter().enumerate() {
                        println!("  [{i}] {} {}", note.note_type, first_line(&note.text));
                    }
                    return Err(CliError::Ambiguous {
                        location: format!("{}:{}", file.display(), line),
                        count: candidates.len(),
                    });
                }
                DeleteSelection::One(0)
            }
        };

        let removed = self.engine.delete_notes(&git, &file, line, selection)?;
        if self.json {
            return self.emit(&removed);
        }
        println!("Deleted {} note(s)", removed.len());
        Ok(())
    }

    pub fn clear_file(&mut self, file: &Path) -> Result<()> {
        let file = absolute_file(file)?;
        let git = ShellGit::for_file(&file);
        let removed = self.engine.delete_all_in_file(&git, &file)?;
        println!("Deleted {removed} note(s) in {}", file.display());
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Sessions
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn sessions(&mut self) -> Result<()> {
        let (git, _) = cwd_git()?;
        let sessions = self.engine.list_sessions(&git)?;
        let commits: Vec<&str> = sessions.iter().map(|k| k.commit.as_str()).collect();

        if self.json {
            return self.emit(&commits);
        }
        match sessions.first() {
            Some(first) => {
                println!("{}/{}/{}", first.host, first.owner, first.repo);
                for commit in commits {
                    println!("  {commit}");
                }
            }
            None => println!("No sessions for this repository."),
        }
        Ok(())
    }

    pub fn diff(&mut self, left: &str, right: &str) -> Result<()> {
        let (git, _) = cwd_git()?;
        let diff = self.engine.diff(&git, left, right)?;

        if self.json {
            return self.emit(&DiffView::from(&diff));
        }
        println!("Matching: {}", diff.matching.len());
        for m in &diff.matching {
            let lines: Vec<String> = m.left.iter().map(Note::location).collect();
            let moved: Vec<String> = m.right.iter().map(Note::location).collect();
            println!("  {}  {} -> {}", m.fingerprint, lines.join(", "), moved.join(", "));
        }
        println!("Only in {left}: {}", diff.orphaned_left.len());
        print_notes(&diff.orphaned_left);
        println!("Only in {right}: {}", diff.orphaned_right.len());
        print_notes(&diff.orphaned_right);
        Ok(())
    }

    pub fn restore(&mut self, from: &str, fingerprints: &[String]) -> Result<()> {
        let (git, anchor) = cwd_git()?;
        let restored = self.engine.restore(&git, &anchor, from, fingerprints)?;
        println!("Restored {restored} note(s) from {from}");
        Ok(())
    }

    pub fn harmonize(&mut self) -> Result<()> {
        let (git, anchor) = cwd_git()?;
        let report = self.engine.harmonize(&git, &anchor)?;
        if report.harmonized == 0 {
            println!("Nothing to harmonize.");
        } else {
            println!(
                "Harmonized {} note(s) from {}",
                report.harmonized,
                report.contributors.join(", ")
            );
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reports
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn export(&mut self, grouping: Option<ReportGrouping>, output: Option<&Path>) -> Result<()> {
        let (git, anchor) = cwd_git()?;
        let markdown = self.engine.export_markdown(&git, &anchor, grouping)?;
        match output {
            Some(path) => {
                fs::write(path, markdown)?;
                println!("Wrote {}", path.display());
            }
            None => print!("{markdown}"),
        }
        Ok(())
    }

    pub fn stats(&mut self) -> Result<()> {
        let (git, anchor) = cwd_git()?;
        let stats = self.engine.stats(&git, &anchor)?;
        if self.json {
            let by_type: Vec<(&str, usize)> = stats
                .by_type
                .iter()
                .map(|(t, c)| (t.as_str(), *c))
                .collect();
            return self.emit(&serde_json::json!({
                "total": stats.total,
                "files": stats.files(),
                "by_type": by_type.into_iter().collect::<std::collections::BTreeMap<_, _>>(),
                "by_file": &stats.by_file,
                "restored": stats.restored,
                "harmonized": stats.harmonized,
                "without_fingerprint": stats.without_fingerprint,
            }));
        }
        print!("{}", render_stats(&stats));
        Ok(())
    }

    pub fn clean(&mut self, all: bool) -> Result<()> {
        let removed = if all {
            self.engine.clean_all_empty()?
        } else {
            let (git, _) = cwd_git()?;
            self.engine.clean_empty_sessions(&git)?
        };
        println!("Removed {removed} empty session(s)");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MatchView<'a> {
    fingerprint: &'a str,
    left: &'a [Note],
    right: &'a [Note],
}

#[derive(Serialize)]
struct DiffView<'a> {
    matching: Vec<MatchView<'a>>,
    orphaned_left: &'a [Note],
    orphaned_right: &'a [Note],
}

impl<'a> From<&'a SessionDiff> for DiffView<'a> {
    fn from(diff: &'a SessionDiff) -> Self {
        DiffView {
            matching: diff
                .matching
                .iter()
                .map(|m| MatchView {
                    fingerprint: &m.fingerprint,
                    left: &m.left,
                    right: &m.right,
                })
                .collect(),
            orphaned_left: &diff.orphaned_left,
            orphaned_right: &diff.orphaned_right,
        }
    }
}

/// Canonical absolute path, so it lines up with `git rev-parse --show-toplevel`.
fn absolute_file(file: &Path) -> Result<PathBuf> {
    let joined = if file.is_absolute() {
        file.to_path_buf()
    } else {
        env::current_dir()?.join(file)
    };
    Ok(fs::canonicalize(joined)?)
}

fn cwd_git() -> Result<(ShellGit, PathBuf)> {
    let cwd = fs::canonicalize(env::current_dir()?)?;
    Ok((ShellGit::new(&cwd), cwd))
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

fn print_notes(notes: &[Note]) {
    for note in notes {
        let attrs = note.note_type.display();
        let provenance = match (&note.restored_from, &note.harmonized_from) {
            (Some(c), _) => format!(" (restored from {c})"),
            (_, Some(c)) => format!(" (harmonized from {c})"),
            _ => String::new(),
        };
        println!(
            "  {} {}:{} {}{}",
            attrs.sign,
            note.file,
            note.line,
            first_line(&note.text),
            provenance
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_delete_is_informational() {
        let err = CliError::Ambiguous {
            location: "a.rs:3".to_string(),
            count: 2,
        };
        assert!(err.is_informational());
        assert_eq!(err.to_string(), "2 notes at a.rs:3; pass --index N or --all");
    }

    #[test]
    fn audit_errors_keep_their_classification() {
        assert!(CliError::from(AuditError::NoSiblingSessions).is_informational());
        assert!(!CliError::from(AuditError::NoHeadCommit).is_informational());
    }

    #[test]
    fn first_line_of_multiline_text() {
        assert_eq!(first_line("one\ntwo"), "one");
        assert_eq!(first_line(""), "");
    }

    #[test]
    fn absolute_file_canonicalizes() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("x.rs");
        std::fs::write(&file, "fn x() {}\n").unwrap();
        let resolved = absolute_file(&file).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, std::fs::canonicalize(&file).unwrap());
    }
}
