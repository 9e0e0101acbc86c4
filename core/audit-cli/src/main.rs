//! audit-notes: command-line front end for line-level audit annotations.
//!
//! Notes live per repository and commit under the audit-notes data
//! directory (override with `AUDIT_NOTES_DIR`). The current checkout is
//! found by asking `git` in the file's directory or the working directory.
//!
//! ## Subcommands
//!
//! - `add`, `list`, `delete`, `clear-file`: note management
//! - `sessions`, `diff`, `restore`, `harmonize`: cross-commit reconciliation
//! - `export`, `stats`: reports
//! - `clean`: remove empty sessions

mod commands;
mod logging;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use audit_core::{NoteType, ReportGrouping};

#[derive(Parser)]
#[command(name = "audit-notes")]
#[command(about = "Attach typed audit notes to lines of a git repository")]
#[command(version)]
struct Cli {
    /// Print machine-readable JSON instead of text where supported
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum GroupArg {
    Type,
    File,
}

impl From<GroupArg> for ReportGrouping {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::Type => ReportGrouping::Type,
            GroupArg::File => ReportGrouping::File,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Add a note to a line
    Add {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// 1-based line number
        #[arg(value_name = "LINE")]
        line: u32,

        /// finding, question, safe, suggestion, comment or invariant
        #[arg(value_name = "TYPE")]
        note_type: NoteType,

        /// Note text (remaining arguments are joined with spaces)
        #[arg(value_name = "TEXT", required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// List notes of the current session, optionally for one file
    List {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Delete notes at a location
    Delete {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(value_name = "LINE")]
        line: u32,

        /// Delete only the Nth note at this location (0-based, see `list`)
        #[arg(long, conflicts_with = "all")]
        index: Option<usize>,

        /// Delete every note at this location
        #[arg(long)]
        all: bool,
    },

    /// Delete every note in a file
    ClearFile {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List stored sessions (commits) of this repository
    Sessions,

    /// Compare two sessions by fingerprint
    Diff {
        #[arg(value_name = "COMMIT_A")]
        left: String,

        #[arg(value_name = "COMMIT_B")]
        right: String,
    },

    /// Copy notes missing from the current session out of another commit
    Restore {
        #[arg(value_name = "FROM_COMMIT")]
        from: String,

        /// Restore only notes with this fingerprint (repeatable)
        #[arg(long = "fingerprint", value_name = "FP")]
        fingerprints: Vec<String>,
    },

    /// Merge notes from every other commit of this repository
    Harmonize,

    /// Export the current session as markdown
    Export {
        /// Grouping (defaults to the configured report_grouping)
        #[arg(long = "by", value_enum)]
        by: Option<GroupArg>,

        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Show note counts for the current session
    Stats,

    /// Remove empty sessions of this repository
    Clean {
        /// Scan the whole store instead of this repository
        #[arg(long)]
        all: bool,
    },
}

fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();
    let mut ctx = commands::Context::new(cli.json);

    let result = match cli.command {
        Commands::Add {
            file,
            line,
            note_type,
            text,
        } => ctx.add(&file, line, note_type, &text.join(" ")),
        Commands::List { file } => ctx.list(file.as_deref()),
        Commands::Delete {
            file,
            line,
            index,
            all,
        } => ctx.delete(&file, line, index, all),
        Commands::ClearFile { file } => ctx.clear_file(&file),
        Commands::Sessions => ctx.sessions(),
        Commands::Diff { left, right } => ctx.diff(&left, &right),
        Commands::Restore { from, fingerprints } => ctx.restore(&from, &fingerprints),
        Commands::Harmonize => ctx.harmonize(),
        Commands::Export { by, output } => ctx.export(by.map(Into::into), output.as_deref()),
        Commands::Stats => ctx.stats(),
        Commands::Clean { all } => ctx.clean(all),
    };

    if let Err(e) = result {
        if e.is_informational() {
            println!("{e}");
            return;
        }
        tracing::error!(error = %e, "audit-notes failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_parses_note_type_case_insensitively() {
        let cli = Cli::try_parse_from(["audit-notes", "add", "a.rs", "3", "Finding", "too", "loose"])
            .unwrap();
        match cli.command {
            Commands::Add {
                line,
                note_type,
                text,
                ..
            } => {
                assert_eq!(line, 3);
                assert_eq!(note_type, NoteType::Finding);
                assert_eq!(text, vec!["too".to_string(), "loose".to_string()]);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn add_rejects_unknown_note_type() {
        assert!(Cli::try_parse_from(["audit-notes", "add", "a.rs", "3", "bug", "x"]).is_err());
    }
}
