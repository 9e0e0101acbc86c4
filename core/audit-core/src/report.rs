//! Markdown export of a session.
//!
//! Read-only view over a notes + metadata pair. Notes are grouped by type
//! (canonical type order) or by file (ascending). Each entry links to the
//! forge when the host is one we know the permalink format of.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::types::{Note, NoteType, SessionKey, SessionMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportGrouping {
    #[default]
    Type,
    File,
}

/// Blob permalink for github.com and gitlab.com; `None` for other hosts.
pub fn permalink(
    host: &str,
    owner: &str,
    repo: &str,
    commit: &str,
    file: &str,
    line: u32,
) -> Option<String> {
    match host {
        "github.com" => Some(format!(
            "https://github.com/{owner}/{repo}/blob/{commit}/{file}#L{line}"
        )),
        "gitlab.com" => Some(format!(
            "https://gitlab.com/{owner}/{repo}/-/blob/{commit}/{file}#L{line}"
        )),
        _ => None,
    }
}

/// Renders the full markdown report for one session.
pub fn render_markdown(
    key: &SessionKey,
    metadata: &SessionMetadata,
    notes: &[Note],
    grouping: ReportGrouping,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Audit notes: {}/{}", key.owner, key.repo);
    let _ = writeln!(out);
    let _ = writeln!(out, "- **Repository:** {}", metadata.repo_url);
    let _ = writeln!(out, "- **Commit:** `{}`", metadata.base_ref);
    let _ = writeln!(out, "- **Created:** {}", metadata.created_at.to_rfc3339());
    let _ = writeln!(out, "- **Last modified:** {}", metadata.last_modified.to_rfc3339());
    if let Some(sources) = metadata.harmonized_from.as_ref().filter(|s| !s.is_empty()) {
        let _ = writeln!(out, "- **Harmonized from:** {}", sources.join(", "));
    }
    let _ = writeln!(out, "- **Notes:** {}", notes.len());

    if notes.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "_No notes recorded._");
        return out;
    }

    match grouping {
        ReportGrouping::Type => {
            for note_type in NoteType::ALL {
                let group: Vec<&Note> = notes.iter().filter(|n| n.note_type == note_type).collect();
                if group.is_empty() {
                    continue;
                }
                let attrs = note_type.display();
                let _ = writeln!(out);
                let _ = writeln!(out, "## {} {} ({})", attrs.icon, attrs.label, group.len());
                for note in group {
                    write_entry(&mut out, key, note, true);
                }
            }
        }
        ReportGrouping::File => {
            let mut by_file: BTreeMap<&str, Vec<&Note>> = BTreeMap::new();
            for note in notes {
                by_file.entry(note.file.as_str()).or_default().push(note);
            }
            for (file, group) in by_file {
                let _ = writeln!(out);
                let _ = writeln!(out, "## `{}` ({})", file, group.len());
                for note in group {
                    write_entry(&mut out, key, note, false);
                }
            }
        }
    }
    out
}

fn write_entry(out: &mut String, key: &SessionKey, note: &Note, show_file: bool) {
    let location = if show_file {
        note.location()
    } else {
        format!("L{}", note.line)
    };
    let heading = match permalink(&key.host, &key.owner, &key.repo, &key.commit, &note.file, note.line)
    {
        Some(url) => format!("[`{location}`]({url})"),
        None => format!("`{location}`"),
    };

    let _ = writeln!(out);
    if show_file {
        let _ = writeln!(out, "### {heading}");
    } else {
        let attrs = note.note_type.display();
        let _ = writeln!(out, "### {heading} {} {}", attrs.icon, attrs.label);
    }
    if let Some(from) = &note.restored_from {
        let _ = writeln!(out, "_Restored from `{from}`_");
    }
    if let Some(from) = &note.harmonized_from {
        let _ = writeln!(out, "_Harmonized from `{from}`_");
    }
    let _ = writeln!(out);
    for line in note.text.lines() {
        let _ = writeln!(out, "> {line}");
    }
}
