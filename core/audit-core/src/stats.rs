//! Aggregate counts over a notes collection.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::types::{Note, NoteType};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteStats {
    pub total: usize,
    pub by_type: BTreeMap<NoteType, usize>,
    pub by_file: BTreeMap<String, usize>,
    pub restored: usize,
    pub harmonized: usize,
    /// Notes written before fingerprints existed; excluded from reconciliation.
    pub without_fingerprint: usize,
}

impl NoteStats {
    pub fn files(&self) -> usize {
        self.by_file.len()
    }

    pub fn count(&self, note_type: NoteType) -> usize {
        self.by_type.get(&note_type).copied().unwrap_or(0)
    }
}

pub fn compute_stats(notes: &[Note]) -> NoteStats {
    let mut stats = NoteStats {
        total: notes.len(),
        ..NoteStats::default()
    };
    for note in notes {
        *stats.by_type.entry(note.note_type).or_insert(0) += 1;
        *stats.by_file.entry(note.file.clone()).or_insert(0) += 1;
        if note.restored_from.is_some() {
            stats.restored += 1;
        }
        if note.harmonized_from.is_some() {
            stats.harmonized += 1;
        }
        if note.fingerprint.is_none() {
            stats.without_fingerprint += 1;
        }
    }
    stats
}

/// Short plain-text summary, one line per non-zero type.
pub fn render_stats(stats: &NoteStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} notes in {} files", stats.total, stats.files());
    for note_type in NoteType::ALL {
        let count = stats.count(note_type);
        if count > 0 {
            let _ = writeln!(out, "  {:<11} {}", note_type.display().label, count);
        }
    }
    if stats.restored > 0 {
        let _ = writeln!(out, "  restored    {}", stats.restored);
    }
    if stats.harmonized > 0 {
        let _ = writeln!(out, "  harmonized  {}", stats.harmonized);
    }
    if stats.without_fingerprint > 0 {
        let _ = writeln!(out, "  legacy (no fingerprint) {}", stats.without_fingerprint);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::new_note;

    #[test]
    fn counts_by_type_and_file() {
        let mut notes = vec![
            new_note("a.rs", 1, NoteType::Finding, "x", "c", Some("1".into())).unwrap(),
            new_note("a.rs", 2, NoteType::Finding, "y", "c", None).unwrap(),
            new_note("b.rs", 1, NoteType::Safe, "z", "c", Some("2".into())).unwrap(),
        ];
        notes[2].restored_from = Some("old".to_string());

        let stats = compute_stats(&notes);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.files(), 2);
        assert_eq!(stats.count(NoteType::Finding), 2);
        assert_eq!(stats.count(NoteType::Question), 0);
        assert_eq!(stats.restored, 1);
        assert_eq!(stats.without_fingerprint, 1);
    }

    #[test]
    fn render_omits_zero_types() {
        let notes = vec![new_note("a.rs", 1, NoteType::Question, "x", "c", None).unwrap()];
        let text = render_stats(&compute_stats(&notes));
        assert!(text.starts_with("1 notes in 1 files"));
        assert!(text.contains("Question"));
        assert!(!text.contains("Finding"));
    }
}
