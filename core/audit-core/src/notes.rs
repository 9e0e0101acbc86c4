//! Note Manager - in-memory mutation of a loaded notes collection.
//!
//! Every function here leaves the collection in canonical order: sorted by
//! file (string order) and then line (numeric order). Persisting the result
//! is the caller's job, via [`Session::commit_notes`](crate::Session::commit_notes),
//! which also bumps the session's `last_modified`.
//!
//! Several notes may share one `(file, line)`. Deleting at such a location
//! takes a [`DeleteSelection`] so the caller can pick one note or all of them.

use chrono::Utc;

use crate::error::{AuditError, Result};
use crate::types::{Note, NoteType, NotesDocument};

/// Which of the notes at a location to delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteSelection {
    /// Position within the candidates returned by [`notes_at`] (0-based).
    One(usize),
    AllAtLocation,
}

/// Builds a new note for `commit`, validating line and text.
pub fn new_note(
    file: &str,
    line: u32,
    note_type: NoteType,
    text: &str,
    commit: &str,
    fingerprint: Option<String>,
) -> Result<Note> {
    if line == 0 {
        return Err(AuditError::InvalidLine(line));
    }
    let text = text.trim();
    if text.is_empty() {
        return Err(AuditError::EmptyNoteText);
    }
    Ok(Note {
        file: file.to_string(),
        line,
        note_type,
        text: text.to_string(),
        created_at: Utc::now(),
        commit: commit.to_string(),
        fingerprint,
        restored_from: None,
        harmonized_from: None,
    })
}

/// Re-establishes canonical order. Stable, so notes sharing a location keep
/// their insertion order.
pub fn sort_notes(notes: &mut [Note]) {
    notes.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
}

pub fn is_sorted(notes: &[Note]) -> bool {
    notes
        .windows(2)
        .all(|w| (w[0].file.as_str(), w[0].line) <= (w[1].file.as_str(), w[1].line))
}

/// Appends a note and re-sorts.
pub fn add_note(doc: &mut NotesDocument, note: Note) {
    doc.notes.push(note);
    sort_notes(&mut doc.notes);
}

/// Removes the note at `index` in the collection.
pub fn remove_at(doc: &mut NotesDocument, index: usize) -> Result<Note> {
    if index >= doc.notes.len() {
        return Err(AuditError::IndexOutOfRange {
            index,
            len: doc.notes.len(),
        });
    }
    let removed = doc.notes.remove(index);
    sort_notes(&mut doc.notes);
    Ok(removed)
}

/// Removes every note matching `predicate`, returning the removed notes.
pub fn remove_where<F>(doc: &mut NotesDocument, mut predicate: F) -> Vec<Note>
where
    F: FnMut(&Note) -> bool,
{
    let (removed, kept): (Vec<Note>, Vec<Note>) =
        std::mem::take(&mut doc.notes).into_iter().partition(|n| predicate(n));
    doc.notes = kept;
    sort_notes(&mut doc.notes);
    removed
}

/// Removes every note in `file`.
pub fn remove_in_file(doc: &mut NotesDocument, file: &str) -> Vec<Note> {
    remove_where(doc, |n| n.file == file)
}

/// Notes of one file, in canonical order (gutter feed).
pub fn notes_for_file<'a>(doc: &'a NotesDocument, file: &str) -> Vec<&'a Note> {
    doc.notes.iter().filter(|n| n.file == file).collect()
}

/// Notes at one location with their index in the collection.
pub fn notes_at<'a>(doc: &'a NotesDocument, file: &str, line: u32) -> Vec<(usize, &'a Note)> {
    doc.notes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.file == file && n.line == line)
        .collect()
}

/// Deletes one or all notes at a location.
///
/// Fails with [`AuditError::NoNotesAtLocation`] when nothing is there and
/// [`AuditError::IndexOutOfRange`] when `One(i)` exceeds the candidates.
pub fn delete_at(
    doc: &mut NotesDocument,
    file: &str,
    line: u32,
    selection: DeleteSelection,
) -> Result<Vec<Note>> {
    let candidates: Vec<usize> = notes_at(doc, file, line).into_iter().map(|(i, _)| i).collect();
    if candidates.is_empty() {
        return Err(AuditError::NoNotesAtLocation {
            file: file.to_string(),
            line,
        });
    }

    match selection {
        DeleteSelection::One(choice) => {
            let index = *candidates.get(choice).ok_or(AuditError::IndexOutOfRange {
                index: choice,
                len: candidates.len(),
            })?;
            remove_at(doc, index).map(|n| vec![n])
        }
        DeleteSelection::AllAtLocation => {
            Ok(remove_where(doc, |n| n.file == file && n.line == line))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(file: &str, line: u32, text: &str) -> Note {
        new_note(file, line, NoteType::Comment, text, "c1", Some(format!("{file}{line}"))).unwrap()
    }

    fn doc_with(notes: Vec<Note>) -> NotesDocument {
        let mut doc = NotesDocument::default();
        for n in notes {
            add_note(&mut doc, n);
        }
        doc
    }

    #[test]
    fn add_keeps_canonical_order() {
        let doc = doc_with(vec![
            note("src/b.rs", 3, "x"),
            note("src/a.rs", 20, "x"),
            note("src/a.rs", 3, "x"),
            note("src/a.rs", 100, "x"),
        ]);
        let order: Vec<(String, u32)> = doc.notes.iter().map(|n| (n.file.clone(), n.line)).collect();
        assert_eq!(
            order,
            vec![
                ("src/a.rs".to_string(), 3),
                ("src/a.rs".to_string(), 20),
                ("src/a.rs".to_string(), 100),
                ("src/b.rs".to_string(), 3),
            ]
        );
        assert!(is_sorted(&doc.notes));
    }

    #[test]
    fn add_then_remove_restores_previous_state() {
        let mut doc = doc_with(vec![note("a.rs", 1, "one"), note("c.rs", 5, "two")]);
        let before = doc.clone();

        add_note(&mut doc, note("b.rs", 9, "three"));
        let index = doc.notes.iter().position(|n| n.file == "b.rs").unwrap();
        remove_at(&mut doc, index).unwrap();

        assert_eq!(doc, before);
    }

    #[test]
    fn new_note_validates_input() {
        assert!(matches!(
            new_note("a", 0, NoteType::Safe, "ok", "c", None),
            Err(AuditError::InvalidLine(0))
        ));
        assert!(matches!(
            new_note("a", 1, NoteType::Safe, "   ", "c", None),
            Err(AuditError::EmptyNoteText)
        ));
        assert_eq!(
            new_note("a", 1, NoteType::Safe, "  ok \n", "c", None).unwrap().text,
            "ok"
        );
    }

    #[test]
    fn remove_at_out_of_range() {
        let mut doc = doc_with(vec![note("a.rs", 1, "x")]);
        assert!(matches!(
            remove_at(&mut doc, 4),
            Err(AuditError::IndexOutOfRange { index: 4, len: 1 })
        ));
    }

    #[test]
    fn multiple_notes_share_a_line() {
        let mut doc = doc_with(vec![
            note("a.rs", 7, "first"),
            note("a.rs", 7, "second"),
            note("a.rs", 8, "other"),
        ]);
        let at: Vec<&str> = notes_at(&doc, "a.rs", 7).iter().map(|(_, n)| n.text.as_str()).collect();
        assert_eq!(at, vec!["first", "second"]);

        let removed = delete_at(&mut doc, "a.rs", 7, DeleteSelection::One(1)).unwrap();
        assert_eq!(removed[0].text, "second");
        assert_eq!(doc.notes.len(), 2);
    }

    #[test]
    fn delete_all_at_location() {
        let mut doc = doc_with(vec![
            note("a.rs", 7, "first"),
            note("a.rs", 7, "second"),
            note("a.rs", 8, "other"),
        ]);
        let removed = delete_at(&mut doc, "a.rs", 7, DeleteSelection::AllAtLocation).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(doc.notes.len(), 1);
        assert_eq!(doc.notes[0].line, 8);
    }

    #[test]
    fn delete_reports_empty_location() {
        let mut doc = doc_with(vec![note("a.rs", 7, "x")]);
        let err = delete_at(&mut doc, "a.rs", 9, DeleteSelection::AllAtLocation).unwrap_err();
        assert!(err.is_informational());

        let err = delete_at(&mut doc, "a.rs", 7, DeleteSelection::One(3)).unwrap_err();
        assert!(matches!(err, AuditError::IndexOutOfRange { index: 3, len: 1 }));
    }

    #[test]
    fn remove_in_file_and_filter() {
        let mut doc = doc_with(vec![
            note("a.rs", 1, "x"),
            note("b.rs", 2, "y"),
            note("a.rs", 3, "z"),
        ]);
        assert_eq!(notes_for_file(&doc, "a.rs").len(), 2);

        let removed = remove_in_file(&mut doc, "a.rs");
        assert_eq!(removed.len(), 2);
        assert!(notes_for_file(&doc, "a.rs").is_empty());
        assert_eq!(doc.notes.len(), 1);
    }
}
