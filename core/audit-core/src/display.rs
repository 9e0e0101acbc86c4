//! Display attributes per note type.
//!
//! Editors and the CLI render notes through this table instead of branching
//! on type names. Adding a [`NoteType`] variant fails to compile until it has
//! an entry here.

use crate::types::NoteType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayAttrs {
    /// Two-column gutter sign.
    pub sign: &'static str,
    /// Human label used in headings.
    pub label: &'static str,
    /// Highlight group name for editor integrations.
    pub highlight: &'static str,
    /// Report heading emoji.
    pub icon: &'static str,
}

impl NoteType {
    pub fn display(self) -> DisplayAttrs {
        match self {
            NoteType::Finding => DisplayAttrs {
                sign: "F!",
                label: "Finding",
                highlight: "AuditFinding",
                icon: "🔴",
            },
            NoteType::Question => DisplayAttrs {
                sign: "Q?",
                label: "Question",
                highlight: "AuditQuestion",
                icon: "❓",
            },
            NoteType::Safe => DisplayAttrs {
                sign: "OK",
                label: "Safe",
                highlight: "AuditSafe",
                icon: "✅",
            },
            NoteType::Suggestion => DisplayAttrs {
                sign: "S>",
                label: "Suggestion",
                highlight: "AuditSuggestion",
                icon: "💡",
            },
            NoteType::Comment => DisplayAttrs {
                sign: "C#",
                label: "Comment",
                highlight: "AuditComment",
                icon: "💬",
            },
            NoteType::Invariant => DisplayAttrs {
                sign: "I=",
                label: "Invariant",
                highlight: "AuditInvariant",
                icon: "📐",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn signs_are_unique_and_two_columns() {
        let signs: HashSet<&str> = NoteType::ALL.iter().map(|t| t.display().sign).collect();
        assert_eq!(signs.len(), NoteType::ALL.len());
        assert!(signs.iter().all(|s| s.chars().count() == 2));
    }

    #[test]
    fn labels_match_type_names() {
        for t in NoteType::ALL {
            assert_eq!(t.display().label.to_lowercase(), t.as_str());
        }
    }
}
