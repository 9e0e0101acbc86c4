//! Depth-bounded directory walk over the session store.
//!
//! Yields `(path, kind)` pairs lazily. Each call starts a fresh walk, so
//! callers can restart by calling again. Unreadable entries are skipped.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Depth of a session directory below the sessions root:
/// `<host>/<owner>/<repo>/<commit>`.
pub const SESSION_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub depth: usize,
    pub kind: EntryKind,
}

/// Walks `root` down to `max_depth` levels (root itself excluded).
///
/// Directory entries are emitted after their contents, so a consumer that
/// deletes empty directories sees children before parents.
pub fn walk_entries(root: &Path, max_depth: usize) -> impl Iterator<Item = WalkEntry> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .contents_first(true)
        .sort_by_file_name()
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let file_type = e.file_type();
            let kind = if file_type.is_dir() {
                EntryKind::Dir
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                return None;
            };
            Some(WalkEntry {
                depth: e.depth(),
                path: e.into_path(),
                kind,
            })
        })
}

/// Directories at exactly `depth` below `root`.
pub fn dirs_at_depth(root: &Path, depth: usize) -> impl Iterator<Item = PathBuf> {
    walk_entries(root, depth)
        .filter(move |e| e.kind == EntryKind::Dir && e.depth == depth)
        .map(|e| e.path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn walk_respects_depth_bound() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("a/b/c/d/e")).unwrap();

        let depths: Vec<usize> = walk_entries(temp.path(), 3).map(|e| e.depth).collect();
        assert_eq!(depths.iter().max(), Some(&3));
    }

    #[test]
    fn walk_yields_children_before_parents() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("x/y")).unwrap();
        std::fs::write(temp.path().join("x/y/f.json"), "{}").unwrap();

        let entries: Vec<WalkEntry> = walk_entries(temp.path(), 5).collect();
        let pos = |p: &Path| entries.iter().position(|e| e.path == p).unwrap();
        assert!(pos(&temp.path().join("x/y/f.json")) < pos(&temp.path().join("x/y")));
        assert!(pos(&temp.path().join("x/y")) < pos(&temp.path().join("x")));
        assert_eq!(entries[pos(&temp.path().join("x/y/f.json"))].kind, EntryKind::File);
    }

    #[test]
    fn dirs_at_depth_filters_exact_level() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("h/o/r/c1")).unwrap();
        std::fs::create_dir_all(temp.path().join("h/o/r/c2")).unwrap();

        let found: Vec<PathBuf> = dirs_at_depth(temp.path(), 4).collect();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.starts_with(temp.path().join("h/o/r"))));
    }

    #[test]
    fn walk_of_missing_root_is_empty() {
        let temp = TempDir::new().unwrap();
        assert_eq!(walk_entries(&temp.path().join("nope"), 4).count(), 0);
    }
}
