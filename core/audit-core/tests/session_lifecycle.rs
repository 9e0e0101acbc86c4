//! Integration coverage for session creation, persistence, export and cleanup.

use std::path::{Path, PathBuf};

use audit_core::session_store::{init_session, is_session_empty, load_notes, load_session};
use audit_core::{
    AuditEngine, DeleteSelection, GitProvider, NoteType, ReportGrouping, SessionKey,
    StorageConfig,
};
use tempfile::tempdir;

struct TestGit {
    head: String,
    remote: String,
}

impl GitProvider for TestGit {
    fn is_repo(&self) -> bool {
        true
    }
    fn repo_root(&self) -> Option<PathBuf> {
        Some(PathBuf::from("/src/tool"))
    }
    fn head_commit(&self) -> Option<String> {
        Some(self.head.clone())
    }
    fn remote_url(&self) -> Option<String> {
        Some(self.remote.clone())
    }
}

fn github(commit: &str) -> TestGit {
    TestGit {
        head: commit.to_string(),
        remote: "https://github.com/acme/tool.git".to_string(),
    }
}

const TEXT: &str = "line one\nline two\nline three\nline four\nline five\nline six\n";

#[test]
fn notes_persist_sorted_across_engine_instances() {
    let temp = tempdir().unwrap();
    let storage = StorageConfig::with_root(temp.path().to_path_buf());
    let git = github("abc1234");

    {
        let mut engine = AuditEngine::with_storage(storage.clone());
        engine
            .add_note(&git, Path::new("/src/tool/z.rs"), TEXT, 1, NoteType::Comment, "z")
            .unwrap();
        engine
            .add_note(&git, Path::new("/src/tool/a.rs"), TEXT, 5, NoteType::Finding, "a5")
            .unwrap();
        engine
            .add_note(&git, Path::new("/src/tool/a.rs"), TEXT, 2, NoteType::Question, "a2")
            .unwrap();
    }

    let key = SessionKey::new("github.com", "acme", "tool", "abc1234");
    let session = load_session(&storage, &key).unwrap();
    assert_eq!(session.metadata.repo_url, "https://github.com/acme/tool.git");
    assert_eq!(session.metadata.repo_root, "/src/tool");
    assert_eq!(session.metadata.base_ref, "abc1234");
    assert!(session.metadata.last_modified >= session.metadata.created_at);

    let doc = load_notes(&session.path);
    assert_eq!(doc.version, "1.0");
    let order: Vec<(&str, u32)> = doc.notes.iter().map(|n| (n.file.as_str(), n.line)).collect();
    assert_eq!(order, vec![("a.rs", 2), ("a.rs", 5), ("z.rs", 1)]);
}

#[test]
fn delete_all_at_location_through_engine() {
    let temp = tempdir().unwrap();
    let mut engine = AuditEngine::with_storage(StorageConfig::with_root(temp.path().to_path_buf()));
    let git = github("abc1234");
    let file = Path::new("/src/tool/lib.rs");

    engine.add_note(&git, file, TEXT, 3, NoteType::Finding, "x").unwrap();
    engine.add_note(&git, file, TEXT, 3, NoteType::Safe, "y").unwrap();
    engine.add_note(&git, file, TEXT, 4, NoteType::Safe, "z").unwrap();

    let removed = engine
        .delete_notes(&git, file, 3, DeleteSelection::AllAtLocation)
        .unwrap();
    assert_eq!(removed.len(), 2);

    let left = engine.notes_in_file(&git, file).unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].line, 4);

    let err = engine
        .delete_notes(&git, file, 3, DeleteSelection::AllAtLocation)
        .unwrap_err();
    assert!(err.is_informational());
}

#[test]
fn export_includes_permalinks_for_github() {
    let temp = tempdir().unwrap();
    let mut engine = AuditEngine::with_storage(StorageConfig::with_root(temp.path().to_path_buf()));
    let git = github("abc1234");
    let file = Path::new("/src/tool/src/main.rs");
    engine
        .add_note(&git, file, TEXT, 2, NoteType::Suggestion, "use a constant")
        .unwrap();

    let md = engine
        .export_markdown(&git, file, Some(ReportGrouping::Type))
        .unwrap();
    assert!(md.contains("# Audit notes: acme/tool"));
    assert!(md.contains("https://github.com/acme/tool/blob/abc1234/src/main.rs#L2"));
    assert!(md.contains("Suggestion (1)"));

    let stats = engine.stats(&git, file).unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.count(NoteType::Suggestion), 1);
}

#[test]
fn cleaning_removes_only_empty_sessions() {
    let temp = tempdir().unwrap();
    let storage = StorageConfig::with_root(temp.path().to_path_buf());
    let empty_key = SessionKey::new("github.com", "acme", "tool", "empty00");
    let empty = init_session(&storage, &empty_key, "/src/tool", "url").unwrap();
    assert!(is_session_empty(&empty.path));

    let mut engine = AuditEngine::with_storage(storage.clone());
    assert_eq!(engine.clean_empty_sessions(&github("empty00")).unwrap(), 1);
    assert!(!empty.path.exists());

    let git = github("full000");
    engine
        .add_note(&git, Path::new("/src/tool/a.rs"), TEXT, 1, NoteType::Comment, "keep")
        .unwrap();
    assert_eq!(engine.clean_empty_sessions(&git).unwrap(), 0);
    assert_eq!(engine.list_sessions(&git).unwrap().len(), 1);

    // The cached session stays usable after cleanup invalidated the registry.
    engine
        .add_note(&git, Path::new("/src/tool/a.rs"), TEXT, 2, NoteType::Comment, "more")
        .unwrap();
    assert_eq!(engine.stats(&git, Path::new("/src/tool")).unwrap().total, 2);
}

#[test]
fn clean_all_empty_spans_repositories() {
    let temp = tempdir().unwrap();
    let storage = StorageConfig::with_root(temp.path().to_path_buf());
    init_session(&storage, &SessionKey::new("github.com", "a", "one", "c1"), "/a", "u").unwrap();
    init_session(&storage, &SessionKey::new("gitlab.com", "b", "two", "c2"), "/b", "u").unwrap();

    let mut engine = AuditEngine::with_storage(storage.clone());
    assert_eq!(engine.clean_all_empty().unwrap(), 2);
    assert!(std::fs::read_dir(storage.sessions_root()).unwrap().next().is_none());
}
