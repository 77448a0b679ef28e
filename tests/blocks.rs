use memoir::core::blocks;
use memoir::core::store::UserStore;
use tempfile::tempdir;

fn store(base: &std::path::Path) -> UserStore {
    let store = UserStore::new(base, "alice").unwrap();
    blocks::init(&store).unwrap();
    store
}

#[test]
fn test_write_then_read_body_is_exact() {
    let tmp = tempdir().unwrap();
    let store = store(tmp.path());

    blocks::write_block(
        &store,
        "journey",
        "status: onboarding",
        "initial",
        "system",
        None,
    )
    .unwrap();

    let body = blocks::read_block_body(&store, "journey").unwrap().unwrap();
    assert_eq!(body, "status: onboarding");
}

#[test]
fn test_write_stamps_metadata() {
    let tmp = tempdir().unwrap();
    let store = store(tmp.path());

    blocks::write_block(&store, "journey", "body", "m", "system", Some("journey_v1")).unwrap();

    let meta = blocks::read_block_metadata(&store, "journey")
        .unwrap()
        .unwrap();
    assert_eq!(meta.get("block").unwrap(), "journey");
    assert_eq!(meta.get("schema").unwrap(), "journey_v1");
    assert!(meta.contains_key("updated_at"));
}

#[test]
fn test_write_preserves_embedded_frontmatter() {
    let tmp = tempdir().unwrap();
    let store = store(tmp.path());

    let content = "---\nblock: journey\nsource: import\n---\n\nthe body";
    blocks::write_block(&store, "journey", content, "m", "system", None).unwrap();

    let meta = blocks::read_block_metadata(&store, "journey")
        .unwrap()
        .unwrap();
    assert_eq!(meta.get("source").unwrap(), "import");
    let body = blocks::read_block_body(&store, "journey").unwrap().unwrap();
    assert_eq!(body, "the body");
}

#[test]
fn test_absent_block_reads_none() {
    let tmp = tempdir().unwrap();
    let store = store(tmp.path());

    assert!(blocks::read_block(&store, "student").unwrap().is_none());
    assert!(blocks::read_block_body(&store, "student").unwrap().is_none());
    assert!(
        blocks::read_block_metadata(&store, "student")
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_list_blocks() {
    let tmp = tempdir().unwrap();
    let store = store(tmp.path());

    assert!(blocks::list_blocks(&store).unwrap().is_empty());

    blocks::write_block(&store, "journey", "a", "m", "system", None).unwrap();
    blocks::write_block(&store, "student", "b", "m", "system", None).unwrap();

    let labels = blocks::list_blocks(&store).unwrap();
    assert_eq!(
        labels.into_iter().collect::<Vec<_>>(),
        vec!["journey", "student"]
    );
}

#[test]
fn test_history_is_newest_first_with_single_current() {
    let tmp = tempdir().unwrap();
    let store = store(tmp.path());

    let c1 = blocks::write_block(&store, "journey", "v1", "first", "system", None).unwrap();
    let c2 = blocks::write_block(&store, "journey", "v2", "second", "agent:tutor", None).unwrap();
    let c3 = blocks::write_block(&store, "journey", "v3", "third", "system", None).unwrap();

    let history = blocks::get_block_history(&store, "journey", 10).unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].commit_id, c3);
    assert_eq!(history[1].commit_id, c2);
    assert_eq!(history[2].commit_id, c1);
    assert!(history[0].is_current);
    assert!(!history[1].is_current);
    assert!(!history[2].is_current);
    assert_eq!(history[1].author, "agent:tutor");
    assert_eq!(history[2].message, "first");
}

#[test]
fn test_history_respects_limit() {
    let tmp = tempdir().unwrap();
    let store = store(tmp.path());

    for i in 0..5 {
        blocks::write_block(&store, "journey", &format!("v{}", i), "m", "system", None).unwrap();
    }
    let history = blocks::get_block_history(&store, "journey", 2).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].is_current);
}

#[test]
fn test_read_at_version() {
    let tmp = tempdir().unwrap();
    let store = store(tmp.path());

    let c1 = blocks::write_block(&store, "journey", "old body", "m", "system", None).unwrap();
    blocks::write_block(&store, "journey", "new body", "m", "system", None).unwrap();

    let old = blocks::get_block_at_version(&store, "journey", &c1)
        .unwrap()
        .unwrap();
    assert!(old.ends_with("old body"));

    // Unknown ids degrade to None, never an error.
    assert!(
        blocks::get_block_at_version(&store, "journey", "01ARZ3NDEKTSV4RRFFQ69G5FAV")
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_working_copy_matches_commit_log_head() {
    let tmp = tempdir().unwrap();
    let store = store(tmp.path());

    blocks::write_block(&store, "journey", "v1", "first", "system", None).unwrap();
    let head = blocks::write_block(&store, "journey", "v2", "second", "system", None).unwrap();

    // The working copy is exactly the content of the newest commit; no
    // staging file is left behind.
    let on_disk = std::fs::read_to_string(store.root.join("memory-blocks/journey.md")).unwrap();
    let committed = blocks::get_block_at_version(&store, "journey", &head)
        .unwrap()
        .unwrap();
    assert_eq!(on_disk, committed);

    let names: Vec<String> = std::fs::read_dir(store.root.join("memory-blocks"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["journey.md"]);
}

#[test]
fn test_metadata_values_survive_rewrites() {
    // Values needing YAML quoting must survive a write, a read, and a
    // second write built from the read-back document.
    let tmp = tempdir().unwrap();
    let store = store(tmp.path());

    blocks::write_block(&store, "journey", "body", "m", "system", Some("[v1]")).unwrap();
    let meta = blocks::read_block_metadata(&store, "journey")
        .unwrap()
        .unwrap();
    assert_eq!(meta.get("schema").unwrap(), "[v1]");

    let doc = blocks::read_block(&store, "journey").unwrap().unwrap();
    blocks::write_block(&store, "journey", &doc, "m2", "system", None).unwrap();

    let meta = blocks::read_block_metadata(&store, "journey")
        .unwrap()
        .unwrap();
    assert_eq!(meta.get("schema").unwrap(), "[v1]");
    assert_eq!(
        blocks::read_block_body(&store, "journey").unwrap().unwrap(),
        "body"
    );
}

#[test]
fn test_init_is_idempotent() {
    let tmp = tempdir().unwrap();
    let store = UserStore::new(tmp.path(), "alice").unwrap();
    blocks::init(&store).unwrap();
    blocks::write_block(&store, "journey", "v1", "m", "system", None).unwrap();
    blocks::init(&store).unwrap();

    assert_eq!(blocks::get_block_history(&store, "journey", 10).unwrap().len(), 1);
    assert!(blocks::read_block(&store, "journey").unwrap().is_some());
}

#[test]
fn test_invalid_label_is_rejected() {
    let tmp = tempdir().unwrap();
    let store = store(tmp.path());
    let err = blocks::write_block(&store, "../escape", "x", "m", "system", None).unwrap_err();
    assert!(matches!(
        err,
        memoir::core::error::MemoirError::ValidationError(_)
    ));
}

#[test]
fn test_stores_are_isolated_per_user() {
    let tmp = tempdir().unwrap();
    let alice = store(tmp.path());
    let bob = UserStore::new(tmp.path(), "bob").unwrap();
    blocks::init(&bob).unwrap();

    blocks::write_block(&alice, "journey", "alice data", "m", "system", None).unwrap();

    assert!(blocks::read_block(&bob, "journey").unwrap().is_none());
    assert!(blocks::get_block_history(&bob, "journey", 10).unwrap().is_empty());
}
