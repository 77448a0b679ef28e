//! Structured blocks end to end: a schema-driven record rendered into a
//! block body, committed, read back, and parsed into typed fields again.

use memoir::core::schema::SchemaRegistry;
use memoir::core::store::UserStore;
use memoir::core::{blocks, frontmatter};
use serde_json::json;
use tempfile::tempdir;

const SCHEMAS: &str = r#"[
    {
        "label": "journey",
        "description": "Course progress",
        "fields": {
            "status": { "type": "string", "default": "onboarding" },
            "module": { "type": "int" },
            "topics": { "type": "list", "max": 3 }
        }
    }
]"#;

#[test]
fn test_structured_block_round_trip_through_store() {
    let tmp = tempdir().unwrap();
    let store = UserStore::new(tmp.path(), "alice").unwrap();
    blocks::init(&store).unwrap();

    let mut registry = SchemaRegistry::new();
    registry.load_json(SCHEMAS).unwrap();
    let schema = registry.get("journey").unwrap();

    let mut record = schema.new_record();
    record.set("status", json!("active")).unwrap();
    record.set("module", json!(2)).unwrap();
    record
        .set("topics", json!(["fractions", "decimals"]))
        .unwrap();

    let body = record.to_memory_string(2000);
    blocks::write_block(&store, "journey", &body, "structured update", "system", Some("journey"))
        .unwrap();

    let stored_body = blocks::read_block_body(&store, "journey").unwrap().unwrap();
    assert_eq!(stored_body, body);

    let meta = blocks::read_block_metadata(&store, "journey")
        .unwrap()
        .unwrap();
    assert_eq!(meta.get("schema").unwrap(), "journey");

    let reparsed = schema.from_memory_string(&stored_body);
    assert_eq!(reparsed.get("status").unwrap(), "active");
    assert_eq!(reparsed.get("module").unwrap(), &json!(2));
    assert_eq!(
        reparsed.get("topics").unwrap(),
        &json!(["fractions", "decimals"])
    );
}

#[test]
fn test_document_format_on_disk() {
    let tmp = tempdir().unwrap();
    let store = UserStore::new(tmp.path(), "alice").unwrap();
    blocks::init(&store).unwrap();

    blocks::write_block(&store, "journey", "the body", "m", "system", Some("journey"))
        .unwrap();

    let raw = std::fs::read_to_string(store.root.join("memory-blocks/journey.md")).unwrap();
    assert!(raw.starts_with("---\nblock: journey\nschema: journey\nupdated_at: "));
    assert!(raw.ends_with("---\n\nthe body"));

    let (meta, body) = frontmatter::parse(&raw);
    assert_eq!(meta.get("block").unwrap(), "journey");
    assert_eq!(body, "the body");
}
