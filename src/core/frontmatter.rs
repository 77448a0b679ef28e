//! Frontmatter codec: a `---`-delimited metadata header ahead of a markdown body.
//!
//! Parsing is total. Any document that does not carry a well-formed header
//! degrades to an empty metadata map with the entire input treated as body;
//! a malformed block on disk must never fail a read.

use indexmap::IndexMap;

use crate::core::time;

pub type Metadata = IndexMap<String, String>;

/// Keys emitted first, in this order, so successive versions diff cleanly.
const LEADING_KEYS: [&str; 3] = ["block", "schema", "updated_at"];

/// Splits a document into its metadata map and body.
pub fn parse(document: &str) -> (Metadata, String) {
    let fallback = || (Metadata::new(), document.to_string());

    let Some(after_open) = document.strip_prefix("---\n") else {
        return fallback();
    };

    let (header, body) = if let Some(idx) = after_open.find("\n---\n") {
        (&after_open[..idx], &after_open[idx + 5..])
    } else if let Some(header) = after_open.strip_suffix("\n---") {
        (header, "")
    } else {
        return fallback();
    };

    let Ok(serde_yaml::Value::Mapping(mapping)) =
        serde_yaml::from_str::<serde_yaml::Value>(header)
    else {
        return fallback();
    };

    let mut metadata = Metadata::new();
    for (key, value) in mapping {
        let serde_yaml::Value::String(key) = key else {
            continue;
        };
        let value = match value {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            serde_yaml::Value::Null => String::new(),
            // Nested structures are not part of the block metadata model.
            _ => continue,
        };
        metadata.insert(key, value);
    }

    // The formatter writes one blank line between the header and the body.
    let body = body.strip_prefix('\n').unwrap_or(body);
    (metadata, body.to_string())
}

/// Renders a document from a metadata map and body.
///
/// Stamps `updated_at` with the current UTC time when the map lacks one, and
/// emits keys in a deterministic order: `block`, `schema`, `updated_at`, then
/// the remaining keys in insertion order.
pub fn format(metadata: &Metadata, body: &str) -> String {
    let mut metadata = metadata.clone();
    if !metadata.contains_key("updated_at") {
        metadata.insert("updated_at".to_string(), time::now_utc_iso());
    }

    let mut out = String::from("---\n");
    for key in LEADING_KEYS {
        if let Some(value) = metadata.get(key) {
            push_entry(&mut out, key, value);
        }
    }
    for (key, value) in &metadata {
        if !LEADING_KEYS.contains(&key.as_str()) {
            push_entry(&mut out, key, value);
        }
    }
    out.push_str("---\n\n");
    out.push_str(body);
    out
}

/// Emits one header entry through the YAML serializer, so values that need
/// quoting (brackets, colons, newlines) survive the next parse as the same
/// string instead of being re-read as some other YAML shape.
fn push_entry(out: &mut String, key: &str, value: &str) {
    let mut entry = serde_yaml::Mapping::new();
    entry.insert(
        serde_yaml::Value::String(key.to_string()),
        serde_yaml::Value::String(value.to_string()),
    );
    // String-to-string mappings always serialize; the Err arm is unreachable.
    if let Ok(rendered) = serde_yaml::to_string(&entry) {
        out.push_str(&rendered);
    }
}
