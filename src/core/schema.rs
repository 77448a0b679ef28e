//! Declarative block schemas and the structured-record codec.
//!
//! A [`BlockSchema`] describes the typed fields a structured block may carry.
//! Schemas are declarative data loaded from configuration; a record is a
//! generic ordered field→value container interpreted against its schema, not
//! a generated type. The codec renders a record to the compact
//! `[FIELD_NAME] value` memory form and parses it back best-effort: parsing
//! must never crash a caller's turn, so unknown labels are ignored and
//! coercion failures fall back to the field default.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::core::error::MemoirError;
use crate::core::store;

/// Cap on rendered list items when a field schema carries no `max`.
pub const DEFAULT_LIST_MAX: usize = 10;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    List,
    Datetime,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub default: Option<JsonValue>,
    /// Allowed values for string fields; empty means unconstrained.
    #[serde(default)]
    pub options: Vec<String>,
    /// Item cap for list fields.
    #[serde(default)]
    pub max: Option<usize>,
    #[serde(default)]
    pub description: String,
}

impl FieldSchema {
    /// The schema default coerced to the field type, or the type's zero value.
    pub fn default_value(&self) -> JsonValue {
        if let Some(default) = &self.default
            && let Some(coerced) = coerce(self.field_type, default.clone())
        {
            return coerced;
        }
        match self.field_type {
            FieldType::String | FieldType::Datetime => JsonValue::String(String::new()),
            FieldType::Int => JsonValue::from(0i64),
            FieldType::Float => JsonValue::from(0.0f64),
            FieldType::Bool => JsonValue::Bool(false),
            FieldType::List => JsonValue::Array(Vec::new()),
        }
    }
}

/// Ordered field map describing one structured block shape.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BlockSchema {
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub fields: IndexMap<String, FieldSchema>,
}

impl BlockSchema {
    /// New record with every field at its type-checked default.
    pub fn new_record(&self) -> StructuredRecord {
        let values = self
            .fields
            .iter()
            .map(|(name, field)| (name.clone(), field.default_value()))
            .collect();
        StructuredRecord {
            schema: self.clone(),
            values,
        }
    }

    /// Best-effort reverse parse of the compact memory form.
    ///
    /// Matching on the bracketed label is case-insensitive. Unknown labels
    /// are skipped; a value that fails type coercion leaves its field at the
    /// default.
    pub fn from_memory_string(&self, text: &str) -> StructuredRecord {
        let line_re = Regex::new(r"^\[([^\]]+)\]\s*(.*)$").unwrap();
        let by_upper: IndexMap<String, String> = self
            .fields
            .keys()
            .map(|name| (name.to_uppercase(), name.clone()))
            .collect();

        let mut record = self.new_record();
        for line in text.lines() {
            let Some(caps) = line_re.captures(line.trim_end()) else {
                continue;
            };
            let Some(field_name) = by_upper.get(&caps[1].trim().to_uppercase()) else {
                continue;
            };
            let field = &self.fields[field_name];
            if let Some(value) = parse_field_value(field.field_type, caps[2].trim()) {
                record.values.insert(field_name.clone(), value);
            }
        }
        record
    }
}

/// Ordered field→value container interpreted against a [`BlockSchema`].
#[derive(Debug, Clone)]
pub struct StructuredRecord {
    schema: BlockSchema,
    values: IndexMap<String, JsonValue>,
}

impl StructuredRecord {
    pub fn schema(&self) -> &BlockSchema {
        &self.schema
    }

    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.values.get(field)
    }

    /// Sets a field, coercing the value to the field's declared type.
    pub fn set(&mut self, field: &str, value: JsonValue) -> Result<(), MemoirError> {
        let field_schema = self.schema.fields.get(field).ok_or_else(|| {
            MemoirError::ValidationError(format!(
                "Unknown field '{}' for schema '{}'",
                field, self.schema.label
            ))
        })?;
        let coerced = coerce(field_schema.field_type, value).ok_or_else(|| {
            MemoirError::ValidationError(format!(
                "Value for field '{}' is not a valid {:?}",
                field, field_schema.field_type
            ))
        })?;
        if !field_schema.options.is_empty()
            && let JsonValue::String(s) = &coerced
            && !field_schema.options.iter().any(|o| o == s)
        {
            return Err(MemoirError::ValidationError(format!(
                "Value '{}' for field '{}' is not one of its options",
                s, field
            )));
        }
        self.values.insert(field.to_string(), coerced);
        Ok(())
    }

    /// Renders the populated fields as `[FIELD_NAME] value` lines.
    ///
    /// Fields equal to their default, empty, or absent are omitted. List
    /// fields are capped at the schema `max` (fallback
    /// [`DEFAULT_LIST_MAX`]) and joined with `; `. The final output is
    /// hard-truncated to `max_chars` from the left; the cut is blunt and can
    /// split a field line.
    pub fn to_memory_string(&self, max_chars: usize) -> String {
        let mut lines = Vec::new();
        for (name, field) in &self.schema.fields {
            let Some(value) = self.values.get(name) else {
                continue;
            };
            if *value == field.default_value() || is_empty_value(value) {
                continue;
            }
            let rendered = match value {
                JsonValue::Array(items) => {
                    let cap = field.max.unwrap_or(DEFAULT_LIST_MAX);
                    items
                        .iter()
                        .take(cap)
                        .map(scalar_to_string)
                        .collect::<Vec<_>>()
                        .join("; ")
                }
                other => scalar_to_string(other),
            };
            lines.push(format!("[{}] {}", name.to_uppercase(), rendered));
        }

        let out = lines.join("\n");
        if out.chars().count() > max_chars {
            out.chars().take(max_chars).collect()
        } else {
            out
        }
    }
}

/// Holds the registered schemas for one configuration load.
///
/// Owned by the caller and rebuilt on configuration reload; there is no
/// process-wide registry.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, BlockSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, schema: BlockSchema) -> Result<(), MemoirError> {
        store::validate_label(&schema.label)?;
        if schema.fields.is_empty() {
            return Err(MemoirError::ValidationError(format!(
                "Schema '{}' declares no fields",
                schema.label
            )));
        }
        self.schemas.insert(schema.label.clone(), schema);
        Ok(())
    }

    pub fn get(&self, block_name: &str) -> Option<&BlockSchema> {
        self.schemas.get(block_name)
    }

    pub fn list(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    /// Drops every registered schema; used for configuration hot-reload.
    pub fn clear(&mut self) {
        self.schemas.clear();
    }

    /// Registers every schema in a JSON array, replacing same-label entries.
    /// Returns how many were registered.
    pub fn load_json(&mut self, json: &str) -> Result<usize, MemoirError> {
        let schemas: Vec<BlockSchema> = serde_json::from_str(json)
            .map_err(|e| MemoirError::ValidationError(format!("Invalid schema JSON: {}", e)))?;
        let count = schemas.len();
        for schema in schemas {
            self.register(schema)?;
        }
        Ok(count)
    }
}

fn is_empty_value(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn scalar_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Coerces a JSON value to the declared field type. `None` means the value
/// cannot represent that type.
fn coerce(field_type: FieldType, value: JsonValue) -> Option<JsonValue> {
    match field_type {
        FieldType::String => match value {
            JsonValue::String(_) => Some(value),
            JsonValue::Number(n) => Some(JsonValue::String(n.to_string())),
            JsonValue::Bool(b) => Some(JsonValue::String(b.to_string())),
            _ => None,
        },
        FieldType::Int => match value {
            JsonValue::Number(n) if n.is_i64() => Some(JsonValue::Number(n)),
            JsonValue::String(s) => s.trim().parse::<i64>().ok().map(JsonValue::from),
            _ => None,
        },
        FieldType::Float => match value {
            JsonValue::Number(n) => n.as_f64().and_then(serde_json::Number::from_f64).map(JsonValue::Number),
            JsonValue::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(JsonValue::Number),
            _ => None,
        },
        FieldType::Bool => match value {
            JsonValue::Bool(_) => Some(value),
            JsonValue::String(s) => parse_bool(&s).map(JsonValue::Bool),
            _ => None,
        },
        FieldType::List => match value {
            JsonValue::Array(items) => Some(JsonValue::Array(
                items
                    .into_iter()
                    .map(|item| match item {
                        JsonValue::String(_) => item,
                        other => JsonValue::String(scalar_to_string(&other)),
                    })
                    .collect(),
            )),
            JsonValue::String(s) => Some(JsonValue::Array(vec![JsonValue::String(s)])),
            _ => None,
        },
        FieldType::Datetime => match value {
            JsonValue::String(s) => chrono::DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|_| JsonValue::String(s.trim().to_string())),
            _ => None,
        },
    }
}

/// Parses one rendered field value back to its typed form. `None` leaves the
/// field at its default.
fn parse_field_value(field_type: FieldType, raw: &str) -> Option<JsonValue> {
    match field_type {
        FieldType::List => {
            let items: Vec<JsonValue> = raw
                .split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| JsonValue::String(s.to_string()))
                .collect();
            Some(JsonValue::Array(items))
        }
        _ => coerce(field_type, JsonValue::String(raw.to_string())),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
