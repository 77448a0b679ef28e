//! Versioned block store: working copies plus an append-only commit log.
//!
//! Each block is a markdown document (frontmatter + body) at
//! `{user}/memory-blocks/{label}.md`. Every write produces exactly one new
//! commit row in the user's `memory.db`; history is never amended. Reads
//! degrade to `Ok(None)` when the block is absent; only filesystem and
//! commit-log failures during writes surface as errors.

use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use tracing::warn;

use crate::core::audit;
use crate::core::db;
use crate::core::error::{self, MemoirError};
use crate::core::frontmatter::{self, Metadata};
use crate::core::store::{self, UserStore};
use crate::core::time;

/// One entry of a block's version history, newest first.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VersionInfo {
    pub commit_id: String,
    pub message: String,
    pub author: String,
    pub timestamp: String,
    pub is_current: bool,
}

/// Idempotent store setup: directories plus the commit log.
pub fn init(store: &UserStore) -> Result<(), MemoirError> {
    db::initialize_memory_db(store)
}

/// Commits a new version of `label` and updates its working copy.
///
/// `content` may carry its own frontmatter, which is preserved; otherwise the
/// whole input becomes the body. The `block` key is forced to `label`, the
/// `schema` key is set when given, and `updated_at` is re-stamped on every
/// write. Returns the new commit id.
pub fn write_block(
    store: &UserStore,
    label: &str,
    content: &str,
    message: &str,
    author: &str,
    schema: Option<&str>,
) -> Result<String, MemoirError> {
    store::validate_label(label)?;
    init(store)?;

    let (mut metadata, body) = frontmatter::parse(content);
    metadata.insert("block".to_string(), label.to_string());
    if let Some(schema) = schema {
        metadata.insert("schema".to_string(), schema.to_string());
    }
    // Stale stamps carried in from the caller's content would misdate the
    // new version.
    metadata.shift_remove("updated_at");
    let document = frontmatter::format(&metadata, &body);

    let commit_id = time::new_commit_id();
    let created_at = time::now_utc_iso();

    // The commit row and the working copy move together: the row is staged,
    // the document goes to a staging file, the transaction commits, and only
    // then is the staging file renamed over the working copy. A failed file
    // write rolls the staged row back; a failed commit leaves the working
    // copy untouched. A rename failure after commit is the one residual gap.
    let mut conn = db::db_connect(&db::memory_db_path(store))?;
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO versions(commit_id, label, content, message, author, created_at)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6)",
        params![commit_id, label, document, message, author, created_at],
    )?;
    let staging = store.blocks_dir().join(format!("{}.md.tmp", label));
    fs::write(&staging, &document)
        .map_err(error::io_context(format!("block '{}'", label)))?;
    tx.commit()?;
    fs::rename(&staging, store.block_path(label))
        .map_err(error::io_context(format!("block '{}'", label)))?;

    audit::log_event(store, author, "block.write", label, "success");
    Ok(commit_id)
}

/// Returns the full current document (frontmatter + body), or `None` if the
/// block has never been written.
pub fn read_block(store: &UserStore, label: &str) -> Result<Option<String>, MemoirError> {
    match fs::read_to_string(store.block_path(label)) {
        Ok(document) => Ok(Some(document)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(error::io_context(format!("block '{}'", label))(e)),
    }
}

pub fn read_block_body(store: &UserStore, label: &str) -> Result<Option<String>, MemoirError> {
    Ok(read_block(store, label)?.map(|doc| frontmatter::parse(&doc).1))
}

pub fn read_block_metadata(store: &UserStore, label: &str) -> Result<Option<Metadata>, MemoirError> {
    Ok(read_block(store, label)?.map(|doc| frontmatter::parse(&doc).0))
}

/// Labels of every block with a working copy.
pub fn list_blocks(store: &UserStore) -> Result<BTreeSet<String>, MemoirError> {
    let mut labels = BTreeSet::new();
    let entries = match fs::read_dir(store.blocks_dir()) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(labels),
        Err(e) => return Err(error::io_context("listing blocks")(e)),
    };
    for entry in entries {
        let entry = entry.map_err(error::io_context("listing blocks"))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(label) = name.strip_suffix(".md") {
            labels.insert(label.to_string());
        }
    }
    Ok(labels)
}

/// Version history for `label`, newest first. `is_current` is true only at
/// index 0. Returns an empty list for unknown blocks.
pub fn get_block_history(
    store: &UserStore,
    label: &str,
    limit: usize,
) -> Result<Vec<VersionInfo>, MemoirError> {
    let db_path = db::memory_db_path(store);
    if !db_path.exists() {
        return Ok(Vec::new());
    }

    let conn = db::db_connect(&db_path)?;
    let mut stmt = conn.prepare(
        "SELECT commit_id, message, author, created_at FROM versions
         WHERE label = ?1 ORDER BY rowid DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![label, limit as i64], |row| {
        Ok(VersionInfo {
            commit_id: row.get(0)?,
            message: row.get(1)?,
            author: row.get(2)?,
            timestamp: row.get(3)?,
            is_current: false,
        })
    })?;

    let mut history = Vec::new();
    for row in rows {
        history.push(row?);
    }
    if let Some(first) = history.first_mut() {
        first.is_current = true;
    }
    Ok(history)
}

/// Reads a block's content as of a specific historical commit. Best-effort:
/// any lookup failure yields `None` with a logged warning.
pub fn get_block_at_version(
    store: &UserStore,
    label: &str,
    commit_id: &str,
) -> Result<Option<String>, MemoirError> {
    let db_path = db::memory_db_path(store);
    if !db_path.exists() {
        return Ok(None);
    }

    let lookup = db::db_connect(&db_path).and_then(|conn| {
        conn.query_row(
            "SELECT content FROM versions WHERE label = ?1 AND commit_id = ?2",
            params![label, commit_id],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(MemoirError::RusqliteError)
    });

    match lookup {
        Ok(Some(content)) => Ok(Some(content)),
        Ok(None) => {
            warn!(user = %store.user_id, label, commit_id, "version not found in commit log");
            Ok(None)
        }
        Err(e) => {
            warn!(user = %store.user_id, label, commit_id, error = %e, "version lookup failed");
            Ok(None)
        }
    }
}
