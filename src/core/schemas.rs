//! Database schema definitions for the per-user commit log.
//!
//! Each user directory carries one SQLite database, `memory.db`, holding the
//! append-only version log for that user's blocks. Working copies and pending
//! diffs are plain files next to it; only history lives in SQLite.

pub const MEMORY_DB_NAME: &str = "memory.db";

/// Append-only commit log. One row per `write_block` call; rows are never
/// updated or deleted. `rowid` gives the commit order within a label.
pub const VERSIONS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS versions (
        commit_id TEXT PRIMARY KEY,
        label TEXT NOT NULL,
        content TEXT NOT NULL,
        message TEXT NOT NULL,
        author TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
";

pub const VERSIONS_LABEL_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_versions_label ON versions(label)";
