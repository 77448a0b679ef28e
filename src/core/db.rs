use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{self, MemoirError};
use crate::core::schemas;
use crate::core::store::UserStore;

pub fn db_connect(db_path: &Path) -> Result<Connection, MemoirError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(MemoirError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(MemoirError::RusqliteError)?;
    Ok(conn)
}

pub fn memory_db_path(store: &UserStore) -> PathBuf {
    store.root.join(schemas::MEMORY_DB_NAME)
}

/// Creates the user's storage root, block/diff directories, and commit log.
/// Idempotent: existing directories and tables are left untouched.
pub fn initialize_memory_db(store: &UserStore) -> Result<(), MemoirError> {
    fs::create_dir_all(store.blocks_dir())
        .map_err(error::io_context(format!("init {}", store.user_id)))?;
    fs::create_dir_all(store.diffs_dir())
        .map_err(error::io_context(format!("init {}", store.user_id)))?;

    let conn = db_connect(&memory_db_path(store))?;
    conn.execute(schemas::VERSIONS_SCHEMA, [])?;
    conn.execute(schemas::VERSIONS_LABEL_INDEX, [])?;
    Ok(())
}
