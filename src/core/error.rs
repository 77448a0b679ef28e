use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoirError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error on {context}: {source}")]
    IoError {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error(
        "Stale diff {diff_id}: the replace target is no longer present in block '{block_label}' - the block changed since this edit was proposed"
    )]
    StaleDiff { diff_id: String, block_label: String },
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Attaches the originating block/diff identifier to a filesystem error.
pub fn io_context(context: impl Into<String>) -> impl FnOnce(io::Error) -> MemoirError {
    let context = context.into();
    move |source| MemoirError::IoError { context, source }
}
