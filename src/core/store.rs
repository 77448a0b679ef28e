//! Per-user store handle.
//!
//! A [`UserStore`] is an explicit handle to one user's slice of the base
//! directory. Callers construct one per user and pass it into the block,
//! diff, and apply operations; there is no process-wide registry and no
//! shared lock between users. Serializing writers for a single user is the
//! caller's job.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::core::error::MemoirError;

/// Directory holding the working copy of each block, one `{label}.md` per block.
pub const BLOCKS_DIR: &str = "memory-blocks";
/// Directory holding agent-proposed edits, one `{diff_id}.json` per diff.
pub const DIFFS_DIR: &str = "pending_diffs";

/// Handle to a single user's memory store.
///
/// On disk:
/// ```text
/// {base_dir}/{user_id}/memory-blocks/{label}.md
/// {base_dir}/{user_id}/pending_diffs/{diff_id}.json
/// {base_dir}/{user_id}/memory.db
/// {base_dir}/{user_id}/memory.events.jsonl
/// ```
#[derive(Debug, Clone)]
pub struct UserStore {
    pub user_id: String,
    /// Absolute path to the user's store root (`{base_dir}/{user_id}`).
    pub root: PathBuf,
}

impl UserStore {
    pub fn new(base_dir: &Path, user_id: &str) -> Result<Self, MemoirError> {
        validate_user_id(user_id)?;
        Ok(Self {
            user_id: user_id.to_string(),
            root: base_dir.join(user_id),
        })
    }

    pub fn blocks_dir(&self) -> PathBuf {
        self.root.join(BLOCKS_DIR)
    }

    pub fn block_path(&self, label: &str) -> PathBuf {
        self.blocks_dir().join(format!("{}.md", label))
    }

    pub fn diffs_dir(&self) -> PathBuf {
        self.root.join(DIFFS_DIR)
    }

    pub fn diff_path(&self, diff_id: &str) -> PathBuf {
        self.diffs_dir().join(format!("{}.json", diff_id))
    }
}

/// Block labels become file names, so the charset is restricted up front.
pub fn validate_label(label: &str) -> Result<(), MemoirError> {
    let label_re = Regex::new(r"^[a-z0-9][a-z0-9._-]*$").unwrap();
    if label.is_empty() || label.len() > 128 || !label_re.is_match(label) {
        return Err(MemoirError::ValidationError(format!(
            "Invalid block label: '{}'. Labels must be lowercase alphanumeric with '.', '_' or '-'",
            label
        )));
    }
    Ok(())
}

pub fn validate_agent_id(agent_id: &str) -> Result<(), MemoirError> {
    if agent_id.is_empty() || agent_id.contains('/') || agent_id.contains('\\') {
        return Err(MemoirError::ValidationError(format!(
            "Invalid agent id: '{}'",
            agent_id
        )));
    }
    Ok(())
}

fn validate_user_id(user_id: &str) -> Result<(), MemoirError> {
    let user_re = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap();
    if user_id.is_empty() || !user_re.is_match(user_id) {
        return Err(MemoirError::ValidationError(format!(
            "Invalid user id: '{}'",
            user_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_paths_follow_layout() {
        let store = UserStore::new(Path::new("/data"), "u1").unwrap();
        assert_eq!(
            store.block_path("journey"),
            PathBuf::from("/data/u1/memory-blocks/journey.md")
        );
        assert_eq!(
            store.diff_path("01J00000000000000000000000"),
            PathBuf::from("/data/u1/pending_diffs/01J00000000000000000000000.json")
        );
    }

    #[test]
    fn test_label_validation() {
        assert!(validate_label("journey").is_ok());
        assert!(validate_label("student.profile").is_ok());
        assert!(validate_label("module-1_notes").is_ok());
        assert!(validate_label("").is_err());
        assert!(validate_label("Upper").is_err());
        assert!(validate_label("../escape").is_err());
        assert!(validate_label("has space").is_err());
    }

    #[test]
    fn test_user_id_validation() {
        assert!(UserStore::new(Path::new("/data"), "alice-01").is_ok());
        assert!(UserStore::new(Path::new("/data"), "").is_err());
        assert!(UserStore::new(Path::new("/data"), "a/b").is_err());
    }
}
