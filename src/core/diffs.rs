//! Pending diff storage: agent-proposed edits awaiting human review.
//!
//! Each diff is one JSON file under `{user}/pending_diffs/`. Diffs are never
//! physically deleted; resolution only moves them through the status machine
//! (`pending` is the only non-terminal state), which keeps the full audit
//! trail of what agents proposed and what reviewers decided.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use tracing::warn;

use crate::core::audit;
use crate::core::error::{self, MemoirError};
use crate::core::store::{self, UserStore};
use crate::core::time;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiffOperation {
    Append,
    Replace,
    FullReplace,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Pending,
    Approved,
    Rejected,
    Superseded,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PendingDiff {
    pub id: String,
    pub block_label: String,
    pub agent_id: String,
    pub operation: DiffOperation,
    /// Snapshot of the substring being replaced; required for `replace`,
    /// used for staleness checking at apply time.
    pub current_value: Option<String>,
    pub proposed_value: String,
    pub reasoning: String,
    pub status: DiffStatus,
    pub created_at: String,
    /// Commit produced by approving this diff.
    pub resolved_commit_id: Option<String>,
    /// Id of the newer diff that obsoleted this one.
    pub superseded_by: Option<String>,
    /// Opt-in: substitute every occurrence of `current_value` instead of the
    /// first. Off unless a proposer explicitly asks for it.
    #[serde(default)]
    pub replace_all: bool,
}

/// Creates a new diff in `pending` status and persists it.
pub fn create(
    store: &UserStore,
    block_label: &str,
    agent_id: &str,
    operation: DiffOperation,
    proposed_value: &str,
    reasoning: &str,
    current_value: Option<&str>,
) -> Result<PendingDiff, MemoirError> {
    store::validate_label(block_label)?;
    store::validate_agent_id(agent_id)?;
    if operation == DiffOperation::Replace && current_value.is_none() {
        return Err(MemoirError::ValidationError(
            "replace diffs must carry current_value (the text being replaced)".to_string(),
        ));
    }

    let diff = PendingDiff {
        id: time::new_diff_id(),
        block_label: block_label.to_string(),
        agent_id: agent_id.to_string(),
        operation,
        current_value: current_value.map(str::to_string),
        proposed_value: proposed_value.to_string(),
        reasoning: reasoning.to_string(),
        status: DiffStatus::Pending,
        created_at: time::now_utc_iso(),
        resolved_commit_id: None,
        superseded_by: None,
        replace_all: false,
    };
    save(store, &diff)?;
    audit::log_event(store, agent_id, "diff.create", &diff.id, "success");
    Ok(diff)
}

/// Loads one diff; `None` when the id is unknown or the file is unreadable.
pub fn get(store: &UserStore, diff_id: &str) -> Result<Option<PendingDiff>, MemoirError> {
    let raw = match fs::read_to_string(store.diff_path(diff_id)) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(error::io_context(format!("diff '{}'", diff_id))(e)),
    };
    match serde_json::from_str(&raw) {
        Ok(diff) => Ok(Some(diff)),
        Err(e) => {
            warn!(user = %store.user_id, diff_id, error = %e, "malformed pending diff file");
            Ok(None)
        }
    }
}

/// Moves a diff to a new status, recording the produced commit on approval.
pub fn update_status(
    store: &UserStore,
    diff_id: &str,
    status: DiffStatus,
    resolved_commit_id: Option<&str>,
) -> Result<PendingDiff, MemoirError> {
    let mut diff = get(store, diff_id)?
        .ok_or_else(|| MemoirError::NotFound(format!("Pending diff '{}'", diff_id)))?;
    diff.status = status;
    if let Some(commit_id) = resolved_commit_id {
        diff.resolved_commit_id = Some(commit_id.to_string());
    }
    save(store, &diff)?;
    Ok(diff)
}

/// Marks every other `pending` diff on `block_label` as superseded by
/// `keep_diff_id`. Returns how many were changed.
///
/// Agents run repeatedly and must not accumulate contradictory proposals
/// against the same block.
pub fn supersede_older(
    store: &UserStore,
    block_label: &str,
    keep_diff_id: &str,
) -> Result<usize, MemoirError> {
    let mut count = 0;
    for mut diff in list_all(store)? {
        if diff.block_label == block_label
            && diff.status == DiffStatus::Pending
            && diff.id != keep_diff_id
        {
            diff.status = DiffStatus::Superseded;
            diff.superseded_by = Some(keep_diff_id.to_string());
            save(store, &diff)?;
            audit::log_event(store, "memoir", "diff.supersede", &diff.id, "success");
            count += 1;
        }
    }
    Ok(count)
}

/// Pending diffs, optionally filtered by block label, oldest first.
pub fn list_pending(
    store: &UserStore,
    block_label: Option<&str>,
) -> Result<Vec<PendingDiff>, MemoirError> {
    let mut pending: Vec<PendingDiff> = list_all(store)?
        .into_iter()
        .filter(|d| d.status == DiffStatus::Pending)
        .filter(|d| block_label.is_none_or(|label| d.block_label == label))
        .collect();
    // Diff ids are ULIDs, so lexicographic order is creation order.
    pending.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(pending)
}

/// Review-backlog summary: how many diffs are pending per block.
pub fn count_pending(store: &UserStore) -> Result<BTreeMap<String, usize>, MemoirError> {
    let mut counts = BTreeMap::new();
    for diff in list_pending(store, None)? {
        *counts.entry(diff.block_label).or_insert(0) += 1;
    }
    Ok(counts)
}

fn save(store: &UserStore, diff: &PendingDiff) -> Result<(), MemoirError> {
    fs::create_dir_all(store.diffs_dir())
        .map_err(error::io_context(format!("diff '{}'", diff.id)))?;
    let payload = serde_json::to_string_pretty(diff).map_err(|e| {
        MemoirError::ValidationError(format!("failed to serialize diff '{}': {}", diff.id, e))
    })?;
    fs::write(store.diff_path(&diff.id), payload)
        .map_err(error::io_context(format!("diff '{}'", diff.id)))
}

fn list_all(store: &UserStore) -> Result<Vec<PendingDiff>, MemoirError> {
    let entries = match fs::read_dir(store.diffs_dir()) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(error::io_context("listing pending diffs")(e)),
    };

    let mut diffs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(error::io_context("listing pending diffs"))?;
        let name = entry.file_name().to_string_lossy().to_string();
        let Some(diff_id) = name.strip_suffix(".json") else {
            continue;
        };
        if let Some(diff) = get(store, diff_id)? {
            diffs.push(diff);
        }
    }
    Ok(diffs)
}
