//! Diff lifecycle orchestration: propose, approve, reject.
//!
//! `approve_diff` is the only path that turns an agent proposal into a
//! committed block version. Validation and body computation are pure; the
//! single durable write is the `write_block` commit, so an application can
//! never be left half-applied.

use crate::core::audit;
use crate::core::blocks;
use crate::core::diffs::{self, DiffOperation, DiffStatus, PendingDiff};
use crate::core::error::MemoirError;
use crate::core::frontmatter;
use crate::core::store::UserStore;

/// Records an agent-proposed edit and supersedes any older pending proposals
/// for the same block. At most one diff per block stays pending.
pub fn propose_edit(
    store: &UserStore,
    block_label: &str,
    agent_id: &str,
    operation: DiffOperation,
    proposed_value: &str,
    reasoning: &str,
    current_value: Option<&str>,
) -> Result<PendingDiff, MemoirError> {
    let diff = diffs::create(
        store,
        block_label,
        agent_id,
        operation,
        proposed_value,
        reasoning,
        current_value,
    )?;
    diffs::supersede_older(store, block_label, &diff.id)?;
    Ok(diff)
}

/// Applies a pending diff: computes the new body, commits it through the
/// block store, marks the diff approved, and supersedes its siblings.
///
/// A `replace` diff whose snapshot no longer occurs in the live body fails
/// with [`MemoirError::StaleDiff`] and stays `pending` for manual resolution;
/// the block is left untouched.
pub fn approve_diff(store: &UserStore, diff_id: &str) -> Result<PendingDiff, MemoirError> {
    let diff = load_pending(store, diff_id)?;

    let current = blocks::read_block(store, &diff.block_label)?.unwrap_or_default();
    let (metadata, current_body) = frontmatter::parse(&current);
    let new_body = compute_new_body(&diff, &current_body)?;
    // Re-attach the block's existing metadata so an approved edit does not
    // strip its schema reference or custom keys.
    let content = frontmatter::format(&metadata, &new_body);

    let message = commit_message(&diff);
    let author = format!("agent:{}", diff.agent_id);
    let commit_id = blocks::write_block(
        store,
        &diff.block_label,
        &content,
        &message,
        &author,
        None,
    )?;

    let approved = diffs::update_status(store, diff_id, DiffStatus::Approved, Some(&commit_id))?;
    diffs::supersede_older(store, &diff.block_label, diff_id)?;
    audit::log_event(store, &author, "diff.approve", diff_id, "success");
    Ok(approved)
}

/// Declines a pending diff without touching the block.
pub fn reject_diff(store: &UserStore, diff_id: &str) -> Result<PendingDiff, MemoirError> {
    let diff = load_pending(store, diff_id)?;
    let rejected = diffs::update_status(store, &diff.id, DiffStatus::Rejected, None)?;
    audit::log_event(store, "reviewer", "diff.reject", diff_id, "success");
    Ok(rejected)
}

fn load_pending(store: &UserStore, diff_id: &str) -> Result<PendingDiff, MemoirError> {
    let diff = diffs::get(store, diff_id)?
        .ok_or_else(|| MemoirError::NotFound(format!("Pending diff '{}'", diff_id)))?;
    if diff.status != DiffStatus::Pending {
        return Err(MemoirError::InvalidState(format!(
            "diff '{}' is {:?}, only pending diffs can be resolved",
            diff_id, diff.status
        )));
    }
    Ok(diff)
}

/// Pure body computation; performs no storage mutation.
fn compute_new_body(diff: &PendingDiff, current_body: &str) -> Result<String, MemoirError> {
    match diff.operation {
        DiffOperation::Append => {
            let trimmed = current_body.trim_end();
            if trimmed.is_empty() {
                Ok(diff.proposed_value.clone())
            } else {
                Ok(format!("{}\n\n{}", trimmed, diff.proposed_value))
            }
        }
        DiffOperation::Replace => {
            // create() guarantees replace diffs carry a snapshot, but diff
            // files are plain JSON a human may have edited.
            let target = diff.current_value.as_deref().ok_or_else(|| {
                MemoirError::ValidationError(format!(
                    "replace diff '{}' has no current_value snapshot",
                    diff.id
                ))
            })?;
            if !current_body.contains(target) {
                return Err(MemoirError::StaleDiff {
                    diff_id: diff.id.clone(),
                    block_label: diff.block_label.clone(),
                });
            }
            if diff.replace_all {
                Ok(current_body.replace(target, &diff.proposed_value))
            } else {
                Ok(current_body.replacen(target, &diff.proposed_value, 1))
            }
        }
        DiffOperation::FullReplace => Ok(diff.proposed_value.clone()),
    }
}

fn commit_message(diff: &PendingDiff) -> String {
    let reasoning = diff.reasoning.lines().next().unwrap_or("").trim();
    if reasoning.is_empty() {
        format!("Apply approved edit {}", diff.id)
    } else {
        format!("Apply approved edit: {}", reasoning)
    }
}
