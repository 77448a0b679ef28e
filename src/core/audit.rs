//! Append-only mutation audit log.
//!
//! Every durable mutation against a user's store (block commits, diff
//! creation and resolution) is recorded as one JSON line in
//! `{user}/memory.events.jsonl`. The log is advisory: a failed append is
//! logged and swallowed so it can never fail the mutation it describes.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use tracing::warn;

use crate::core::store::UserStore;
use crate::core::time;

pub const AUDIT_LOG_NAME: &str = "memory.events.jsonl";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuditEvent {
    pub ts: String,
    pub event_id: String,
    pub actor: String,
    pub op: String,
    pub target: String,
    pub status: String,
}

/// Appends one event to the user's audit log, best-effort.
pub fn log_event(store: &UserStore, actor: &str, op: &str, target: &str, status: &str) {
    let ev = AuditEvent {
        ts: time::now_utc_iso(),
        event_id: time::new_event_id(),
        actor: actor.to_string(),
        op: op.to_string(),
        target: target.to_string(),
        status: status.to_string(),
    };

    let path = store.root.join(AUDIT_LOG_NAME);
    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .and_then(|mut f| writeln!(f, "{}", serde_json::to_string(&ev).unwrap_or_default()));

    if let Err(e) = result {
        warn!(user = %store.user_id, op, target, error = %e, "audit log append failed");
    }
}
