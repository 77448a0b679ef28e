//! Shared timestamp and id helpers.

use chrono::{SecondsFormat, Utc};
use ulid::Ulid;

/// Returns the current UTC time as an RFC3339 string with second precision,
/// e.g. `2026-08-28T14:03:07Z`.
pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn new_commit_id() -> String {
    Ulid::new().to_string()
}

pub fn new_diff_id() -> String {
    Ulid::new().to_string()
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}
