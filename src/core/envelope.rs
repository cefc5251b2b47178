//! Timestamps, event ids and the JSON response envelope printed by the CLI.

use crate::core::error::LedgerError;
use serde_json::Value as JsonValue;
use ulid::Ulid;

pub const ENVELOPE_VERSION: &str = "1.0.0";

/// Returns unix-epoch seconds with `Z` suffix (e.g. `1771220592Z`).
pub fn now_epoch_z() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{}Z", secs)
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

/// Envelope for a completed invocation. Keys in `extra` are merged at the top level.
pub fn command_envelope(cmd: &str, status: &str, extra: JsonValue) -> JsonValue {
    let mut base = serde_json::json!({
        "envelope_version": ENVELOPE_VERSION,
        "ts": now_epoch_z(),
        "event_id": new_event_id(),
        "cmd": cmd,
        "status": status
    });
    if let (Some(base_obj), Some(extra_obj)) = (base.as_object_mut(), extra.as_object()) {
        for (k, v) in extra_obj {
            base_obj.insert(k.clone(), v.clone());
        }
    }
    base
}

pub fn error_envelope(cmd: &str, err: &LedgerError) -> JsonValue {
    command_envelope(
        cmd,
        "error",
        serde_json::json!({
            "error_kind": err.kind(),
            "error": err.to_string(),
        }),
    )
}
