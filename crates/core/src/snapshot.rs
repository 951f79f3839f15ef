//! Loading engine payloads into a [`DashboardSnapshot`].

use heap_replay_protocol::{DashboardSnapshot, Step};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unable to detect snapshot shape")]
    UnknownShape,
}

/// Top-level keys of a dashboard object. Any one of them is enough.
const DASHBOARD_KEYS: [&str; 6] = ["queue", "heapArray", "stats", "logs", "steps", "severityMapping"];

/// Auto-detect the payload shape and parse it.
///
/// Detection strategy:
/// 1. A mutation response `{ "message": …, "state": { … } }` unwraps `state`.
/// 2. An object with any dashboard key is the dashboard itself.
/// 3. A top-level array is a bare step list.
pub fn parse_snapshot(data: &[u8]) -> Result<DashboardSnapshot, SnapshotError> {
    let value: Value = serde_json::from_slice(data)?;

    if let Some(obj) = value.as_object() {
        if let Some(state) = obj.get("state")
            && state.is_object()
        {
            if let Some(message) = obj.get("message").and_then(Value::as_str) {
                tracing::info!(message, "engine response");
            }
            return Ok(serde_json::from_value(state.clone())?);
        }
        if DASHBOARD_KEYS.iter().any(|k| obj.contains_key(*k)) {
            return Ok(serde_json::from_value(value)?);
        }
    }

    if value.is_array() {
        let steps: Vec<Step> = serde_json::from_value(value)?;
        return Ok(DashboardSnapshot {
            steps,
            ..DashboardSnapshot::default()
        });
    }

    Err(SnapshotError::UnknownShape)
}
