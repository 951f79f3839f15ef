use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Everything the external patient/heap engine reports after a queue
/// mutation (insert, process, remove, reset, demo seeding).
///
/// This is the single input boundary of the replay engine:
///
/// ```text
///   engine ──▶ DashboardSnapshot ──▶ Frame Builder ──▶ Frame[] ──▶ Playback ──▶ RenderModel ──▶ Surface
///                  (this)
/// ```
///
/// Every field defaults when absent so that partial payloads still load;
/// the replay engine degrades rather than rejecting them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardSnapshot {
    /// Patients in priority order (highest first).
    pub queue: Vec<PatientRecord>,
    /// The heap in flat array order; position is significant.
    pub heap_array: Vec<HeapSlot>,
    /// Aggregate counts, if the engine supplied them.
    pub stats: Option<QueueStats>,
    /// Operation log, newest first.
    pub logs: Vec<LogEntry>,
    /// Steps of the most recent operation.
    pub steps: Vec<Step>,
    /// Severity ranges and their labels as the engine names them.
    pub severity_mapping: Vec<SeverityRange>,
}

impl DashboardSnapshot {
    /// Single-record lookup by patient code, searching the queue first and
    /// then the heap array.
    pub fn patient(&self, code: &str) -> Option<PatientRecord> {
        if let Some(p) = self.queue.iter().find(|p| p.code == code) {
            return Some(p.clone());
        }
        self.heap_array
            .iter()
            .find(|s| s.code == code)
            .map(|s| PatientRecord {
                code: s.code.clone(),
                name: s.name.clone(),
                admitted_at: s.admitted_at.clone(),
                severity: s.severity,
                label: s.label.clone(),
                admitted_at_display: None,
            })
    }
}

/// One patient in the priority queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientRecord {
    pub code: String,
    pub name: String,
    /// ISO-8601 admission time.
    #[serde(alias = "admittedAt")]
    pub admitted_at: String,
    pub severity: i32,
    pub label: String,
    /// Pre-formatted admission time for display.
    #[serde(rename = "admittedAtDisplay", skip_serializing_if = "Option::is_none")]
    pub admitted_at_display: Option<String>,
}

/// One heap slot of the current heap array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeapSlot {
    /// Flat index as reported by the engine. Array position wins when the
    /// two disagree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub code: String,
    pub name: String,
    pub severity: i32,
    pub label: String,
    #[serde(alias = "admittedAt")]
    pub admitted_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueStats {
    pub total: u32,
    /// Patient count per severity label.
    pub buckets: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEntry {
    pub message: String,
    /// Wall-clock time of the entry, already formatted by the engine.
    pub time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityRange {
    /// "10", "7-9", ...
    pub range: String,
    pub label: String,
}

/// One discrete operation reported by the engine (comparison, swap,
/// insertion, removal), together with the heap array *after* it ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Step {
    pub title: String,
    pub description: String,
    /// Post-step heap snapshot. `None` and `Some(vec![])` are treated alike.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array: Option<Vec<StepEntry>>,
    /// Indices being looked at (at most two are meaningful).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<Vec<usize>>,
    /// Indices being exchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap: Option<Vec<usize>>,
}

/// A heap slot as carried inside a step. Names are not included; they are
/// resolved against the current queue by code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub code: String,
    pub severity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENGINE_PAYLOAD: &str = r#"{
        "queue": [
            {"code": "BN7", "name": "Le Chi", "admitted_at": "2024-05-01T08:00:00",
             "severity": 9, "label": "High-risk", "admittedAtDisplay": "01/05/2024 08:00"}
        ],
        "heapArray": [
            {"index": 0, "code": "BN7", "name": "Le Chi", "severity": 9, "label": "High-risk",
             "admitted_at": "2024-05-01T08:00:00"}
        ],
        "stats": {"total": 1, "buckets": {"High-risk": 1}},
        "logs": [{"time": "08:00:01", "message": "Added patient BN7"}],
        "steps": [
            {"title": "Step 1: Added to array", "description": "Append BN7",
             "focus": [0], "swap": [], "array": [{"index": 0, "code": "BN7", "severity": 9, "label": "High-risk"}]}
        ],
        "severityMapping": [{"range": "10", "label": "Critical"}]
    }"#;

    #[test]
    fn deserializes_engine_keys() {
        let snap: DashboardSnapshot = serde_json::from_str(ENGINE_PAYLOAD).expect("parse");
        assert_eq!(snap.queue[0].admitted_at_display.as_deref(), Some("01/05/2024 08:00"));
        assert_eq!(snap.heap_array[0].index, Some(0));
        assert_eq!(snap.stats.as_ref().map(|s| s.total), Some(1));
        assert_eq!(snap.steps[0].focus.as_deref(), Some(&[0][..]));
        assert_eq!(snap.steps[0].swap.as_deref(), Some(&[][..]));
        assert_eq!(snap.severity_mapping[0].label, "Critical");
    }

    #[test]
    fn missing_fields_default() {
        let snap: DashboardSnapshot =
            serde_json::from_str(r#"{"steps": [{"title": "x"}]}"#).expect("parse");
        assert!(snap.queue.is_empty());
        assert!(snap.stats.is_none());
        assert_eq!(snap.steps[0].array, None);
        assert_eq!(snap.steps[0].description, "");
    }

    #[test]
    fn camel_case_admission_alias() {
        let p: PatientRecord =
            serde_json::from_str(r#"{"code": "A", "admittedAt": "2024-01-01T00:00:00Z"}"#)
                .expect("parse");
        assert_eq!(p.admitted_at, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn patient_lookup_falls_back_to_heap() {
        let mut snap: DashboardSnapshot = serde_json::from_str(ENGINE_PAYLOAD).expect("parse");
        snap.queue.clear();
        let p = snap.patient("BN7").expect("found in heap");
        assert_eq!(p.name, "Le Chi");
        assert!(snap.patient("BN404").is_none());
    }
}
