use heap_replay_protocol::{HeapSlot, StepEntry};
use serde::{Deserialize, Serialize};

use crate::severity::{self, Classification};

/// One heap slot at a point in time.
///
/// `index` is the flat array position, not an identity: the same patient
/// occupies different indices across frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    pub index: usize,
    pub code: String,
    pub name: String,
    pub severity: i32,
    pub label: String,
}

impl NodeView {
    /// A node from the engine's current heap array. Array position is
    /// authoritative for the index.
    pub fn from_slot(index: usize, slot: &HeapSlot) -> Self {
        Self {
            index,
            code: slot.code.clone(),
            name: slot.name.clone(),
            severity: slot.severity,
            label: label_or_classified(Some(&slot.label), slot.severity),
        }
    }

    /// A node from a step snapshot; step entries carry no names.
    pub fn from_step_entry(index: usize, entry: &StepEntry, name: String) -> Self {
        Self {
            index,
            code: entry.code.clone(),
            name,
            severity: entry.severity,
            label: label_or_classified(entry.label.as_deref(), entry.severity),
        }
    }

    pub fn classification(&self) -> Classification {
        severity::classify(self.severity)
    }
}

/// The engine's label when it sent one, otherwise the local 5-tier label.
fn label_or_classified(label: Option<&str>, severity: i32) -> String {
    match label {
        Some(l) if !l.trim().is_empty() => l.to_string(),
        _ => severity::label_for(severity).as_str().to_string(),
    }
}

/// Convert the engine's heap array into node views.
pub fn heap_from_slots(slots: &[HeapSlot]) -> Vec<NodeView> {
    slots
        .iter()
        .enumerate()
        .map(|(i, slot)| NodeView::from_slot(i, slot))
        .collect()
}
