//! Frame builder: turns the engine's step records into a seekable timeline.
//!
//! The engine reports only *post-step* snapshots, so the state shown before
//! the first step has to be reconstructed. Everything else is a direct
//! projection of one step onto one frame.

use std::collections::HashMap;

use heap_replay_protocol::{DashboardSnapshot, Step, StepEntry};
use thiserror::Error;

use crate::model::{Frame, Highlight, HighlightKind, NodeView, heap_from_slots};

/// Description of the synthetic frame that precedes the first step.
pub const INITIAL_DESCRIPTION: &str = "Initial state";

/// Title fragments the engine uses for "appended to the end of the array".
/// Matched case-insensitively.
const INSERT_TITLE_MARKERS: &[&str] = &[
    "added to array",
    "add to array",
    "inserted into array",
    "insert into array",
    "thêm vào mảng",
];

#[derive(Debug, Error)]
enum FrameBuildError {
    #[error("built {actual} frames for {steps} steps")]
    FrameCount { steps: usize, actual: usize },
    #[error("frame {frame} lost its heap after a non-empty predecessor")]
    EmptiedHeap { frame: usize },
}

/// Code → display name, taken from the engine's current queue and heap.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    names: HashMap<String, String>,
}

impl NameIndex {
    pub fn from_heap(heap: &[NodeView]) -> Self {
        let mut index = Self::default();
        for node in heap {
            index.insert(&node.code, &node.name);
        }
        index
    }

    pub fn from_snapshot(snapshot: &DashboardSnapshot) -> Self {
        let mut index = Self::default();
        for slot in &snapshot.heap_array {
            index.insert(&slot.code, &slot.name);
        }
        for patient in &snapshot.queue {
            index.insert(&patient.code, &patient.name);
        }
        index
    }

    fn insert(&mut self, code: &str, name: &str) {
        if !name.is_empty() {
            self.names.insert(code.to_string(), name.to_string());
        }
    }

    /// The patient's name, or empty when the code is unknown.
    pub fn name(&self, code: &str) -> String {
        self.names.get(code).cloned().unwrap_or_default()
    }
}

/// Build the frame sequence for `steps`, resolving names against the
/// current heap.
///
/// Never fails: malformed steps degrade to documented fallbacks, and an
/// internal inconsistency is logged and yields no frames.
pub fn build(steps: &[Step], current_heap: &[NodeView]) -> Vec<Frame> {
    build_with_names(steps, &NameIndex::from_heap(current_heap))
}

/// Build frames straight from a dashboard snapshot, resolving names against
/// both its heap array and its queue.
pub fn build_from_snapshot(snapshot: &DashboardSnapshot) -> Vec<Frame> {
    build_with_names(&snapshot.steps, &NameIndex::from_snapshot(snapshot))
}

pub fn build_with_names(steps: &[Step], names: &NameIndex) -> Vec<Frame> {
    match try_build(steps, names) {
        Ok(frames) => frames,
        Err(e) => {
            tracing::error!(steps = steps.len(), "frame construction failed: {e}");
            Vec::new()
        }
    }
}

fn try_build(steps: &[Step], names: &NameIndex) -> Result<Vec<Frame>, FrameBuildError> {
    let Some(first) = steps.first() else {
        return Ok(Vec::new());
    };

    let mut frames = Vec::with_capacity(steps.len() + 1);
    frames.push(Frame {
        heap_array: resolve(reconstruct_initial_heap(first), names),
        description: INITIAL_DESCRIPTION.to_string(),
        detail: None,
        highlight: None,
        step_index: None,
    });

    for (idx, step) in steps.iter().enumerate() {
        let heap_array = match step.array.as_deref() {
            Some(entries) if !entries.is_empty() => resolve(entries, names),
            _ => frames
                .last()
                .map(|f: &Frame| f.heap_array.clone())
                .unwrap_or_default(),
        };
        let (description, detail) = describe(step, idx);
        frames.push(Frame {
            heap_array,
            description,
            detail,
            highlight: derive_highlight(step),
            step_index: Some(idx),
        });
    }

    check(&frames, steps.len())?;
    tracing::debug!(frames = frames.len(), "built replay frames");
    Ok(frames)
}

fn check(frames: &[Frame], steps: usize) -> Result<(), FrameBuildError> {
    if frames.len() != steps + 1 {
        return Err(FrameBuildError::FrameCount {
            steps,
            actual: frames.len(),
        });
    }
    for (i, pair) in frames.windows(2).enumerate() {
        if !pair[0].heap_array.is_empty() && pair[1].heap_array.is_empty() {
            return Err(FrameBuildError::EmptiedHeap { frame: i + 1 });
        }
    }
    Ok(())
}

/// The heap as it stood before the first step ran.
///
/// The engine emits no "before" snapshot. When the first step is the
/// append of a new patient, the prior state is its array without the last
/// slot; otherwise the first step's array is taken as-is.
pub fn reconstruct_initial_heap(first: &Step) -> &[StepEntry] {
    let array = first.array.as_deref().unwrap_or_default();
    if is_insert_title(&first.title) {
        &array[..array.len().saturating_sub(1)]
    } else {
        array
    }
}

/// Whether a step title denotes "inserted into array".
pub fn is_insert_title(title: &str) -> bool {
    let title = title.to_lowercase();
    INSERT_TITLE_MARKERS.iter().any(|m| title.contains(m))
}

fn resolve(entries: &[StepEntry], names: &NameIndex) -> Vec<NodeView> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| NodeView::from_step_entry(i, entry, names.name(&entry.code)))
        .collect()
}

/// Swap wins over focus: the engine sends both on a swap step.
fn derive_highlight(step: &Step) -> Option<Highlight> {
    let swap = step.swap.as_deref().unwrap_or_default();
    let focus = step.focus.as_deref().unwrap_or_default();
    match (swap, focus) {
        (&[a, b], _) => Some(Highlight::pair(HighlightKind::Swap, a, b)),
        (_, &[a, b, ..]) => Some(Highlight::pair(HighlightKind::Compare, a, b)),
        (_, &[a]) => Some(Highlight::single(HighlightKind::Focus, a)),
        _ => None,
    }
}

fn describe(step: &Step, idx: usize) -> (String, Option<String>) {
    let title = step.title.trim();
    let description = step.description.trim();
    if !title.is_empty() {
        let detail = (!description.is_empty()).then(|| description.to_string());
        (title.to_string(), detail)
    } else if !description.is_empty() {
        (description.to_string(), None)
    } else {
        (format!("Step {}", idx + 1), None)
    }
}

/// Current heap of a snapshot as node views.
pub fn current_heap(snapshot: &DashboardSnapshot) -> Vec<NodeView> {
    heap_from_slots(&snapshot.heap_array)
}
