use serde::{Deserialize, Serialize};

use super::node::NodeView;

/// What a step did to the indices it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HighlightKind {
    Compare,
    Swap,
    Focus,
    Insert,
    Remove,
}

/// A transient marker on one or two flat indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub kind: HighlightKind,
    pub index_a: usize,
    pub index_b: Option<usize>,
}

impl Highlight {
    pub fn single(kind: HighlightKind, index: usize) -> Self {
        Self {
            kind,
            index_a: index,
            index_b: None,
        }
    }

    pub fn pair(kind: HighlightKind, a: usize, b: usize) -> Self {
        Self {
            kind,
            index_a: a,
            index_b: Some(b),
        }
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + use<> {
        std::iter::once(self.index_a).chain(self.index_b)
    }
}

/// One renderable snapshot of the replay timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub heap_array: Vec<NodeView>,
    /// Short caption (the step title, or "Initial state").
    pub description: String,
    /// The step's longer explanation, when it differs from the caption.
    pub detail: Option<String>,
    pub highlight: Option<Highlight>,
    /// Position of the originating step; `None` for the synthetic initial frame.
    pub step_index: Option<usize>,
}

impl Frame {
    pub fn is_initial(&self) -> bool {
        self.step_index.is_none()
    }
}
