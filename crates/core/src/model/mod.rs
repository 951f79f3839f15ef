pub mod frame;
pub mod node;

pub use frame::{Frame, Highlight, HighlightKind};
pub use node::{NodeView, heap_from_slots};
