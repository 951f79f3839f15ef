//! The per-frame render model and the seam to rendering surfaces.

use serde::Serialize;
use thiserror::Error;

use crate::connectors::{Connector, NodeBounds};
use crate::highlight::{HandleMap, HighlightSync};
use crate::layout::{self, TreeLevel};
use crate::model::{Frame, Highlight, NodeView};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("viewport {width}x{height} has no drawable area")]
    Viewport { width: f64, height: f64 },
    #[error("surface failed: {0}")]
    Surface(String),
}

/// Everything a surface needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderModel {
    /// Position in the timeline, `0..frame_count`.
    pub frame_index: usize,
    pub frame_count: usize,
    pub step_index: Option<usize>,
    pub description: String,
    pub detail: Option<String>,
    pub levels: Vec<TreeLevel>,
    pub array: Vec<NodeView>,
    pub highlight: Option<Highlight>,
}

impl RenderModel {
    pub fn new(frame: &Frame, frame_index: usize, frame_count: usize) -> Self {
        Self {
            frame_index,
            frame_count,
            step_index: frame.step_index,
            description: frame.description.clone(),
            detail: frame.detail.clone(),
            levels: layout::layout(&frame.heap_array),
            array: frame.heap_array.clone(),
            highlight: frame.highlight,
        }
    }

    pub fn node_count(&self) -> usize {
        self.array.len()
    }
}

/// Something that can realize a `RenderModel` on screen (a terminal, a
/// browser DOM, an SVG document).
///
/// The playback controller drives a surface through one fixed sequence per
/// frame: `present` → `emphasize` → `node_bounds` → `draw_connectors` →
/// `progress`.
pub trait Surface {
    /// Per-node handle the surface uses to address a drawn node.
    type Handle;

    /// Lay out and draw the tree and array views. Returns the handle of
    /// every drawn node in each view.
    fn present(&mut self, model: &RenderModel) -> Result<HandleMap<Self::Handle>, RenderError>;

    /// Draw the current emphasis; replaces whatever emphasis was drawn before.
    fn emphasize(&mut self, highlights: &HighlightSync<Self::Handle>);

    /// Bounds of the tree nodes as last laid out.
    fn node_bounds(&self) -> NodeBounds;

    fn draw_connectors(&mut self, connectors: &[Connector]);

    /// `current` is 1-based.
    fn progress(&mut self, current: usize, total: usize);
}
