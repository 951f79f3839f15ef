//! A [`Surface`] that realizes frames as render commands.
//!
//! Used by every renderer in the workspace: the terminal rasterizes the
//! commands into cells, the SVG exporter serializes them, and the wasm
//! bridge hands them to the page as JSON.

use heap_replay_protocol::{Point, Rect, RenderCommand, Viewport};

use crate::connectors::{Connector, NodeBounds};
use crate::highlight::{HandleMap, HighlightSync, View};
use crate::render::{RenderError, RenderModel, Surface};
use crate::views::array_view::{self, ArrayMetrics};
use crate::views::tree_view::{self, TreeMetrics};

#[derive(Debug, Clone)]
pub struct CommandSurface {
    tree_viewport: Viewport,
    array_viewport: Viewport,
    tree_metrics: TreeMetrics,
    array_metrics: ArrayMetrics,
    connectors: Vec<RenderCommand>,
    tree: Vec<RenderCommand>,
    array: Vec<RenderCommand>,
    /// Emphasis outlines, drawn last.
    overlay: Vec<RenderCommand>,
    bounds: NodeBounds,
    position: (usize, usize),
    model: Option<RenderModel>,
}

impl CommandSurface {
    pub fn new(
        tree_viewport: Viewport,
        array_viewport: Viewport,
        tree_metrics: TreeMetrics,
        array_metrics: ArrayMetrics,
    ) -> Self {
        Self {
            tree_viewport,
            array_viewport,
            tree_metrics,
            array_metrics,
            connectors: Vec::new(),
            tree: Vec::new(),
            array: Vec::new(),
            overlay: Vec::new(),
            bounds: NodeBounds::new(tree_viewport.origin()),
            position: (0, 0),
            model: None,
        }
    }

    /// Pixel layout: the tree above, the array strip in the bottom quarter.
    pub fn pixels(width: f64, height: f64) -> Self {
        let split = (height * 0.75).floor();
        Self::new(
            Viewport::new(width, split),
            Viewport {
                x: 0.0,
                y: split,
                width,
                height: height - split,
            },
            TreeMetrics::PIXELS,
            ArrayMetrics::PIXELS,
        )
    }

    /// Character-cell layout with caller-chosen areas.
    pub fn cells(tree_viewport: Viewport, array_viewport: Viewport) -> Self {
        Self::new(tree_viewport, array_viewport, TreeMetrics::CELLS, ArrayMetrics::CELLS)
    }

    /// Move the views. Takes effect on the next `present`.
    pub fn set_viewports(&mut self, tree: Viewport, array: Viewport) {
        self.tree_viewport = tree;
        self.array_viewport = array;
    }

    pub fn tree_viewport(&self) -> Viewport {
        self.tree_viewport
    }

    pub fn array_viewport(&self) -> Viewport {
        self.array_viewport
    }

    /// Bounding size of both views.
    pub fn extent(&self) -> (f64, f64) {
        let (t, a) = (self.tree_viewport, self.array_viewport);
        (
            (t.x + t.width).max(a.x + a.width),
            (t.y + t.height).max(a.y + a.height),
        )
    }

    /// Everything drawn so far, back to front.
    pub fn commands(&self) -> Vec<RenderCommand> {
        let mut all = Vec::with_capacity(
            self.connectors.len() + self.tree.len() + self.array.len() + self.overlay.len(),
        );
        all.extend_from_slice(&self.connectors);
        all.extend_from_slice(&self.tree);
        all.extend_from_slice(&self.array);
        all.extend_from_slice(&self.overlay);
        all
    }

    /// The flat index of the node or chip under `point`.
    pub fn slot_at(&self, point: Point) -> Option<(View, usize)> {
        let hit = |commands: &[RenderCommand]| {
            commands.iter().rev().find_map(|c| match c {
                RenderCommand::DrawRect {
                    rect,
                    slot: Some(i),
                    ..
                } if rect.contains(point) => Some(*i),
                _ => None,
            })
        };
        hit(&self.tree)
            .map(|i| (View::Tree, i))
            .or_else(|| hit(&self.array).map(|i| (View::Array, i)))
    }

    /// Last reported progress, 1-based current and total.
    pub fn position(&self) -> (usize, usize) {
        self.position
    }

    /// The model of the frame on display.
    pub fn model(&self) -> Option<&RenderModel> {
        self.model.as_ref()
    }
}

fn slot_rects(commands: &[RenderCommand]) -> impl Iterator<Item = (usize, Rect)> + '_ {
    commands.iter().filter_map(|c| match c {
        RenderCommand::DrawRect {
            rect,
            slot: Some(i),
            ..
        } => Some((*i, *rect)),
        _ => None,
    })
}

impl Surface for CommandSurface {
    type Handle = Rect;

    fn present(&mut self, model: &RenderModel) -> Result<HandleMap<Rect>, RenderError> {
        let vp = self.tree_viewport;
        if !vp.is_drawable() {
            return Err(RenderError::Viewport {
                width: vp.width,
                height: vp.height,
            });
        }

        self.tree = tree_view::render_tree(model, &vp, &self.tree_metrics);
        self.array = if self.array_viewport.is_drawable() {
            array_view::render_array(model, &self.array_viewport, &self.array_metrics)
        } else {
            Vec::new()
        };
        self.connectors.clear();
        self.overlay.clear();

        let mut handles = HandleMap::default();
        self.bounds = NodeBounds::new(vp.origin());
        for (i, rect) in slot_rects(&self.tree) {
            self.bounds.insert(i, rect);
            handles.insert(View::Tree, i, rect);
        }
        for (i, rect) in slot_rects(&self.array) {
            handles.insert(View::Array, i, rect);
        }
        self.model = Some(model.clone());
        Ok(handles)
    }

    fn emphasize(&mut self, highlights: &HighlightSync<Rect>) {
        let (tree_pad, array_pad) = (self.tree_metrics.outline, self.array_metrics.outline);
        let width = self.tree_metrics.line_width * 2.0;
        self.overlay = highlights
            .marks()
            .flat_map(|mark| {
                let color = mark.emphasis.theme_token();
                [
                    mark.tree.map(|r| r.inflate(tree_pad)),
                    mark.array.map(|r| r.inflate(array_pad)),
                ]
                .into_iter()
                .flatten()
                .map(move |rect| RenderCommand::StrokeRect { rect, color, width })
            })
            .collect();
    }

    fn node_bounds(&self) -> NodeBounds {
        self.bounds.clone()
    }

    fn draw_connectors(&mut self, connectors: &[Connector]) {
        self.connectors =
            tree_view::render_connectors(connectors, self.bounds.origin, &self.tree_metrics);
    }

    fn progress(&mut self, current: usize, total: usize) {
        self.position = (current, total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::Emphasis;
    use crate::model::{Frame, HighlightKind, NodeView};
    use heap_replay_protocol::ThemeToken;

    fn model(n: usize) -> RenderModel {
        let frame = Frame {
            heap_array: (0..n)
                .map(|i| NodeView {
                    index: i,
                    code: format!("BN{i}"),
                    name: String::new(),
                    severity: 8,
                    label: String::new(),
                })
                .collect(),
            description: "Compare".into(),
            detail: None,
            highlight: None,
            step_index: Some(0),
        };
        RenderModel::new(&frame, 1, 2)
    }

    fn surface() -> CommandSurface {
        CommandSurface::cells(
            Viewport::new(80.0, 12.0),
            Viewport {
                x: 0.0,
                y: 12.0,
                width: 80.0,
                height: 4.0,
            },
        )
    }

    #[test]
    fn present_maps_both_views() {
        let mut s = surface();
        let handles = s.present(&model(3)).expect("present");
        for i in 0..3 {
            assert!(handles.get(View::Tree, i).is_some());
            assert!(handles.get(View::Array, i).is_some());
        }
        assert_eq!(s.node_bounds().rects.len(), 3);
    }

    #[test]
    fn hit_testing_finds_tree_and_array_slots() {
        let mut s = surface();
        let handles = s.present(&model(3)).expect("present");
        let root = *handles.get(View::Tree, 0).expect("root");
        assert_eq!(s.slot_at(root.top_center()), Some((View::Tree, 0)));
        let chip = *handles.get(View::Array, 2).expect("chip");
        assert_eq!(
            s.slot_at(Point::new(chip.x + 0.5, chip.y + 0.5)),
            Some((View::Array, 2))
        );
        assert_eq!(s.slot_at(Point::new(0.5, 11.5)), None);
    }

    #[test]
    fn emphasis_outlines_both_views() {
        let mut s = surface();
        let handles = s.present(&model(3)).expect("present");
        let mut sync = HighlightSync::new();
        sync.bind(handles);
        sync.apply([1, 2], Emphasis::Step(HighlightKind::Swap));
        s.emphasize(&sync);
        let strokes = s
            .commands()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    RenderCommand::StrokeRect {
                        color: ThemeToken::SwapHighlight,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(strokes, 4);

        sync.clear();
        s.emphasize(&sync);
        assert!(
            !s.commands()
                .iter()
                .any(|c| matches!(c, RenderCommand::StrokeRect { .. }))
        );
    }

    #[test]
    fn connectors_drawn_behind_nodes() {
        let mut s = surface();
        s.present(&model(3)).expect("present");
        let connectors = crate::connectors::compute_connectors(3, &s.node_bounds());
        s.draw_connectors(&connectors);
        let commands = s.commands();
        let first_line = commands
            .iter()
            .position(|c| matches!(c, RenderCommand::DrawLine { .. }));
        let first_rect = commands
            .iter()
            .position(|c| matches!(c, RenderCommand::DrawRect { .. }));
        assert!(first_line < first_rect);
        assert_eq!(
            commands
                .iter()
                .filter(|c| matches!(c, RenderCommand::DrawLine { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn undrawable_viewport_is_an_error() {
        let mut s = CommandSurface::pixels(0.0, 0.0);
        assert!(matches!(
            s.present(&model(1)),
            Err(RenderError::Viewport { .. })
        ));
    }
}
