use heap_replay_protocol::{Rect, RenderCommand, ThemeToken, Viewport};

use crate::model::NodeView;
use crate::render::RenderModel;

/// Sizing of the flat-array strip in the renderer's units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrayMetrics {
    pub chip_width: f64,
    pub chip_height: f64,
    pub gap: f64,
    pub outline: f64,
}

impl ArrayMetrics {
    pub const PIXELS: Self = Self {
        chip_width: 132.0,
        chip_height: 26.0,
        gap: 8.0,
        outline: 2.0,
    };

    pub const CELLS: Self = Self {
        chip_width: 16.0,
        chip_height: 1.0,
        gap: 1.0,
        outline: 0.0,
    };
}

/// `[index] CODE (Lv severity)`
pub fn chip_text(node: &NodeView) -> String {
    format!("[{}] {} (Lv {})", node.index, node.code, node.severity)
}

/// Chip rect of the `i`-th array element. Chips flow left to right and wrap
/// onto a new row when the viewport is full.
pub fn chip_rect(i: usize, viewport: &Viewport, m: &ArrayMetrics) -> Rect {
    let pitch = m.chip_width + m.gap;
    let per_row = ((viewport.width + m.gap) / pitch).floor().max(1.0) as usize;
    let row = (i / per_row) as f64;
    let col = (i % per_row) as f64;
    Rect::new(
        viewport.x + col * pitch,
        viewport.y + row * (m.chip_height + m.gap),
        m.chip_width,
        m.chip_height,
    )
}

/// Render the flat-array view of a frame, one chip per heap slot in index
/// order. Chips below the viewport are skipped.
pub fn render_array(model: &RenderModel, viewport: &Viewport, m: &ArrayMetrics) -> Vec<RenderCommand> {
    let mut commands = Vec::with_capacity(model.node_count() + 2);
    commands.push(RenderCommand::BeginGroup {
        id: "heap-array".into(),
        label: Some("Heap array".into()),
    });

    for (i, node) in model.array.iter().enumerate() {
        let rect = chip_rect(i, viewport, m);
        if rect.y + rect.h > viewport.y + viewport.height {
            break;
        }
        commands.push(RenderCommand::DrawRect {
            rect,
            color: node.classification().display_class.theme_token(),
            border_color: Some(ThemeToken::Border),
            label: Some(chip_text(node)),
            slot: Some(node.index),
        });
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Frame;

    fn model(n: usize) -> RenderModel {
        let frame = Frame {
            heap_array: (0..n)
                .map(|i| NodeView {
                    index: i,
                    code: format!("BN{i}"),
                    name: String::new(),
                    severity: 10 - i as i32,
                    label: String::new(),
                })
                .collect(),
            description: String::new(),
            detail: None,
            highlight: None,
            step_index: None,
        };
        RenderModel::new(&frame, 0, 1)
    }

    #[test]
    fn chip_text_format() {
        let node = NodeView {
            index: 3,
            code: "BN042".into(),
            name: "Tran Binh".into(),
            severity: 7,
            label: "High-risk".into(),
        };
        assert_eq!(chip_text(&node), "[3] BN042 (Lv 7)");
    }

    #[test]
    fn chips_wrap_rows() {
        // 16 wide + 1 gap: four chips fit in 67 cells.
        let vp = Viewport::new(67.0, 10.0);
        assert_eq!(chip_rect(3, &vp, &ArrayMetrics::CELLS), Rect::new(51.0, 0.0, 16.0, 1.0));
        assert_eq!(chip_rect(4, &vp, &ArrayMetrics::CELLS), Rect::new(0.0, 2.0, 16.0, 1.0));
    }

    #[test]
    fn overflowing_chips_are_dropped() {
        let vp = Viewport::new(34.0, 3.0);
        let cmds = render_array(&model(10), &vp, &ArrayMetrics::CELLS);
        let chips = cmds
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawRect { .. }))
            .count();
        // Two chips per row, two rows fit.
        assert_eq!(chips, 4);
    }

    #[test]
    fn chips_carry_their_index() {
        let vp = Viewport::new(400.0, 100.0);
        let cmds = render_array(&model(3), &vp, &ArrayMetrics::PIXELS);
        let slots: Vec<_> = cmds
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect { slot, .. } => *slot,
                _ => None,
            })
            .collect();
        assert_eq!(slots, vec![0, 1, 2]);
    }
}
