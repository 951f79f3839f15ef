use heap_replay_protocol::{Point, Rect, RenderCommand, TextAlign, ThemeToken, Viewport};

use crate::connectors::Connector;
use crate::layout::PlacedNode;
use crate::render::RenderModel;

/// Sizing of the tree view in the renderer's units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeMetrics {
    pub node_width: f64,
    pub node_height: f64,
    /// Vertical space between two levels, where connectors run.
    pub level_gap: f64,
    /// Space above the first level.
    pub padding: f64,
    pub font_size: f64,
    /// Offset of the first text line from the node's top edge.
    pub text_top: f64,
    pub line_height: f64,
    pub line_width: f64,
    /// How far emphasis outlines sit outside the node.
    pub outline: f64,
    /// Draw name and severity lines under the code, plus the caption.
    pub show_details: bool,
}

impl TreeMetrics {
    /// CSS pixels, for SVG export and the browser.
    pub const PIXELS: Self = Self {
        node_width: 96.0,
        node_height: 58.0,
        level_gap: 40.0,
        padding: 44.0,
        font_size: 12.0,
        text_top: 17.0,
        line_height: 16.0,
        line_width: 1.5,
        outline: 3.0,
        show_details: true,
    };

    /// Terminal character cells: a three-row box per node.
    pub const CELLS: Self = Self {
        node_width: 11.0,
        node_height: 3.0,
        level_gap: 2.0,
        padding: 0.0,
        font_size: 1.0,
        text_top: 1.0,
        line_height: 1.0,
        line_width: 1.0,
        outline: 0.0,
        show_details: false,
    };

    /// Height needed for `levels` rows of nodes.
    pub fn content_height(&self, levels: usize) -> f64 {
        if levels == 0 {
            return self.padding;
        }
        let levels = levels as f64;
        self.padding + levels * self.node_height + (levels - 1.0) * self.level_gap
    }
}

/// Level `L` is a row of `2^L` equal slots across the viewport; a node is
/// centered in its slot and shrinks when the slot is narrower than the node.
pub fn node_rect(placed: &PlacedNode, viewport: &Viewport, m: &TreeMetrics) -> Rect {
    let slot = viewport.width / placed.column_count as f64;
    let w = m.node_width.min(slot - 1.0).max(1.0);
    let x = viewport.x + slot * (placed.column as f64 + 0.5) - w / 2.0;
    let y = viewport.y + m.padding + f64::from(placed.level) * (m.node_height + m.level_gap);
    Rect::new(x, y, w, m.node_height)
}

/// Render the tree view of a frame. Every node rect carries its flat index
/// in `slot` so surfaces can hit-test and address it.
pub fn render_tree(model: &RenderModel, viewport: &Viewport, m: &TreeMetrics) -> Vec<RenderCommand> {
    let mut commands = Vec::with_capacity(model.node_count() * 4 + 4);
    commands.push(RenderCommand::BeginGroup {
        id: "heap-tree".into(),
        label: Some("Heap tree".into()),
    });

    if m.show_details {
        commands.extend(render_caption(model, viewport, m));
    }

    if model.levels.is_empty() {
        commands.push(RenderCommand::DrawText {
            position: Point::new(
                viewport.x + viewport.width / 2.0,
                viewport.y + m.padding + m.text_top,
            ),
            text: "Heap is empty".into(),
            color: ThemeToken::TextMuted,
            font_size: m.font_size,
            align: TextAlign::Center,
        });
    }

    for placed in model.levels.iter().flat_map(|l| &l.nodes) {
        let rect = node_rect(placed, viewport, m);
        let node = &placed.node;
        let class = node.classification().display_class;
        let label = if m.show_details {
            node.code.clone()
        } else {
            format!("{} {}", node.code, node.severity)
        };
        commands.push(RenderCommand::DrawRect {
            rect,
            color: class.theme_token(),
            border_color: Some(ThemeToken::NodeBorder),
            label: Some(label),
            slot: Some(node.index),
        });

        if m.show_details {
            let cx = rect.x + rect.w / 2.0;
            let level = format!("Lv {}", node.severity);
            let lines = [
                (node.name.as_str(), ThemeToken::TextSecondary),
                (level.as_str(), ThemeToken::TextMuted),
            ];
            for (i, (text, color)) in lines.into_iter().enumerate() {
                if text.is_empty() {
                    continue;
                }
                commands.push(RenderCommand::DrawText {
                    position: Point::new(cx, rect.y + m.text_top + m.line_height * (i + 1) as f64),
                    text: text.to_string(),
                    color,
                    font_size: m.font_size - 1.0,
                    align: TextAlign::Center,
                });
            }
        }
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

/// Frame description and position, above the first level.
fn render_caption(model: &RenderModel, viewport: &Viewport, m: &TreeMetrics) -> Vec<RenderCommand> {
    let mut commands = vec![RenderCommand::DrawText {
        position: Point::new(viewport.x + 8.0, viewport.y + m.line_height),
        text: format!("{}/{}  {}", model.frame_index + 1, model.frame_count, model.description),
        color: ThemeToken::TextPrimary,
        font_size: m.font_size + 1.0,
        align: TextAlign::Left,
    }];
    if let Some(detail) = &model.detail {
        commands.push(RenderCommand::DrawText {
            position: Point::new(viewport.x + 8.0, viewport.y + m.line_height * 2.0),
            text: detail.clone(),
            color: ThemeToken::TextSecondary,
            font_size: m.font_size,
            align: TextAlign::Left,
        });
    }
    commands
}

/// Connector lines. Endpoints are relative to `origin`, as computed from
/// the surface's node bounds.
pub fn render_connectors(connectors: &[Connector], origin: Point, m: &TreeMetrics) -> Vec<RenderCommand> {
    let shift = |p: Point| Point::new(p.x + origin.x, p.y + origin.y);
    let mut commands = Vec::with_capacity(connectors.len() + 2);
    commands.push(RenderCommand::BeginGroup {
        id: "heap-connectors".into(),
        label: None,
    });
    commands.extend(connectors.iter().map(|c| RenderCommand::DrawLine {
        from: shift(c.from),
        to: shift(c.to),
        color: ThemeToken::Connector,
        width: m.line_width,
    }));
    commands.push(RenderCommand::EndGroup);
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Frame, NodeView};

    fn model(severities: &[i32]) -> RenderModel {
        let frame = Frame {
            heap_array: severities
                .iter()
                .enumerate()
                .map(|(i, &s)| NodeView {
                    index: i,
                    code: format!("BN{i}"),
                    name: format!("Patient {i}"),
                    severity: s,
                    label: String::new(),
                })
                .collect(),
            description: "Swap".into(),
            detail: None,
            highlight: None,
            step_index: Some(0),
        };
        RenderModel::new(&frame, 1, 2)
    }

    fn slot_rects(commands: &[RenderCommand]) -> Vec<(usize, Rect)> {
        commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect {
                    rect,
                    slot: Some(i),
                    ..
                } => Some((*i, *rect)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn one_rect_per_node_centered_in_slot() {
        let vp = Viewport::new(400.0, 300.0);
        let cmds = render_tree(&model(&[10, 7, 5]), &vp, &TreeMetrics::PIXELS);
        let rects = slot_rects(&cmds);
        assert_eq!(rects.len(), 3);
        let (_, root) = rects[0];
        assert_eq!(root.top_center().x, 200.0);
        assert_eq!(rects[1].1.top_center().x, 100.0);
        assert_eq!(rects[2].1.top_center().x, 300.0);
        assert!(rects[1].1.y > root.y + root.h);
    }

    #[test]
    fn nodes_colored_by_display_class() {
        let vp = Viewport::new(400.0, 300.0);
        let cmds = render_tree(&model(&[9, 5, 2]), &vp, &TreeMetrics::CELLS);
        let colors: Vec<_> = cmds
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect { color, .. } => Some(*color),
                _ => None,
            })
            .collect();
        assert_eq!(
            colors,
            vec![ThemeToken::SeverityHigh, ThemeToken::SeverityMid, ThemeToken::SeverityLow]
        );
    }

    #[test]
    fn cells_label_carries_severity() {
        let vp = Viewport::new(80.0, 20.0);
        let cmds = render_tree(&model(&[10]), &vp, &TreeMetrics::CELLS);
        assert!(cmds.iter().any(|c| matches!(
            c,
            RenderCommand::DrawRect { label: Some(l), .. } if l == "BN0 10"
        )));
    }

    #[test]
    fn narrow_slots_shrink_nodes() {
        let vp = Viewport::new(40.0, 40.0);
        let cmds = render_tree(&model(&[5; 7]), &vp, &TreeMetrics::CELLS);
        let rects = slot_rects(&cmds);
        for (_, rect) in &rects {
            assert!(rect.w <= TreeMetrics::CELLS.node_width);
            assert!(rect.x >= 0.0 && rect.x + rect.w <= 40.0);
        }
        // Bottom level: four slots of ten cells each.
        assert_eq!(rects[6].1.w, 9.0);
    }

    #[test]
    fn empty_heap_says_so() {
        let vp = Viewport::new(400.0, 300.0);
        let cmds = render_tree(&model(&[]), &vp, &TreeMetrics::PIXELS);
        assert!(cmds.iter().any(|c| matches!(
            c,
            RenderCommand::DrawText { text, .. } if text == "Heap is empty"
        )));
    }

    #[test]
    fn connectors_are_shifted_back_to_absolute() {
        let c = Connector {
            parent: 0,
            child: 1,
            from: Point::new(10.0, 20.0),
            to: Point::new(5.0, 40.0),
        };
        let cmds = render_connectors(&[c], Point::new(100.0, 50.0), &TreeMetrics::PIXELS);
        assert!(cmds.contains(&RenderCommand::DrawLine {
            from: Point::new(110.0, 70.0),
            to: Point::new(105.0, 90.0),
            color: ThemeToken::Connector,
            width: 1.5,
        }));
    }
}
