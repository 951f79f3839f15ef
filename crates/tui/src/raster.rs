//! Rasterizes render commands (in cell units) into a ratatui buffer.

use heap_replay_protocol::{Point, Rect as CmdRect, RenderCommand, TextAlign, ThemeToken};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier},
};

pub fn theme_to_color(token: ThemeToken, dark: bool) -> Color {
    match token {
        ThemeToken::SeverityHigh => Color::LightRed,
        ThemeToken::SeverityMid => Color::Yellow,
        ThemeToken::SeverityLow => Color::Green,
        ThemeToken::NodeBackground | ThemeToken::Surface | ThemeToken::Background => {
            if dark {
                Color::Black
            } else {
                Color::White
            }
        }
        ThemeToken::NodeBorder | ThemeToken::Border | ThemeToken::Connector => Color::DarkGray,
        ThemeToken::CompareHighlight => Color::LightYellow,
        ThemeToken::SwapHighlight => Color::Rgb(255, 140, 0),
        ThemeToken::FocusHighlight => Color::LightCyan,
        ThemeToken::InsertHighlight => Color::LightGreen,
        ThemeToken::RemoveHighlight => Color::Red,
        ThemeToken::HoverHighlight => Color::LightBlue,
        ThemeToken::SelectionHighlight => Color::LightMagenta,
        ThemeToken::TextPrimary => {
            if dark {
                Color::White
            } else {
                Color::Black
            }
        }
        ThemeToken::TextSecondary => Color::Gray,
        ThemeToken::TextMuted => Color::DarkGray,
        ThemeToken::StepActive => Color::Blue,
        ThemeToken::StepInactive => Color::Reset,
    }
}

/// Integer cell span of a command rect: `(x, y, w, h)`.
fn cells(rect: &CmdRect) -> (i32, i32, i32, i32) {
    (
        rect.x.floor() as i32,
        rect.y.floor() as i32,
        rect.w.round().max(1.0) as i32,
        rect.h.round().max(1.0) as i32,
    )
}

struct Canvas<'a> {
    buf: &'a mut Buffer,
    clip: Rect,
    dark: bool,
}

impl Canvas<'_> {
    fn put(&mut self, x: i32, y: i32, ch: char, fg: Option<Color>, bg: Option<Color>) {
        let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) else {
            return;
        };
        if x < self.clip.x
            || y < self.clip.y
            || x >= self.clip.x + self.clip.width
            || y >= self.clip.y + self.clip.height
        {
            return;
        }
        if let Some(cell) = self.buf.cell_mut((x, y)) {
            cell.set_char(ch);
            if let Some(fg) = fg {
                cell.set_fg(fg);
            }
            if let Some(bg) = bg {
                cell.set_bg(bg);
            }
        }
    }

    fn recolor(&mut self, x: i32, y: i32, fg: Color, bg: Option<Color>, bold: bool) {
        let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) else {
            return;
        };
        if !self.clip.contains((x, y).into()) {
            return;
        }
        if let Some(cell) = self.buf.cell_mut((x, y)) {
            cell.set_fg(fg);
            if let Some(bg) = bg {
                cell.set_bg(bg);
            }
            if bold {
                cell.modifier.insert(Modifier::BOLD);
            }
        }
    }

    fn text(&mut self, x: i32, y: i32, text: &str, max: i32, fg: Color, bg: Option<Color>) {
        for (i, ch) in text.chars().take(max.max(0) as usize).enumerate() {
            self.put(x + i as i32, y, ch, Some(fg), bg);
        }
    }

    fn border(&mut self, (x, y, w, h): (i32, i32, i32, i32), fg: Color) {
        let (r, b) = (x + w - 1, y + h - 1);
        for cx in x + 1..r {
            self.put(cx, y, '─', Some(fg), None);
            self.put(cx, b, '─', Some(fg), None);
        }
        for cy in y + 1..b {
            self.put(x, cy, '│', Some(fg), None);
            self.put(r, cy, '│', Some(fg), None);
        }
        self.put(x, y, '╭', Some(fg), None);
        self.put(r, y, '╮', Some(fg), None);
        self.put(x, b, '╰', Some(fg), None);
        self.put(r, b, '╯', Some(fg), None);
    }

    fn line(&mut self, from: Point, to: Point, fg: Color) {
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let ch = if dx.abs() < 0.5 {
            '│'
        } else if dx.abs() > dy.abs() * 3.0 {
            '─'
        } else if (dx > 0.0) == (dy > 0.0) {
            '╲'
        } else {
            '╱'
        };
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i32;
        for i in 0..steps {
            let t = f64::from(i) / f64::from(steps);
            let x = (from.x + dx * t).floor() as i32;
            let y = (from.y + dy * t).floor() as i32;
            self.put(x, y, ch, Some(fg), None);
        }
    }
}

/// Draw `commands` into `buf`, never touching cells outside `clip`.
pub fn rasterize(commands: &[RenderCommand], buf: &mut Buffer, clip: Rect, dark: bool) {
    let mut canvas = Canvas { buf, clip, dark };
    let color = |token: ThemeToken| theme_to_color(token, dark);

    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect { rect, color: fill, label, .. } => {
                let span @ (x, y, w, h) = cells(rect);
                let label = label.as_deref().unwrap_or("");
                if w >= 3 && h >= 3 {
                    canvas.border(span, color(*fill));
                    let inner = w - 2;
                    let len = label.chars().count() as i32;
                    let lx = x + 1 + ((inner - len) / 2).max(0);
                    canvas.text(lx, y + h / 2, label, inner, color(ThemeToken::TextPrimary), None);
                } else {
                    let bg = Some(color(*fill));
                    let fg = if canvas.dark { Color::Black } else { Color::White };
                    for row in y..y + h {
                        for cx in x..x + w {
                            canvas.put(cx, row, ' ', Some(fg), bg);
                        }
                    }
                    canvas.text(x + 1, y, label, w - 1, fg, bg);
                }
            }
            RenderCommand::StrokeRect { rect, color: stroke, .. } => {
                let span @ (x, y, w, h) = cells(rect);
                let fg = color(*stroke);
                if w >= 3 && h >= 3 {
                    canvas.border(span, fg);
                    for cx in x..x + w {
                        canvas.recolor(cx, y, fg, None, true);
                        canvas.recolor(cx, y + h - 1, fg, None, true);
                    }
                } else {
                    for row in y..y + h {
                        for cx in x..x + w {
                            canvas.recolor(cx, row, Color::Black, Some(fg), true);
                        }
                    }
                }
            }
            RenderCommand::DrawText {
                position,
                text,
                color: fg,
                align,
                ..
            } => {
                let len = text.chars().count() as i32;
                let x = position.x.floor() as i32;
                let x = match align {
                    TextAlign::Left => x,
                    TextAlign::Center => x - len / 2,
                    TextAlign::Right => x - len,
                };
                canvas.text(x, position.y.floor() as i32, text, len, color(*fg), None);
            }
            RenderCommand::DrawLine { from, to, color: fg, .. } => {
                canvas.line(*from, *to, color(*fg));
            }
            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf.cell((x, y)).map_or(' ', |c| c.symbol().chars().next().unwrap_or(' ')))
            .collect()
    }

    #[test]
    fn boxes_a_tree_node_with_centered_label() {
        let area = Rect::new(0, 0, 12, 3);
        let mut buf = Buffer::empty(area);
        let cmds = [RenderCommand::DrawRect {
            rect: CmdRect::new(0.0, 0.0, 11.0, 3.0),
            color: ThemeToken::SeverityHigh,
            border_color: None,
            label: Some("BN1 9".into()),
            slot: Some(0),
        }];
        rasterize(&cmds, &mut buf, area, true);
        assert_eq!(row(&buf, 0), "╭─────────╮ ");
        assert_eq!(row(&buf, 1), "│  BN1 9  │ ");
        assert_eq!(row(&buf, 2), "╰─────────╯ ");
    }

    #[test]
    fn clips_to_area() {
        let area = Rect::new(0, 0, 4, 1);
        let mut buf = Buffer::empty(Rect::new(0, 0, 8, 1));
        let cmds = [RenderCommand::DrawText {
            position: Point::new(0.0, 0.0),
            text: "overflowing".into(),
            color: ThemeToken::TextPrimary,
            font_size: 1.0,
            align: TextAlign::Left,
        }];
        rasterize(&cmds, &mut buf, area, true);
        assert_eq!(row(&buf, 0), "over    ");
    }

    #[test]
    fn vertical_connector() {
        let area = Rect::new(0, 0, 3, 3);
        let mut buf = Buffer::empty(area);
        let cmds = [RenderCommand::DrawLine {
            from: Point::new(1.5, 0.0),
            to: Point::new(1.5, 2.0),
            color: ThemeToken::Connector,
            width: 1.0,
        }];
        rasterize(&cmds, &mut buf, area, true);
        assert_eq!(row(&buf, 0), " │ ");
        assert_eq!(row(&buf, 1), " │ ");
        assert_eq!(row(&buf, 2), "   ");
    }
}
