//! SVG renderer: converts `RenderCommand` lists into standalone SVG strings.

use std::fmt::Write as _;

use heap_replay_protocol::{RenderCommand, TextAlign, ThemeToken};

/// Render a list of commands as an SVG document string.
///
/// `width` and `height` define the SVG viewBox dimensions.
/// `dark` selects the color palette.
pub fn render_svg(commands: &[RenderCommand], width: f64, height: f64, dark: bool) -> String {
    let mut svg = String::with_capacity(commands.len() * 160);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:system-ui,-apple-system,sans-serif;font-size:12px">"#,
    );
    let bg = resolve_color(ThemeToken::Background, dark);
    let _ = write!(svg, r#"<rect width="{width}" height="{height}" fill="{bg}"/>"#);

    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
                label,
                slot,
            } => {
                let fill = resolve_color(*color, dark);
                let stroke = border_color
                    .map(|b| format!(r#" stroke="{}""#, resolve_color(b, dark)))
                    .unwrap_or_default();
                let data = slot
                    .map(|i| format!(r#" data-index="{i}""#))
                    .unwrap_or_default();
                let _ = write!(
                    svg,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{fill}"{stroke}{data} rx="4">"#,
                    rect.x, rect.y, rect.w, rect.h,
                );
                if let Some(label) = label {
                    let _ = write!(svg, "<title>{}</title>", escape_xml(label));
                }
                svg.push_str("</rect>");

                // Label inside the rect, on the first line of tall nodes.
                if let Some(label) = label
                    && rect.w > 30.0
                {
                    let tx = rect.x + rect.w / 2.0;
                    let ty = rect.y + (rect.h * 0.7).min(17.0);
                    let max_chars = (rect.w / 7.0) as usize;
                    let text = if label.chars().count() > max_chars && max_chars > 2 {
                        let truncated: String = label.chars().take(max_chars - 1).collect();
                        format!("{truncated}…")
                    } else {
                        label.clone()
                    };
                    let _ = write!(
                        svg,
                        r#"<text x="{tx}" y="{ty}" fill="{}" text-anchor="middle" font-weight="600" style="pointer-events:none">{}</text>"#,
                        resolve_color(ThemeToken::TextPrimary, dark),
                        escape_xml(&text),
                    );
                }
            }
            RenderCommand::StrokeRect {
                rect,
                color,
                width: stroke_width,
            } => {
                let _ = write!(
                    svg,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{}" stroke-width="{stroke_width}" rx="5"/>"#,
                    rect.x,
                    rect.y,
                    rect.w,
                    rect.h,
                    resolve_color(*color, dark),
                );
            }
            RenderCommand::DrawLine {
                from,
                to,
                color,
                width: line_width,
            } => {
                let stroke = resolve_color(*color, dark);
                let _ = write!(
                    svg,
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{stroke}" stroke-width="{line_width}"/>"#,
                    from.x, from.y, to.x, to.y,
                );
            }
            RenderCommand::DrawText {
                text,
                position,
                color,
                font_size,
                align,
            } => {
                let anchor = match align {
                    TextAlign::Left => "start",
                    TextAlign::Center => "middle",
                    TextAlign::Right => "end",
                };
                let _ = write!(
                    svg,
                    r#"<text x="{}" y="{}" fill="{}" font-size="{font_size}" text-anchor="{anchor}">{}</text>"#,
                    position.x,
                    position.y,
                    resolve_color(*color, dark),
                    escape_xml(text),
                );
            }
            RenderCommand::BeginGroup { id, .. } => {
                let _ = write!(svg, r#"<g id="{}">"#, escape_xml(id));
            }
            RenderCommand::EndGroup => svg.push_str("</g>"),
        }
    }

    svg.push_str("</svg>");
    svg
}

fn resolve_color(token: ThemeToken, dark: bool) -> &'static str {
    if dark {
        match token {
            ThemeToken::SeverityHigh => "#7f1d1d",
            ThemeToken::SeverityMid => "#78350f",
            ThemeToken::SeverityLow => "#14532d",
            ThemeToken::NodeBackground | ThemeToken::Surface => "#1f2937",
            ThemeToken::NodeBorder | ThemeToken::Border => "#4b5563",
            ThemeToken::Connector => "#6b7280",
            ThemeToken::CompareHighlight => "#facc15",
            ThemeToken::SwapHighlight => "#f97316",
            ThemeToken::FocusHighlight => "#38bdf8",
            ThemeToken::InsertHighlight => "#4ade80",
            ThemeToken::RemoveHighlight => "#f87171",
            ThemeToken::HoverHighlight => "#a5b4fc",
            ThemeToken::SelectionHighlight => "#818cf8",
            ThemeToken::TextPrimary => "#f3f4f6",
            ThemeToken::TextSecondary => "#d1d5db",
            ThemeToken::TextMuted => "#9ca3af",
            ThemeToken::Background => "#111827",
            ThemeToken::StepActive => "#2563eb",
            ThemeToken::StepInactive => "#374151",
        }
    } else {
        match token {
            ThemeToken::SeverityHigh => "#fee2e2",
            ThemeToken::SeverityMid => "#fef3c7",
            ThemeToken::SeverityLow => "#dcfce7",
            ThemeToken::NodeBackground | ThemeToken::Surface => "#ffffff",
            ThemeToken::NodeBorder | ThemeToken::Border => "#d1d5db",
            ThemeToken::Connector => "#9ca3af",
            ThemeToken::CompareHighlight => "#eab308",
            ThemeToken::SwapHighlight => "#ea580c",
            ThemeToken::FocusHighlight => "#0284c7",
            ThemeToken::InsertHighlight => "#16a34a",
            ThemeToken::RemoveHighlight => "#dc2626",
            ThemeToken::HoverHighlight => "#6366f1",
            ThemeToken::SelectionHighlight => "#4f46e5",
            ThemeToken::TextPrimary => "#111827",
            ThemeToken::TextSecondary => "#374151",
            ThemeToken::TextMuted => "#6b7280",
            ThemeToken::Background => "#f9fafb",
            ThemeToken::StepActive => "#dbeafe",
            ThemeToken::StepInactive => "#f3f4f6",
        }
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
