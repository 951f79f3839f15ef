use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    // Severity badges (3-tier display class)
    SeverityHigh,
    SeverityMid,
    SeverityLow,

    NodeBackground,
    NodeBorder,
    Connector,

    // Emphasis kinds
    CompareHighlight,
    SwapHighlight,
    FocusHighlight,
    InsertHighlight,
    RemoveHighlight,
    HoverHighlight,
    SelectionHighlight,

    TextPrimary,
    TextSecondary,
    TextMuted,

    Background,
    Surface,
    Border,

    // Step list
    StepActive,
    StepInactive,
}
