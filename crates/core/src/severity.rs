//! Severity classification.
//!
//! Two schemes coexist and deliberately disagree: a 5-tier *label* used in
//! text, and a coarser 3-tier *display class* used for badge colors.
//! A severity of 6 is a "Medium" label on a "mid" badge, but a severity of 8
//! is a "High-risk" label on the same "high" badge as a 10.

use std::collections::BTreeMap;

use heap_replay_protocol::{QueueStats, ThemeToken};
use serde::{Deserialize, Serialize};

/// 5-tier severity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeverityLabel {
    VeryLight,
    Light,
    Medium,
    HighRisk,
    Critical,
}

impl SeverityLabel {
    /// All labels, most severe first.
    pub const ALL: [SeverityLabel; 5] = [
        Self::Critical,
        Self::HighRisk,
        Self::Medium,
        Self::Light,
        Self::VeryLight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::HighRisk => "High-risk",
            Self::Medium => "Medium",
            Self::Light => "Light",
            Self::VeryLight => "Very light",
        }
    }

    /// Inclusive severity range of the band, as shown in the legend.
    pub fn range(self) -> &'static str {
        match self {
            Self::Critical => "10",
            Self::HighRisk => "7-9",
            Self::Medium => "5-6",
            Self::Light => "3-4",
            Self::VeryLight => "1-2",
        }
    }
}

impl std::fmt::Display for SeverityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 3-tier badge class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayClass {
    High,
    Mid,
    Low,
}

impl DisplayClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Mid => "mid",
            Self::Low => "low",
        }
    }

    /// CSS class list for web badges.
    pub fn badge_class(self) -> &'static str {
        match self {
            Self::High => "badge badge-high",
            Self::Mid => "badge badge-mid",
            Self::Low => "badge badge-low",
        }
    }

    pub fn theme_token(self) -> ThemeToken {
        match self {
            Self::High => ThemeToken::SeverityHigh,
            Self::Mid => ThemeToken::SeverityMid,
            Self::Low => ThemeToken::SeverityLow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub label: SeverityLabel,
    pub display_class: DisplayClass,
}

/// Classify a severity score under both schemes.
///
/// Total over `i32`: values outside 1..=10 fall through the same
/// inequalities (11 is "Critical", 0 and below are "Very light").
pub fn classify(severity: i32) -> Classification {
    Classification {
        label: label_for(severity),
        display_class: display_class_for(severity),
    }
}

pub fn label_for(severity: i32) -> SeverityLabel {
    if severity >= 10 {
        SeverityLabel::Critical
    } else if severity >= 7 {
        SeverityLabel::HighRisk
    } else if severity >= 5 {
        SeverityLabel::Medium
    } else if severity >= 3 {
        SeverityLabel::Light
    } else {
        SeverityLabel::VeryLight
    }
}

pub fn display_class_for(severity: i32) -> DisplayClass {
    if severity >= 7 {
        DisplayClass::High
    } else if severity >= 5 {
        DisplayClass::Mid
    } else {
        DisplayClass::Low
    }
}

/// One row of the severity legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub range: &'static str,
    pub label: SeverityLabel,
}

impl LegendEntry {
    /// Badge class of the band. Bands never straddle a class boundary.
    pub fn display_class(&self) -> DisplayClass {
        match self.label {
            SeverityLabel::Critical | SeverityLabel::HighRisk => DisplayClass::High,
            SeverityLabel::Medium => DisplayClass::Mid,
            SeverityLabel::Light | SeverityLabel::VeryLight => DisplayClass::Low,
        }
    }
}

/// The five severity bands, most severe first.
pub fn legend() -> Vec<LegendEntry> {
    SeverityLabel::ALL
        .iter()
        .map(|&label| LegendEntry {
            range: label.range(),
            label,
        })
        .collect()
}

/// Count patients per 5-tier label. Every label is present, zero or not.
pub fn bucket_counts(severities: impl IntoIterator<Item = i32>) -> QueueStats {
    let mut buckets: BTreeMap<String, u32> = SeverityLabel::ALL
        .iter()
        .map(|l| (l.as_str().to_string(), 0))
        .collect();
    let mut total = 0;
    for severity in severities {
        total += 1;
        *buckets.entry(label_for(severity).as_str().to_string()).or_default() += 1;
    }
    QueueStats { total, buckets }
}
