pub mod commands;
pub mod snapshot;
pub mod theme;
pub mod types;

pub use commands::{RenderCommand, TextAlign};
pub use snapshot::{
    DashboardSnapshot, HeapSlot, LogEntry, PatientRecord, QueueStats, SeverityRange, Step, StepEntry,
};
pub use theme::ThemeToken;
pub use types::{Point, Rect, Viewport};
