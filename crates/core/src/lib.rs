//! Step replay and synchronized heap visualization.
//!
//! ```text
//!   engine payload ──▶ snapshot ──▶ frames ──▶ playback ──▶ RenderModel ──▶ Surface
//!                                                 │                           │
//!                                                 └── highlight ◀── connectors┘
//! ```

pub mod config;
pub mod connectors;
pub mod frames;
pub mod highlight;
pub mod layout;
pub mod model;
pub mod playback;
pub mod render;
pub mod session;
pub mod severity;
pub mod snapshot;
pub mod svg;
pub mod views;

pub use config::{ConfigError, ReplayConfig};
pub use playback::{PlaybackController, Status, TransportStatus};
pub use render::{RenderError, RenderModel, Surface};
pub use session::ReplaySession;
pub use snapshot::{SnapshotError, parse_snapshot};
