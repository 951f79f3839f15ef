//! Lifecycle of the replay visualization around one rendering surface.
//!
//! A session owns the latest engine snapshot and, while the visualization
//! is active, exactly one [`PlaybackController`] built from it. Loading a
//! new snapshot or deactivating drops the controller (and with it any live
//! timer); the chosen speed outlives controllers.

use std::time::Duration;

use heap_replay_protocol::{DashboardSnapshot, QueueStats};

use crate::config::ReplayConfig;
use crate::frames;
use crate::model::Frame;
use crate::playback::{PlaybackController, Status, TransportStatus};
use crate::render::Surface;
use crate::severity;
use crate::snapshot::{self, SnapshotError};

pub struct ReplaySession<S: Surface> {
    config: ReplayConfig,
    snapshot: DashboardSnapshot,
    surface: S,
    playback: Option<PlaybackController<S::Handle>>,
    active: bool,
    speed: f64,
}

impl<S: Surface> ReplaySession<S> {
    /// A new, active session with nothing loaded.
    pub fn new(surface: S, config: ReplayConfig) -> Self {
        let speed = config.playback.speed;
        Self {
            config,
            snapshot: DashboardSnapshot::default(),
            surface,
            playback: None,
            active: true,
            speed,
        }
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &DashboardSnapshot {
        &self.snapshot
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn playback(&self) -> Option<&PlaybackController<S::Handle>> {
        self.playback.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Frames of the current timeline; empty while inactive.
    pub fn frames(&self) -> &[Frame] {
        self.playback
            .as_ref()
            .map(PlaybackController::frames)
            .unwrap_or_default()
    }

    /// Engine-supplied statistics, or counts derived from the queue.
    pub fn stats(&self) -> QueueStats {
        self.snapshot.stats.clone().unwrap_or_else(|| {
            severity::bucket_counts(self.snapshot.queue.iter().map(|p| p.severity))
        })
    }

    pub fn status(&self) -> TransportStatus {
        self.playback
            .as_ref()
            .map(PlaybackController::transport_status)
            .unwrap_or(TransportStatus {
                current: None,
                total: 0,
                status: Status::Stopped,
                speed: self.speed,
            })
    }

    /// Replace the snapshot. Any running replay is discarded; an active
    /// session starts replaying the new steps.
    pub fn load_snapshot(&mut self, snapshot: DashboardSnapshot) {
        self.playback = None;
        self.snapshot = snapshot;
        tracing::info!(
            queue = self.snapshot.queue.len(),
            heap = self.snapshot.heap_array.len(),
            steps = self.snapshot.steps.len(),
            "snapshot loaded"
        );
        if self.active {
            self.start();
        }
    }

    pub fn load_bytes(&mut self, data: &[u8]) -> Result<(), SnapshotError> {
        let snapshot = snapshot::parse_snapshot(data)?;
        self.load_snapshot(snapshot);
        Ok(())
    }

    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        tracing::debug!("visualization activated");
        self.start();
    }

    /// Drop the controller and its timer.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.playback = None;
        tracing::debug!("visualization deactivated");
    }

    fn start(&mut self) {
        let frames = frames::build_from_snapshot(&self.snapshot);
        let mut playback = PlaybackController::new(frames)
            .with_base_period(self.config.base_period())
            .with_resize_quiet(self.config.resize_quiet())
            .with_speed(self.speed);
        playback.seek(0, &mut self.surface);
        if self.config.playback.autoplay {
            playback.play();
        }
        self.playback = Some(playback);
    }

    fn with_playback(&mut self, f: impl FnOnce(&mut PlaybackController<S::Handle>, &mut S)) {
        if let Some(playback) = self.playback.as_mut() {
            f(playback, &mut self.surface);
        }
    }

    pub fn play(&mut self) {
        self.with_playback(|p, _| p.play());
    }

    pub fn pause(&mut self) {
        self.with_playback(|p, _| p.pause());
    }

    pub fn toggle(&mut self) {
        self.with_playback(|p, _| p.toggle());
    }

    pub fn step_forward(&mut self) {
        self.with_playback(PlaybackController::step_forward);
    }

    pub fn step_backward(&mut self) {
        self.with_playback(PlaybackController::step_backward);
    }

    pub fn seek(&mut self, index: usize) {
        self.with_playback(|p, s| p.seek(index, s));
    }

    pub fn seek_step(&mut self, step_index: usize) {
        self.with_playback(|p, s| p.seek_step(step_index, s));
    }

    /// Jump to the final frame.
    pub fn seek_last(&mut self) {
        self.seek(usize::MAX);
    }

    pub fn reset(&mut self) {
        self.with_playback(PlaybackController::reset);
    }

    pub fn set_speed(&mut self, multiplier: f64) {
        if multiplier.is_finite() && multiplier > 0.0 {
            self.speed = multiplier;
        }
        self.with_playback(|p, _| p.set_speed(multiplier));
    }

    pub fn advance(&mut self, dt: Duration) {
        self.with_playback(|p, s| p.advance(dt, s));
    }

    pub fn hover(&mut self, index: usize) {
        self.with_playback(|p, s| p.hover(index, s));
    }

    pub fn click(&mut self, index: usize) {
        self.with_playback(|p, s| p.click(index, s));
    }

    pub fn pointer_leave(&mut self) {
        self.with_playback(|p, s| p.pointer_leave(s));
    }

    pub fn resize(&mut self) {
        self.with_playback(|p, _| p.resize());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::CommandSurface;
    use heap_replay_protocol::{HeapSlot, PatientRecord, Step, StepEntry};

    fn entry(code: &str, severity: i32) -> StepEntry {
        StepEntry {
            index: None,
            code: code.into(),
            severity,
            label: None,
        }
    }

    fn snapshot() -> DashboardSnapshot {
        DashboardSnapshot {
            queue: vec![
                PatientRecord {
                    code: "BN2".into(),
                    name: "Tran B".into(),
                    severity: 9,
                    ..PatientRecord::default()
                },
                PatientRecord {
                    code: "BN1".into(),
                    name: "Nguyen A".into(),
                    severity: 4,
                    ..PatientRecord::default()
                },
            ],
            heap_array: vec![
                HeapSlot {
                    code: "BN2".into(),
                    name: "Tran B".into(),
                    severity: 9,
                    ..HeapSlot::default()
                },
                HeapSlot {
                    code: "BN1".into(),
                    name: "Nguyen A".into(),
                    severity: 4,
                    ..HeapSlot::default()
                },
            ],
            steps: vec![
                Step {
                    title: "Added to array".into(),
                    array: Some(vec![entry("BN1", 4), entry("BN2", 9)]),
                    focus: Some(vec![1]),
                    ..Step::default()
                },
                Step {
                    title: "Compare".into(),
                    array: Some(vec![entry("BN1", 4), entry("BN2", 9)]),
                    focus: Some(vec![1, 0]),
                    ..Step::default()
                },
                Step {
                    title: "Swap".into(),
                    array: Some(vec![entry("BN2", 9), entry("BN1", 4)]),
                    swap: Some(vec![1, 0]),
                    ..Step::default()
                },
            ],
            ..DashboardSnapshot::default()
        }
    }

    fn session() -> ReplaySession<CommandSurface> {
        ReplaySession::new(CommandSurface::pixels(800.0, 600.0), ReplayConfig::default())
    }

    #[test]
    fn loading_autoplays_from_initial_frame() {
        let mut s = session();
        s.load_snapshot(snapshot());
        let status = s.status();
        assert_eq!(status.total, 4);
        assert_eq!(status.current, Some(0));
        assert_eq!(status.status, Status::Playing);
        assert_eq!(s.surface().position(), (1, 4));

        s.advance(Duration::from_millis(1000));
        assert_eq!(s.status().current, Some(1));
        let model = s.surface().model().expect("frame shown");
        assert_eq!(model.array[1].name, "Tran B");
    }

    #[test]
    fn autoplay_off_shows_initial_frame_paused() {
        let mut config = ReplayConfig::default();
        config.playback.autoplay = false;
        let mut s = ReplaySession::new(CommandSurface::pixels(800.0, 600.0), config);
        s.load_snapshot(snapshot());
        assert_eq!(s.status().status, Status::Paused);
        assert_eq!(s.status().current, Some(0));
    }

    #[test]
    fn deactivate_drops_the_timeline() {
        let mut s = session();
        s.load_snapshot(snapshot());
        s.deactivate();
        assert!(s.frames().is_empty());
        assert_eq!(s.status().status, Status::Stopped);
        // Transport calls while inactive are ignored.
        s.step_forward();
        assert_eq!(s.status().current, None);

        s.activate();
        assert_eq!(s.frames().len(), 4);
    }

    #[test]
    fn loading_while_inactive_waits_for_activation() {
        let mut s = session();
        s.deactivate();
        s.load_snapshot(snapshot());
        assert!(s.playback().is_none());
        s.activate();
        assert!(s.playback().is_some());
    }

    #[test]
    fn speed_survives_reload() {
        let mut s = session();
        s.load_snapshot(snapshot());
        s.set_speed(2.0);
        s.set_speed(-1.0);
        s.load_snapshot(snapshot());
        assert_eq!(s.status().speed, 2.0);
        assert_eq!(
            s.playback().map(PlaybackController::period),
            Some(Duration::from_millis(500))
        );
    }

    #[test]
    fn empty_steps_stay_stopped() {
        let mut s = session();
        s.load_snapshot(DashboardSnapshot {
            steps: Vec::new(),
            ..snapshot()
        });
        assert_eq!(s.status().status, Status::Stopped);
        assert_eq!(s.status().total, 0);
        s.play();
        assert_eq!(s.status().status, Status::Stopped);
    }

    #[test]
    fn seek_last_and_step_list() {
        let mut s = session();
        s.load_snapshot(snapshot());
        s.seek_last();
        assert_eq!(s.status().current, Some(3));
        s.seek_step(0);
        assert_eq!(s.status().current, Some(1));
    }

    #[test]
    fn stats_fall_back_to_queue_counts() {
        let mut s = session();
        s.load_snapshot(snapshot());
        let stats = s.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.buckets.get("High-risk"), Some(&1));
        assert_eq!(stats.buckets.get("Light"), Some(&1));
    }

    #[test]
    fn load_bytes_reports_bad_payloads() {
        let mut s = session();
        assert!(s.load_bytes(b"nope").is_err());
        assert!(s.load_bytes(br#"[{"title": "Compare", "focus": [0, 1]}]"#).is_ok());
        assert_eq!(s.frames().len(), 2);
    }
}
