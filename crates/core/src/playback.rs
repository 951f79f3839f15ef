//! Timeline driver: play / pause / step / seek over a fixed frame sequence.
//!
//! The timer is data, not a callback: it lives inside the `Playing` state
//! and is advanced by the host's event loop through [`PlaybackController::advance`].
//! Leaving `Playing` drops it, so at most one timer ever exists and every
//! user action that pauses cancels it before touching the frame index.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::connectors::{self, ResizeDebounce};
use crate::highlight::{Emphasis, HighlightSync};
use crate::model::Frame;
use crate::render::{RenderModel, Surface};

/// Tick period at 1× speed.
pub const BASE_PERIOD: Duration = Duration::from_millis(1000);
/// Default quiet period before connectors are recomputed after a resize.
pub const RESIZE_QUIET: Duration = Duration::from_millis(150);

const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// No frames, or playback never started.
    Stopped,
    Playing,
    /// Timer inactive; a frame is displayed.
    Paused,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Self::Stopped => "■ Stopped",
            Self::Playing => "▶ Playing",
            Self::Paused => "⏸ Paused",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Timer {
    period: Duration,
    elapsed: Duration,
}

impl Timer {
    fn new(period: Duration) -> Self {
        Self {
            period,
            elapsed: Duration::ZERO,
        }
    }

    /// Accumulate `dt` and return how many whole periods fired.
    fn fire(&mut self, dt: Duration) -> u128 {
        self.elapsed = self.elapsed.saturating_add(dt);
        let period = self.period.as_nanos().max(1);
        let elapsed = self.elapsed.as_nanos();
        let rest = u64::try_from(elapsed % period).unwrap_or(u64::MAX);
        self.elapsed = Duration::from_nanos(rest);
        elapsed / period
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Transport {
    Stopped,
    Paused,
    Playing(Timer),
}

/// Snapshot of the transport for progress displays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransportStatus {
    /// Displayed frame, `None` before anything was shown.
    pub current: Option<usize>,
    pub total: usize,
    pub status: Status,
    pub speed: f64,
}

pub struct PlaybackController<H> {
    frames: Vec<Frame>,
    current: Option<usize>,
    transport: Transport,
    speed: f64,
    base_period: Duration,
    highlights: HighlightSync<H>,
    resize: ResizeDebounce,
}

impl<H> PlaybackController<H> {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            current: None,
            transport: Transport::Stopped,
            speed: 1.0,
            base_period: BASE_PERIOD,
            highlights: HighlightSync::new(),
            resize: ResizeDebounce::new(RESIZE_QUIET),
        }
    }

    pub fn with_base_period(mut self, period: Duration) -> Self {
        self.base_period = period.max(MIN_PERIOD);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.set_speed(speed);
        self
    }

    pub fn with_resize_quiet(mut self, quiet: Duration) -> Self {
        self.resize = ResizeDebounce::new(quiet);
        self
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.current.and_then(|i| self.frames.get(i))
    }

    pub fn status(&self) -> Status {
        match self.transport {
            Transport::Stopped => Status::Stopped,
            Transport::Paused => Status::Paused,
            Transport::Playing(_) => Status::Playing,
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Period of the playback timer at the current speed.
    pub fn period(&self) -> Duration {
        Duration::try_from_secs_f64(self.base_period.as_secs_f64() / self.speed)
            .unwrap_or(Duration::MAX)
            .max(MIN_PERIOD)
    }

    pub fn transport_status(&self) -> TransportStatus {
        TransportStatus {
            current: self.current,
            total: self.frames.len(),
            status: self.status(),
            speed: self.speed,
        }
    }

    pub fn highlights(&self) -> &HighlightSync<H> {
        &self.highlights
    }

    fn last(&self) -> Option<usize> {
        self.frames.len().checked_sub(1)
    }

    /// Start auto-advancing. Replays from the start when sitting on the
    /// last frame. No-op without frames or when already playing.
    pub fn play(&mut self) {
        let Some(last) = self.last() else {
            return;
        };
        if matches!(self.transport, Transport::Playing(_)) {
            return;
        }
        if self.current == Some(last) {
            self.current = None;
        }
        self.transport = Transport::Playing(Timer::new(self.period()));
        tracing::debug!(from = ?self.current, period = ?self.period(), "playback started");
    }

    /// Cancel the timer. Idempotent; stays `Stopped` when there is nothing
    /// to show.
    pub fn pause(&mut self) {
        if self.frames.is_empty() {
            return;
        }
        if matches!(self.transport, Transport::Playing(_)) {
            tracing::debug!(at = ?self.current, "playback paused");
        }
        self.transport = Transport::Paused;
    }

    pub fn toggle(&mut self) {
        if self.status() == Status::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Change the speed multiplier. When playing, the timer is replaced at
    /// the new period; the frame index is untouched.
    pub fn set_speed(&mut self, multiplier: f64) {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            tracing::warn!(multiplier, "ignoring invalid playback speed");
            return;
        }
        self.speed = multiplier;
        if let Transport::Playing(_) = self.transport {
            self.transport = Transport::Playing(Timer::new(self.period()));
        }
        tracing::debug!(speed = multiplier, "playback speed changed");
    }

    pub fn step_forward<S: Surface<Handle = H>>(&mut self, surface: &mut S) {
        let Some(last) = self.last() else {
            return;
        };
        self.pause();
        self.current = Some(self.current.map_or(0, |i| (i + 1).min(last)));
        self.render(surface);
    }

    pub fn step_backward<S: Surface<Handle = H>>(&mut self, surface: &mut S) {
        if self.frames.is_empty() {
            return;
        }
        self.pause();
        self.current = Some(self.current.map_or(0, |i| i.saturating_sub(1)));
        self.render(surface);
    }

    /// Jump to a frame; out-of-range requests clamp to the last frame.
    pub fn seek<S: Surface<Handle = H>>(&mut self, index: usize, surface: &mut S) {
        let Some(last) = self.last() else {
            return;
        };
        self.pause();
        self.current = Some(index.min(last));
        self.render(surface);
    }

    /// Jump to the frame produced by step `step_index` of the step list.
    pub fn seek_step<S: Surface<Handle = H>>(&mut self, step_index: usize, surface: &mut S) {
        self.seek(step_index.saturating_add(1), surface);
    }

    pub fn reset<S: Surface<Handle = H>>(&mut self, surface: &mut S) {
        if self.frames.is_empty() {
            return;
        }
        self.pause();
        self.current = Some(0);
        self.render(surface);
    }

    /// Cooperative scheduler tick: feed wall-clock time to the playback
    /// timer and the resize debouncer.
    pub fn advance<S: Surface<Handle = H>>(&mut self, dt: Duration, surface: &mut S) {
        if self.resize.advance(dt) {
            self.refresh(surface);
        }
        let fired = match &mut self.transport {
            Transport::Playing(timer) => timer.fire(dt),
            _ => 0,
        };
        for _ in 0..fired {
            if !self.tick(surface) {
                break;
            }
        }
    }

    /// One timer tick. Returns whether playback continues.
    fn tick<S: Surface<Handle = H>>(&mut self, surface: &mut S) -> bool {
        let next = self.current.map_or(0, |i| i + 1);
        if next >= self.frames.len() {
            self.transport = Transport::Paused;
            tracing::debug!(frames = self.frames.len(), "playback reached the last frame");
            return false;
        }
        self.current = Some(next);
        self.render(surface);
        true
    }

    /// The viewport changed size; connectors are recomputed once the
    /// resize burst settles.
    pub fn resize(&mut self) {
        self.resize.notify();
    }

    pub fn hover<S: Surface<Handle = H>>(&mut self, index: usize, surface: &mut S) {
        self.highlights.hover(index);
        surface.emphasize(&self.highlights);
    }

    pub fn click<S: Surface<Handle = H>>(&mut self, index: usize, surface: &mut S) {
        self.highlights.click(index);
        surface.emphasize(&self.highlights);
    }

    pub fn pointer_leave<S: Surface<Handle = H>>(&mut self, surface: &mut S) {
        self.highlights.pointer_leave();
        surface.emphasize(&self.highlights);
    }

    /// Draw the current frame and apply its highlight.
    fn render<S: Surface<Handle = H>>(&mut self, surface: &mut S) {
        self.draw(surface, true);
    }

    /// Redraw the current frame after a layout change, keeping whatever
    /// emphasis is active (a click or hover outlives the redraw).
    fn refresh<S: Surface<Handle = H>>(&mut self, surface: &mut S) {
        self.draw(surface, false);
    }

    fn draw<S: Surface<Handle = H>>(&mut self, surface: &mut S, apply_frame_highlight: bool) {
        let Some(index) = self.current else {
            return;
        };
        let Some(frame) = self.frames.get(index) else {
            return;
        };
        let model = RenderModel::new(frame, index, self.frames.len());
        let handles = match surface.present(&model) {
            Ok(handles) => handles,
            Err(e) => {
                tracing::warn!(frame = index, "frame render failed: {e}");
                return;
            }
        };
        self.highlights.bind(handles);
        if apply_frame_highlight {
            match frame.highlight {
                Some(h) => self.highlights.apply(h.indices(), Emphasis::Step(h.kind)),
                None => self.highlights.clear(),
            }
        }
        surface.emphasize(&self.highlights);
        let connectors = connectors::compute_connectors(model.node_count(), &surface.node_bounds());
        surface.draw_connectors(&connectors);
        surface.progress(index + 1, self.frames.len());
    }
}
