use std::time::Duration;

use heap_replay_core::connectors::{NodeBounds, compute_connectors};
use heap_replay_core::views::CommandSurface;
use heap_replay_core::{ReplayConfig, ReplaySession, severity};
use heap_replay_protocol::{Point, Rect};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

fn js_err(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// A replay driven from the page: the host feeds elapsed time through
/// [`Replay::advance`] from its animation loop and paints `commands()`.
#[wasm_bindgen]
pub struct Replay {
    session: ReplaySession<CommandSurface>,
}

#[wasm_bindgen]
impl Replay {
    /// `config` is an optional JSON object in the shape of the config file.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64, config: Option<String>) -> Result<Replay, JsError> {
        let config = match config {
            Some(json) => {
                let config: ReplayConfig = serde_json::from_str(&json).map_err(js_err)?;
                config.validate().map_err(js_err)?;
                config
            }
            None => ReplayConfig::default(),
        };
        Ok(Self {
            session: ReplaySession::new(CommandSurface::pixels(width, height), config),
        })
    }

    /// Load an engine payload and start replaying it.
    pub fn load(&mut self, data: &[u8]) -> Result<(), JsError> {
        self.session.load_bytes(data).map_err(js_err)
    }

    pub fn activate(&mut self) {
        self.session.activate();
    }

    pub fn deactivate(&mut self) {
        self.session.deactivate();
    }

    pub fn play(&mut self) {
        self.session.play();
    }

    pub fn pause(&mut self) {
        self.session.pause();
    }

    pub fn toggle(&mut self) {
        self.session.toggle();
    }

    pub fn step_forward(&mut self) {
        self.session.step_forward();
    }

    pub fn step_backward(&mut self) {
        self.session.step_backward();
    }

    pub fn seek(&mut self, index: usize) {
        self.session.seek(index);
    }

    pub fn seek_step(&mut self, step_index: usize) {
        self.session.seek_step(step_index);
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    pub fn set_speed(&mut self, multiplier: f64) {
        self.session.set_speed(multiplier);
    }

    /// Feed `ms` milliseconds of wall-clock time to the timers.
    pub fn advance(&mut self, ms: f64) {
        if ms.is_finite() && ms > 0.0 {
            self.session.advance(Duration::from_secs_f64(ms / 1000.0));
        }
    }

    pub fn hover(&mut self, index: usize) {
        self.session.hover(index);
    }

    pub fn click(&mut self, index: usize) {
        self.session.click(index);
    }

    pub fn pointer_leave(&mut self) {
        self.session.pointer_leave();
    }

    /// The drawing area changed; the next frame is laid out for the new size.
    pub fn resize(&mut self, width: f64, height: f64) {
        let fresh = CommandSurface::pixels(width, height);
        self.session
            .surface_mut()
            .set_viewports(fresh.tree_viewport(), fresh.array_viewport());
        self.session.resize();
    }

    /// Render commands of the displayed frame as JSON.
    pub fn commands(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.session.surface().commands()).map_err(js_err)
    }

    /// Transport status (`current`, `total`, `status`, `speed`) as JSON.
    pub fn status(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.session.status()).map_err(js_err)
    }

    /// Queue statistics as JSON, derived from the queue when the engine sent none.
    pub fn stats(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.session.stats()).map_err(js_err)
    }

    /// Step titles in list order, as a JSON array of strings.
    pub fn steps(&self) -> Result<String, JsError> {
        let titles: Vec<&str> = self
            .session
            .frames()
            .iter()
            .filter(|f| f.step_index.is_some())
            .map(|f| f.description.as_str())
            .collect();
        serde_json::to_string(&titles).map_err(js_err)
    }

    /// Heap index under a pointer position, if any.
    pub fn slot_at(&self, x: f64, y: f64) -> Option<usize> {
        self.session
            .surface()
            .slot_at(Point::new(x, y))
            .map(|(_, index)| index)
    }
}

#[derive(Deserialize)]
struct BoundsInput {
    #[serde(default)]
    origin: Point,
    rects: Vec<Option<Rect>>,
}

/// Connectors for host-laid-out nodes. `bounds` is
/// `{"origin": {x, y}, "rects": [rect | null, ...]}` indexed by heap slot.
#[wasm_bindgen]
pub fn connectors(n: usize, bounds: &str) -> Result<String, JsError> {
    let input: BoundsInput = serde_json::from_str(bounds).map_err(js_err)?;
    let mut node_bounds = NodeBounds::new(input.origin);
    for (index, rect) in input.rects.into_iter().enumerate() {
        if let Some(rect) = rect {
            node_bounds.insert(index, rect);
        }
    }
    serde_json::to_string(&compute_connectors(n, &node_bounds)).map_err(js_err)
}

#[derive(Serialize)]
struct LegendRow {
    range: &'static str,
    label: &'static str,
    class: &'static str,
}

/// The severity legend as JSON rows, most severe first.
#[wasm_bindgen]
pub fn legend() -> Result<String, JsError> {
    let rows: Vec<LegendRow> = severity::legend()
        .iter()
        .map(|e| LegendRow {
            range: e.range,
            label: e.label.as_str(),
            class: e.display_class().badge_class(),
        })
        .collect();
    serde_json::to_string(&rows).map_err(js_err)
}
