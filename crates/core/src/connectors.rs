use std::collections::HashMap;
use std::time::Duration;

use heap_replay_protocol::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::layout;

/// On-screen bounds of tree nodes as realized by a rendering surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeBounds {
    /// Top-left of the container the connectors are drawn in.
    pub origin: Point,
    /// Flat heap index → node rectangle, in the same coordinate space as `origin`.
    pub rects: HashMap<usize, Rect>,
}

impl NodeBounds {
    pub fn new(origin: Point) -> Self {
        Self {
            origin,
            rects: HashMap::new(),
        }
    }

    pub fn insert(&mut self, index: usize, rect: Rect) {
        self.rects.insert(index, rect);
    }
}

/// A line from a parent's bottom edge to a child's top edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub parent: usize,
    pub child: usize,
    pub from: Point,
    pub to: Point,
}

/// One connector per non-root index in `1..n`, relative to the container
/// origin. Nodes without bounds (not rendered yet) are skipped individually.
pub fn compute_connectors(n: usize, bounds: &NodeBounds) -> Vec<Connector> {
    (1..n)
        .filter_map(|child| {
            let parent = layout::parent(child)?;
            let (Some(p), Some(c)) = (bounds.rects.get(&parent), bounds.rects.get(&child)) else {
                tracing::trace!(parent, child, "skipping connector without bounds");
                return None;
            };
            Some(Connector {
                parent,
                child,
                from: p.bottom_center().relative_to(bounds.origin),
                to: c.top_center().relative_to(bounds.origin),
            })
        })
        .collect()
}

/// Collapses a burst of resize notifications into one recompute after a
/// fixed quiet period.
#[derive(Debug, Clone)]
pub struct ResizeDebounce {
    quiet: Duration,
    /// Time since the most recent resize, while one is pending.
    pending: Option<Duration>,
}

impl ResizeDebounce {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Record a resize; restarts the quiet period.
    pub fn notify(&mut self) {
        self.pending = Some(Duration::ZERO);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Feed elapsed time. Returns `true` exactly once per burst, when the
    /// quiet period has passed without another `notify`.
    pub fn advance(&mut self, dt: Duration) -> bool {
        let Some(waited) = self.pending.as_mut() else {
            return false;
        };
        *waited += dt;
        if *waited >= self.quiet {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_bounds(n: usize) -> NodeBounds {
        let mut bounds = NodeBounds::new(Point::new(100.0, 50.0));
        for i in 0..n {
            let level = layout::level_of(i) as f64;
            bounds.insert(i, Rect::new(100.0 + i as f64 * 10.0, 50.0 + level * 40.0, 20.0, 30.0));
        }
        bounds
    }

    #[test]
    fn one_connector_per_non_root() {
        let connectors = compute_connectors(6, &grid_bounds(6));
        assert_eq!(connectors.len(), 5);
        let pairs: Vec<_> = connectors.iter().map(|c| (c.parent, c.child)).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 3), (1, 4), (2, 5)]);
    }

    #[test]
    fn endpoints_are_relative_to_origin() {
        let connectors = compute_connectors(2, &grid_bounds(2));
        let c = connectors[0];
        // Parent rect (100, 50, 20, 30): bottom center (110, 80) → (10, 30).
        assert_eq!(c.from, Point::new(10.0, 30.0));
        // Child rect (110, 90, 20, 30): top center (120, 90) → (20, 40).
        assert_eq!(c.to, Point::new(20.0, 40.0));
    }

    #[test]
    fn missing_bounds_skip_only_that_connector() {
        let mut bounds = grid_bounds(7);
        bounds.rects.remove(&4);
        let connectors = compute_connectors(7, &bounds);
        assert_eq!(connectors.len(), 5);
        assert!(connectors.iter().all(|c| c.child != 4));

        // Losing a parent drops both of its child connectors.
        bounds.rects.remove(&2);
        let connectors = compute_connectors(7, &bounds);
        let children: Vec<_> = connectors.iter().map(|c| c.child).collect();
        assert_eq!(children, vec![1, 3]);
    }

    #[test]
    fn trivial_heaps_have_no_connectors() {
        assert!(compute_connectors(0, &NodeBounds::default()).is_empty());
        assert!(compute_connectors(1, &grid_bounds(1)).is_empty());
    }

    #[test]
    fn debounce_fires_once_after_quiet_period() {
        let mut d = ResizeDebounce::new(Duration::from_millis(150));
        assert!(!d.advance(Duration::from_secs(1)));

        d.notify();
        assert!(!d.advance(Duration::from_millis(100)));
        // Another resize restarts the wait.
        d.notify();
        assert!(!d.advance(Duration::from_millis(100)));
        assert!(d.advance(Duration::from_millis(60)));
        assert!(!d.is_pending());
        assert!(!d.advance(Duration::from_millis(500)));
    }
}
