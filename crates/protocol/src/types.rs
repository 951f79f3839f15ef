use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// This point expressed relative to `origin`.
    pub fn relative_to(self, origin: Point) -> Self {
        Self::new(self.x - origin.x, self.y - origin.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn top_center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y)
    }

    pub fn bottom_center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h)
    }

    /// Half-open containment test: the right and bottom edges are outside.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.w && p.y >= self.y && p.y < self.y + self.h
    }

    /// Grow (or shrink, with a negative amount) the rect on every side.
    pub fn inflate(&self, amount: f64) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.w + amount * 2.0,
            self.h + amount * 2.0,
        )
    }
}

/// The drawable region a view lays itself out in.
///
/// Units are whatever the renderer uses: CSS pixels for SVG and the browser,
/// character cells for the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Whether anything can be drawn at all.
    pub fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_anchor_points() {
        let r = Rect::new(10.0, 20.0, 40.0, 30.0);
        assert_eq!(r.top_center(), Point::new(30.0, 20.0));
        assert_eq!(r.bottom_center(), Point::new(30.0, 50.0));
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(9.5, 9.5)));
        assert!(!r.contains(Point::new(10.0, 5.0)));
        assert!(!r.contains(Point::new(5.0, -0.1)));
    }

    #[test]
    fn relative_point() {
        let p = Point::new(15.0, 25.0).relative_to(Point::new(5.0, 5.0));
        assert_eq!(p, Point::new(10.0, 20.0));
    }

    #[test]
    fn degenerate_viewport_is_not_drawable() {
        assert!(Viewport::new(80.0, 24.0).is_drawable());
        assert!(!Viewport::new(0.0, 24.0).is_drawable());
        assert!(!Viewport::new(80.0, f64::NAN).is_drawable());
    }
}
