//! Axis-aligned rectangle

use serde::{Deserialize, Serialize};

use super::Vector;

/// Axis-aligned rectangle with its origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub w: f64,
    /// Height
    pub h: f64,
}

impl Rect {
    /// Create a new rectangle
    #[must_use]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Create from a position and a size
    #[must_use]
    pub const fn from_position_size(position: Vector, size: Vector) -> Self {
        Self::new(position.x, position.y, size.x, size.y)
    }

    /// Right edge
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Top-left corner
    #[must_use]
    pub const fn position(&self) -> Vector {
        Vector::new(self.x, self.y)
    }

    /// Width and height
    #[must_use]
    pub const fn size(&self) -> Vector {
        Vector::new(self.w, self.h)
    }

    /// Center point
    #[must_use]
    pub fn center(&self) -> Vector {
        Vector::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Whether the rectangle has no area
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Check if a point is inside the rectangle (edges included)
    #[must_use]
    pub fn contains(&self, point: Vector) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Whether two rectangles overlap with a non-empty area.
    /// Rectangles that only share an edge do not intersect.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// The overlap of two rectangles, if any
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(x, y, right - x, bottom - y))
    }

    /// Move the rectangle by an offset
    #[must_use]
    pub fn translated(&self, offset: Vector) -> Rect {
        Rect::new(self.x + offset.x, self.y + offset.y, self.w, self.h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(10.0, 10.0, 100.0, 50.0);

        assert!(rect.contains(Vector::new(50.0, 30.0)));
        assert!(rect.contains(Vector::new(110.0, 60.0)));
        assert!(!rect.contains(Vector::new(5.0, 5.0)));
    }

    #[test]
    fn test_intersection_is_clipped_overlap() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(30.0, 40.0, 50.0, 50.0);

        let overlap = a.intersection(&b).unwrap();
        assert_eq!(overlap, Rect::new(30.0, 40.0, 20.0, 10.0));
        assert_eq!(b.intersection(&a), Some(overlap));
    }

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(50.0, 0.0, 50.0, 50.0);

        assert!(!a.intersects(&b));
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn test_empty_rect_never_intersects() {
        let a = Rect::new(0.0, 0.0, 0.0, 50.0);
        let b = Rect::new(-10.0, -10.0, 100.0, 100.0);

        assert!(!a.intersects(&b));
    }
}
