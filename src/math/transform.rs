//! Entity transform

use serde::{Deserialize, Serialize};

use super::{Rect, Vector};

/// Position, rotation and scale of an entity, plus its intrinsic size.
///
/// `dim` is set by content components (images, text, shapes). The world
/// rectangle is `(position, dim * scale)`; rotation only affects drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Top-left position in world space
    pub position: Vector,
    /// Rotation in degrees, clockwise
    pub rotation: f64,
    /// Scale factor
    pub scale: Vector,
    /// Intrinsic size before scaling
    pub dim: Vector,
}

impl Transform {
    /// Create a new transform at the origin
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with just a position
    #[must_use]
    pub fn from_position(position: Vector) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Get the position
    #[must_use]
    pub const fn position(&self) -> Vector {
        self.position
    }

    /// Set the position
    pub fn set_position(&mut self, position: Vector) {
        self.position = position;
    }

    /// Get the rotation in degrees
    #[must_use]
    pub const fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Set the rotation in degrees
    pub fn set_rotation(&mut self, degrees: f64) {
        self.rotation = degrees;
    }

    /// Get the scale
    #[must_use]
    pub const fn scale(&self) -> Vector {
        self.scale
    }

    /// Set the scale
    pub fn set_scale(&mut self, scale: Vector) {
        self.scale = scale;
    }

    /// Get the intrinsic size
    #[must_use]
    pub const fn dim(&self) -> Vector {
        self.dim
    }

    /// Set the intrinsic size
    pub fn set_dim(&mut self, dim: Vector) {
        self.dim = dim;
    }

    /// Translate by a delta
    pub fn translate(&mut self, delta: Vector) {
        self.position += delta;
    }

    /// Scaled size
    #[must_use]
    pub fn size(&self) -> Vector {
        self.dim * self.scale
    }

    /// World rectangle: `(x, y, dim.x * scale.x, dim.y * scale.y)`
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::from_position_size(self.position, self.size())
    }

    /// World rectangle as `(left, top, right, bottom)`
    #[must_use]
    pub fn rect_extents(&self) -> (f64, f64, f64, f64) {
        let rect = self.rect();
        (rect.x, rect.y, rect.right(), rect.bottom())
    }

    /// Center of the world rectangle
    #[must_use]
    pub fn center(&self) -> Vector {
        self.rect().center()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector::ZERO,
            rotation: 0.0,
            scale: Vector::ONE,
            dim: Vector::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scale_is_one() {
        let transform = Transform::new();
        assert_eq!(transform.scale(), Vector::ONE);
        assert_eq!(transform.rect(), Rect::default());
    }

    #[test]
    fn test_rect_applies_scale_to_dim() {
        let mut transform = Transform::from_position(Vector::new(10.0, 20.0));
        transform.set_dim(Vector::new(50.0, 40.0));
        transform.set_scale(Vector::new(2.0, 0.5));

        assert_eq!(transform.rect(), Rect::new(10.0, 20.0, 100.0, 20.0));
        assert_eq!(transform.rect_extents(), (10.0, 20.0, 110.0, 40.0));
    }

    #[test]
    fn test_translate_moves_rect() {
        let mut transform = Transform::from_position(Vector::new(1.0, 1.0));
        transform.set_dim(Vector::new(2.0, 2.0));
        transform.translate(Vector::new(3.0, -1.0));

        assert_eq!(transform.position(), Vector::new(4.0, 0.0));
        assert_eq!(transform.center(), Vector::new(5.0, 1.0));
    }
}
