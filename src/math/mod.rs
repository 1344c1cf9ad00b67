//! 2D geometry primitives
//!
//! Vectors are `glam::DVec2` (64-bit floats). [`Rect`] is an axis-aligned
//! rectangle and [`Transform`] derives an entity's world rectangle.

mod rect;
mod transform;

pub use rect::Rect;
pub use transform::Transform;

use serde::{Deserialize, Serialize};

/// 2D vector of 64-bit floats
pub type Vector = glam::DVec2;

/// Screen direction, used by out-of-bounds and collision semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards negative x
    Left,
    /// Towards positive x
    Right,
    /// Towards negative y
    Up,
    /// Towards positive y
    Down,
}

impl Direction {
    /// Direction as a unit vector in screen space (y grows downwards)
    #[must_use]
    pub const fn unit(self) -> Vector {
        match self {
            Self::Left => Vector::new(-1.0, 0.0),
            Self::Right => Vector::new(1.0, 0.0),
            Self::Up => Vector::new(0.0, -1.0),
            Self::Down => Vector::new(0.0, 1.0),
        }
    }
}
