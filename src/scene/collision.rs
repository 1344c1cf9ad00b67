//! Collision narrowphase
//!
//! Scenes keep a registry of entities carrying a collider and test every
//! pair `(i, j)` with `i < j` once per frame. The test depends on the
//! scene's [`CollisionMode`].

use serde::{Deserialize, Serialize};

use crate::math::{Rect, Vector};

/// Narrowphase rule used by a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionMode {
    /// No collision pass
    #[default]
    None,
    /// Axis-aligned bounding rectangles; events carry the overlap
    BoundingBox,
    /// Circles around the rectangle centers
    Circle,
}

/// Shape a collider contributes to the collision pass
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColliderShape {
    /// Circle radius; derived from the entity rectangle when `None`
    pub radius: Option<f64>,
}

/// Collision volume of one registry entry, resolved for this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    /// World rectangle of the entity
    pub rect: Rect,
    /// Circle radius used in circle mode
    pub radius: f64,
}

impl Volume {
    /// Resolve a collider shape against an entity rectangle.
    ///
    /// Without an explicit radius the circle is inscribed in the rectangle.
    #[must_use]
    pub fn new(rect: Rect, shape: ColliderShape) -> Self {
        let radius = shape.radius.unwrap_or(rect.w.min(rect.h) / 2.0);
        Self { rect, radius }
    }

    /// Circle center
    #[must_use]
    pub fn center(&self) -> Vector {
        self.rect.center()
    }
}

/// Outcome of testing one pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    /// Rectangles overlap by this area
    Overlap(Rect),
    /// Circles overlap
    Touch,
}

impl Contact {
    /// Overlap rectangle, if the contact has one
    #[must_use]
    pub const fn intersection(&self) -> Option<Rect> {
        match self {
            Self::Overlap(rect) => Some(*rect),
            Self::Touch => None,
        }
    }
}

/// Test a pair of volumes under a collision mode
#[must_use]
pub fn test_pair(mode: CollisionMode, a: &Volume, b: &Volume) -> Option<Contact> {
    match mode {
        CollisionMode::None => None,
        CollisionMode::BoundingBox => {
            if !a.rect.intersects(&b.rect) {
                return None;
            }
            a.rect.intersection(&b.rect).map(Contact::Overlap)
        }
        CollisionMode::Circle => {
            let distance = a.center().distance(b.center());
            (distance < a.radius + b.radius).then_some(Contact::Touch)
        }
    }
}
