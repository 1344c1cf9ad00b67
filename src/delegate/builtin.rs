//! Engine-wide channels and their payloads

use crate::core::{EntityId, Object, SceneId};
use crate::math::{Direction, Rect};

use super::{Delegate, DelegateManager};

/// Two colliders overlapped during a scene's collision pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    /// Scene the pair lives in
    pub scene: SceneId,
    /// First entity of the pair (lower registry index)
    pub a: EntityId,
    /// Second entity of the pair
    pub b: EntityId,
    /// Overlap rectangle in bounding-box mode, `None` in circle mode
    pub intersection: Option<Rect>,
}

impl CollisionEvent {
    /// Whether the entity is part of this collision
    #[must_use]
    pub fn involves(&self, entity: EntityId) -> bool {
        self.a == entity || self.b == entity
    }

    /// The other entity of the pair, if `entity` is part of it
    #[must_use]
    pub fn other(&self, entity: EntityId) -> Option<EntityId> {
        if self.a == entity {
            Some(self.b)
        } else if self.b == entity {
            Some(self.a)
        } else {
            None
        }
    }
}

/// An entity was marked for destruction
#[derive(Debug, Clone, PartialEq)]
pub struct DestroyEvent {
    /// Scene the entity lives in
    pub scene: SceneId,
    /// Destroyed entity
    pub entity: EntityId,
    /// Its name at the time of the request
    pub name: String,
}

/// An entity finished loading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadEvent {
    /// Scene the entity lives in
    pub scene: SceneId,
    /// Loaded entity
    pub entity: EntityId,
}

/// An entity left its allowed area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBoundsEvent {
    /// Scene the entity lives in
    pub scene: SceneId,
    /// Entity that left the area
    pub entity: EntityId,
    /// Edge it crossed
    pub direction: Direction,
}

/// The channels every engine publishes
#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    /// Collision pairs from the active scene
    pub on_collision: Delegate<CollisionEvent>,
    /// Entity destruction requests
    pub on_destroy: Delegate<DestroyEvent>,
    /// Entity loads
    pub on_load: Delegate<LoadEvent>,
    /// Out-of-bounds crossings from every bounds component
    pub on_out_of_bounds: Delegate<OutOfBoundsEvent>,
}

impl Builtins {
    /// Create the built-in channels on a bus, published by `engine`
    pub fn create(delegates: &mut DelegateManager, engine: &Object) -> Self {
        Self {
            on_collision: delegates.create(engine, "on-collision"),
            on_destroy: delegates.create(engine, "on-destroy"),
            on_load: delegates.create(engine, "on-load"),
            on_out_of_bounds: delegates.create(engine, "on-out-of-bounds"),
        }
    }
}
