//! Velocity integrator
//!
//! A [`Body`] moves its entity by its velocity once per update. With a
//! bounce field it reflects off the field edges; with bounce-on-collision it
//! reflects off other colliders, flipping the velocity component across the
//! narrower side of the overlap.

use crate::core::{EngineContext, EngineError};
use crate::delegate::CollisionEvent;
use crate::ecs::{Component, ComponentBase, DataBag, EntityRef};
use crate::math::{Rect, Vector};

/// Moves its entity by a constant velocity per update
#[derive(Debug)]
pub struct Body {
    base: ComponentBase,
    velocity: Vector,
    field: Option<Rect>,
    bounce_on_collision: bool,
}

impl Body {
    /// A body at rest
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: ComponentBase::new("body"),
            velocity: Vector::ZERO,
            field: None,
            bounce_on_collision: false,
        }
    }

    /// Set the velocity, in pixels per update
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }

    /// Reflect off the edges of `field`
    #[must_use]
    pub fn with_field(mut self, field: Rect) -> Self {
        self.field = Some(field);
        self
    }

    /// Reflect off other colliders
    #[must_use]
    pub fn with_bounce_on_collision(mut self, bounce: bool) -> Self {
        self.bounce_on_collision = bounce;
        self
    }

    /// Velocity in pixels per update
    #[must_use]
    pub const fn velocity(&self) -> Vector {
        self.velocity
    }

    /// Change the velocity
    pub fn set_velocity(&mut self, velocity: Vector) {
        self.velocity = velocity;
    }

    /// Bounce field
    #[must_use]
    pub const fn field(&self) -> Option<Rect> {
        self.field
    }

    /// Whether collisions reflect the body
    #[must_use]
    pub const fn bounces_on_collision(&self) -> bool {
        self.bounce_on_collision
    }

    /// Flip the velocity components pointing out of the field
    fn reflect_in_field(&mut self, rect: Rect, field: Rect) {
        if (rect.x <= field.x && self.velocity.x < 0.0)
            || (rect.right() >= field.right() && self.velocity.x > 0.0)
        {
            self.velocity.x = -self.velocity.x;
        }
        if (rect.y <= field.y && self.velocity.y < 0.0)
            || (rect.bottom() >= field.bottom() && self.velocity.y > 0.0)
        {
            self.velocity.y = -self.velocity.y;
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Body {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn on_start(&mut self, ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        if self.bounce_on_collision {
            self.base.listen_collisions::<Self>(ctx);
        }
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut EngineContext, owner: EntityRef) -> Result<(), EngineError> {
        let Some(entity) = ctx.entity_mut(owner) else {
            return Ok(());
        };
        entity.transform_mut().translate(self.velocity);
        let rect = entity.transform().rect();
        if let Some(field) = self.field {
            self.reflect_in_field(rect, field);
        }
        Ok(())
    }

    fn on_collision(
        &mut self,
        ctx: &mut EngineContext,
        owner: EntityRef,
        event: &CollisionEvent,
    ) -> Result<(), EngineError> {
        let Some(other) = event.other(owner.entity) else {
            return Ok(());
        };
        let (Some(me), Some(other)) = (
            ctx.entity(owner).map(|e| e.transform().center()),
            ctx.entity(EntityRef::new(owner.scene, other))
                .map(|e| e.transform().center()),
        ) else {
            return Ok(());
        };
        let towards = other - me;

        let (flip_x, flip_y) = match event.intersection {
            Some(overlap) if overlap.w > overlap.h => (false, true),
            Some(_) => (true, false),
            None => (true, true),
        };
        if flip_x && towards.x * self.velocity.x > 0.0 {
            self.velocity.x = -self.velocity.x;
        }
        if flip_y && towards.y * self.velocity.y > 0.0 {
            self.velocity.y = -self.velocity.y;
        }
        Ok(())
    }

    fn unmarshal(&mut self, data: &DataBag) -> Result<(), EngineError> {
        if let Some(velocity) = super::field(data, "velocity")? {
            self.velocity = velocity;
        }
        if let Some(field) = super::field(data, "field")? {
            self.field = Some(field);
        }
        if let Some(bounce) = super::field(data, "bounce_on_collision")? {
            self.bounce_on_collision = bounce;
        }
        Ok(())
    }
}
