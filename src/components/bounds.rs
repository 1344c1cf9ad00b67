//! Out-of-bounds detection
//!
//! [`OutOfBounds`] watches its entity's rectangle against an area (the
//! window by default). When the rectangle crosses an edge it publishes an
//! [`OutOfBoundsEvent`] on its own delegate, so subscribers can target this
//! entity's instance, and on the engine-wide `on-out-of-bounds` delegate.
//! Entities flagged `die_on_out_of_bounds` are destroyed.

use crate::core::{EngineContext, EngineError};
use crate::delegate::{Delegate, OutOfBoundsEvent, dispatch};
use crate::ecs::{Component, ComponentBase, DataBag, EntityRef};
use crate::math::{Direction, Rect};

/// Publishes when its entity leaves an area
#[derive(Debug)]
pub struct OutOfBounds {
    base: ComponentBase,
    area: Option<Rect>,
    outside: Option<Direction>,
    delegate: Option<Delegate<OutOfBoundsEvent>>,
}

impl OutOfBounds {
    /// Watch against the window area
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: ComponentBase::new("out-of-bounds"),
            area: None,
            outside: None,
            delegate: None,
        }
    }

    /// Watch against a fixed area
    #[must_use]
    pub fn with_area(mut self, area: Rect) -> Self {
        self.area = Some(area);
        self
    }

    /// Edge the entity is currently beyond
    #[must_use]
    pub const fn outside(&self) -> Option<Direction> {
        self.outside
    }

    /// This instance's delegate, once loaded
    #[must_use]
    pub const fn delegate(&self) -> Option<Delegate<OutOfBoundsEvent>> {
        self.delegate
    }

    /// First edge of `area` that `rect` crosses
    #[must_use]
    pub fn crossing(rect: Rect, area: Rect) -> Option<Direction> {
        if rect.x < area.x {
            Some(Direction::Left)
        } else if rect.right() > area.right() {
            Some(Direction::Right)
        } else if rect.y < area.y {
            Some(Direction::Up)
        } else if rect.bottom() > area.bottom() {
            Some(Direction::Down)
        } else {
            None
        }
    }
}

impl Default for OutOfBounds {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for OutOfBounds {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn on_awake(&mut self, ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        self.delegate = Some(self.base.create_delegate(ctx, "on-out-of-bounds"));
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut EngineContext, owner: EntityRef) -> Result<(), EngineError> {
        let Some(entity) = ctx.entity(owner) else {
            return Ok(());
        };
        let area = self.area.unwrap_or_else(|| {
            let (width, height) = ctx.window_size();
            Rect::new(0.0, 0.0, f64::from(width), f64::from(height))
        });
        let crossing = Self::crossing(entity.transform().rect(), area);
        let dies = entity.die_on_out_of_bounds;

        let previous = std::mem::replace(&mut self.outside, crossing);
        let Some(direction) = crossing.filter(|_| previous.is_none()) else {
            return Ok(());
        };

        log::debug!("entity out of bounds: entity={owner} direction={direction:?}");
        let event = OutOfBoundsEvent {
            scene: owner.scene,
            entity: owner.entity,
            direction,
        };
        if let Some(delegate) = self.delegate {
            dispatch(ctx, delegate, &event)?;
        }
        let global = ctx.on_out_of_bounds();
        dispatch(ctx, global, &event)?;

        if dies {
            ctx.destroy_entity(owner)?;
        }
        Ok(())
    }

    fn on_unload(&mut self, _ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        self.delegate = None;
        self.outside = None;
        Ok(())
    }

    fn unmarshal(&mut self, data: &DataBag) -> Result<(), EngineError> {
        if let Some(area) = super::field(data, "area")? {
            self.area = Some(area);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::components::Body;
    use crate::ecs::{Entity, lifecycle};
    use crate::math::Vector;
    use crate::scene::Scene;

    #[test]
    fn test_crossing_reports_first_edge() {
        let area = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(OutOfBounds::crossing(Rect::new(10.0, 10.0, 5.0, 5.0), area), None);
        assert_eq!(OutOfBounds::crossing(Rect::new(-1.0, 10.0, 5.0, 5.0), area), Some(Direction::Left));
        assert_eq!(OutOfBounds::crossing(Rect::new(98.0, 10.0, 5.0, 5.0), area), Some(Direction::Right));
        assert_eq!(OutOfBounds::crossing(Rect::new(10.0, 96.0, 5.0, 5.0), area), Some(Direction::Down));
    }

    #[test]
    fn test_publishes_once_per_crossing_on_both_channels() {
        let mut ctx = EngineContext::new(100, 100);
        let scene = ctx.scenes.add_scene(Scene::new("s"));
        let mut entity = Entity::new("rocket")
            .with_position(Vector::new(40.0, 10.0))
            .with_dim(Vector::new(10.0, 10.0))
            .with_component(Body::new().with_velocity(Vector::new(0.0, -6.0)))
            .unwrap()
            .with_component(OutOfBounds::new())
            .unwrap();
        entity.die_on_out_of_bounds = true;
        let owner = ctx.scenes.scene_mut(scene).unwrap().add_entity(entity);
        lifecycle::load_entity(&mut ctx, owner).unwrap();

        let events = Rc::new(RefCell::new(Vec::new()));
        let local = Rc::clone(&events);
        let delegate = ctx.component::<OutOfBounds>(owner).unwrap().delegate().unwrap();
        ctx.delegates.register(ctx.object().id(), delegate, move |_, e: &OutOfBoundsEvent| {
            local.borrow_mut().push(("local", e.direction));
            Ok(())
        });
        let global = Rc::clone(&events);
        let on_out = ctx.on_out_of_bounds();
        ctx.delegates.register(ctx.object().id(), on_out, move |_, e: &OutOfBoundsEvent| {
            global.borrow_mut().push(("global", e.direction));
            Ok(())
        });

        for _ in 0..4 {
            lifecycle::update_entity(&mut ctx, owner).unwrap();
        }
        assert_eq!(
            *events.borrow(),
            [("local", Direction::Up), ("global", Direction::Up)]
        );
        assert_eq!(ctx.scene(scene).unwrap().pending_deletes(), &[owner.entity]);
    }
}
