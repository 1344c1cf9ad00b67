//! Update-counting timer
//!
//! A [`Timer`] counts updates and publishes a [`TimerEvent`] on its own
//! delegate each time the count reaches its interval. Other components
//! subscribe with [`ComponentBase::subscribe`].

use crate::core::{EngineContext, EngineError, EntityId};
use crate::delegate::{Delegate, dispatch};
use crate::ecs::{Component, ComponentBase, DataBag, EntityRef};

/// Published when a timer reaches its interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    /// Entity carrying the timer
    pub entity: EntityId,
    /// How many times the timer has fired, this one included
    pub fired: u32,
}

/// Fires every `interval` updates
#[derive(Debug)]
pub struct Timer {
    base: ComponentBase,
    interval: u32,
    count: u32,
    fired: u32,
    repeat: bool,
    delegate: Option<Delegate<TimerEvent>>,
}

impl Timer {
    /// A repeating timer firing every `interval` updates
    #[must_use]
    pub fn new(interval: u32) -> Self {
        Self {
            base: ComponentBase::new("timer"),
            interval: interval.max(1),
            count: 0,
            fired: 0,
            repeat: true,
            delegate: None,
        }
    }

    /// Fire once, then deactivate
    #[must_use]
    pub fn once(mut self) -> Self {
        self.repeat = false;
        self
    }

    /// Updates between two firings
    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// Updates counted since the last firing
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Number of firings so far
    #[must_use]
    pub const fn fired(&self) -> u32 {
        self.fired
    }

    /// Delegate the timer publishes on, once loaded
    #[must_use]
    pub const fn delegate(&self) -> Option<Delegate<TimerEvent>> {
        self.delegate
    }

    /// Restart counting from zero
    pub fn reset(&mut self) {
        self.count = 0;
    }
}

impl Component for Timer {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn on_awake(&mut self, ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        self.delegate = Some(self.base.create_delegate(ctx, "on-timer"));
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut EngineContext, owner: EntityRef) -> Result<(), EngineError> {
        self.count += 1;
        if self.count < self.interval {
            return Ok(());
        }
        self.count = 0;
        self.fired += 1;
        if !self.repeat {
            self.base.set_active(false);
        }
        log::trace!("timer fired: entity={owner} fired={}", self.fired);

        if let Some(delegate) = self.delegate {
            let event = TimerEvent {
                entity: owner.entity,
                fired: self.fired,
            };
            dispatch(ctx, delegate, &event)?;
        }
        Ok(())
    }

    fn on_unload(&mut self, _ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        self.delegate = None;
        Ok(())
    }

    fn unmarshal(&mut self, data: &DataBag) -> Result<(), EngineError> {
        if let Some(interval) = super::field::<u32>(data, "interval")? {
            self.interval = interval.max(1);
        }
        if let Some(repeat) = super::field(data, "repeat")? {
            self.repeat = repeat;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::ecs::{Entity, lifecycle};
    use crate::scene::Scene;

    /// Records the timer events it receives
    struct Alarm {
        base: ComponentBase,
    }

    impl Component for Alarm {
        fn base(&self) -> &ComponentBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ComponentBase {
            &mut self.base
        }
    }

    fn setup(timer: Timer, received: &Rc<RefCell<Vec<u32>>>) -> (EngineContext, EntityRef) {
        let mut alarm = Alarm {
            base: ComponentBase::new("alarm"),
        };
        let seen = Rc::clone(received);
        alarm.base.subscribe::<Timer, TimerEvent, _>(None, move |_, event| {
            seen.borrow_mut().push(event.fired);
            Ok(())
        });

        let mut ctx = EngineContext::new(10, 10);
        let scene = ctx.scenes.add_scene(Scene::new("s"));
        let entity = Entity::new("clock")
            .with_component(timer)
            .unwrap()
            .with_component(alarm)
            .unwrap();
        let owner = ctx.scenes.scene_mut(scene).unwrap().add_entity(entity);
        lifecycle::load_entity(&mut ctx, owner).unwrap();
        (ctx, owner)
    }

    #[test]
    fn test_fires_every_interval() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let (mut ctx, owner) = setup(Timer::new(3), &received);

        for _ in 0..7 {
            lifecycle::update_entity(&mut ctx, owner).unwrap();
        }
        assert_eq!(*received.borrow(), [1, 2]);
        assert_eq!(ctx.component::<Timer>(owner).unwrap().count(), 1);
    }

    #[test]
    fn test_one_shot_deactivates() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let (mut ctx, owner) = setup(Timer::new(2).once(), &received);

        for _ in 0..6 {
            lifecycle::update_entity(&mut ctx, owner).unwrap();
        }
        assert_eq!(*received.borrow(), [1]);
        assert!(!ctx.component::<Timer>(owner).unwrap().base().is_active());
    }

    #[test]
    fn test_unload_removes_delegate() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let (mut ctx, owner) = setup(Timer::new(1), &received);
        let delegate = ctx.component::<Timer>(owner).unwrap().delegate().unwrap();

        lifecycle::unload_entity(&mut ctx, owner).unwrap();
        assert!(!ctx.delegates.contains(delegate.id()));
    }
}
