//! Engine context
//!
//! [`EngineContext`] owns every manager and is threaded explicitly through
//! the game hooks, component hooks and delegate callbacks. It replaces
//! process-wide singletons: whoever holds the context can reach the scene
//! manager, the delegate bus, the resource managers and the cursor.

use std::time::Duration;

use crate::assets::{FontManager, ImageManager, font_manager, image_manager};
use crate::audio::{AudioOutput, SoundManager, sound_manager};
use crate::delegate::{
    Builtins, CollisionEvent, Delegate, DelegateManager, DestroyEvent, LoadEvent,
    OutOfBoundsEvent, RegisterId, dispatch,
};
use crate::ecs::{Component, ComponentRegistry, Entity, EntityRef, lifecycle};
use crate::input::{CursorManager, Input};
use crate::scene::{Layer, Scene, SceneManager};

use super::{EngineError, EventManager, Object, ObjectId, SceneId};

/// Every manager of a running engine
pub struct EngineContext {
    /// Keyboard and mouse state for the current frame
    pub input: Input,
    /// Decoded image surfaces
    pub images: ImageManager,
    /// Named event pools
    pub events: EventManager,
    /// Publish/subscribe bus
    pub delegates: DelegateManager,
    /// Scene list and transitions
    pub scenes: SceneManager,
    /// Opened fonts
    pub fonts: FontManager,
    /// Loaded sounds
    pub sounds: SoundManager,
    /// Cursor arbitration
    pub cursor: CursorManager,
    /// Component factories by name
    pub components: ComponentRegistry,
    /// Audio output, when the engine opened one
    pub audio: Option<AudioOutput>,
    object: Object,
    builtins: Builtins,
    frame: u64,
    delta: Duration,
    window_size: (u32, u32),
    should_quit: bool,
}

impl EngineContext {
    /// Construct every manager and the built-in delegates
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let object = Object::new("engine");
        let mut delegates = DelegateManager::new();
        let builtins = Builtins::create(&mut delegates, &object);
        let mut components = ComponentRegistry::new();
        crate::components::register_builtin(&mut components);

        Self {
            input: Input::new(),
            images: image_manager(),
            events: EventManager::new(),
            delegates,
            scenes: SceneManager::new(),
            fonts: font_manager(),
            sounds: sound_manager(),
            cursor: CursorManager::new(),
            components,
            audio: None,
            object,
            builtins,
            frame: 0,
            delta: Duration::ZERO,
            window_size: (width, height),
            should_quit: false,
        }
    }

    /// Start the managers, in construction order
    pub fn on_start(&mut self) {
        self.images.on_start();
        self.events.on_start();
        self.delegates.on_start();
        self.scenes.on_start();
        self.fonts.on_start();
        self.sounds.on_start();
        self.cursor.on_start();
        log::debug!("{} managers started", self.object);
    }

    /// Engine identity; publisher of the built-in delegates
    #[must_use]
    pub const fn object(&self) -> &Object {
        &self.object
    }

    /// Built-in delegates
    #[must_use]
    pub const fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Collision pairs of the active scene
    #[must_use]
    pub const fn on_collision(&self) -> Delegate<CollisionEvent> {
        self.builtins.on_collision
    }

    /// Entity destruction requests
    #[must_use]
    pub const fn on_destroy(&self) -> Delegate<DestroyEvent> {
        self.builtins.on_destroy
    }

    /// Entity loads
    #[must_use]
    pub const fn on_load(&self) -> Delegate<LoadEvent> {
        self.builtins.on_load
    }

    /// Out-of-bounds crossings
    #[must_use]
    pub const fn on_out_of_bounds(&self) -> Delegate<OutOfBoundsEvent> {
        self.builtins.on_out_of_bounds
    }

    /// Publish a payload, now or at the next drain
    ///
    /// # Errors
    ///
    /// Returns the first subscriber error of a synchronous trigger
    pub fn trigger<P: 'static>(
        &mut self,
        delegate: Delegate<P>,
        payload: P,
        now: bool,
    ) -> Result<(), EngineError> {
        if now {
            dispatch(self, delegate, &payload)
        } else {
            self.delegates.defer(delegate, payload);
            Ok(())
        }
    }

    /// Route collisions involving `owner` to the `on_collision` hook of its
    /// component of type `T`
    pub fn listen_collisions<T: Component>(
        &mut self,
        subscriber: ObjectId,
        owner: EntityRef,
    ) -> RegisterId {
        let delegate = self.builtins.on_collision;
        self.delegates.register(subscriber, delegate, move |ctx, event: &CollisionEvent| {
            if event.scene != owner.scene || !event.involves(owner.entity) {
                return Ok(());
            }
            lifecycle::with_component_of::<T, _>(ctx, owner, |component, ctx| {
                component.on_collision(ctx, owner, event)
            })
            .unwrap_or(Ok(()))
        })
    }

    /// Route out-of-bounds crossings of `owner` to the `on_out_of_bounds`
    /// hook of its component of type `T`
    pub fn listen_out_of_bounds<T: Component>(
        &mut self,
        subscriber: ObjectId,
        owner: EntityRef,
    ) -> RegisterId {
        let delegate = self.builtins.on_out_of_bounds;
        self.delegates.register(subscriber, delegate, move |ctx, event: &OutOfBoundsEvent| {
            if event.scene != owner.scene || event.entity != owner.entity {
                return Ok(());
            }
            lifecycle::with_component_of::<T, _>(ctx, owner, |component, ctx| {
                component.on_out_of_bounds(ctx, owner, event)
            })
            .unwrap_or(Ok(()))
        })
    }

    /// Get a scene by ID
    #[must_use]
    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.scene(id)
    }

    /// The active scene
    #[must_use]
    pub fn active_scene(&self) -> Option<&Scene> {
        self.scenes.active()
    }

    /// Get an entity
    #[must_use]
    pub fn entity(&self, owner: EntityRef) -> Option<&Entity> {
        self.scenes.scene(owner.scene)?.entity(owner.entity)
    }

    /// Get an entity, mutably
    pub fn entity_mut(&mut self, owner: EntityRef) -> Option<&mut Entity> {
        self.scenes.scene_mut(owner.scene)?.entity_mut(owner.entity)
    }

    /// Get a component of an entity. `None` while that component's own hook
    /// is running.
    #[must_use]
    pub fn component<T: Component>(&self, owner: EntityRef) -> Option<&T> {
        self.entity(owner)?.get_component::<T>()
    }

    /// Get a component of an entity, mutably
    pub fn component_mut<T: Component>(&mut self, owner: EntityRef) -> Option<&mut T> {
        self.entity_mut(owner)?.get_component_mut::<T>()
    }

    /// Run `f` on a component with the context available, taking the
    /// component out of its slot for the duration of the call
    pub fn with_component_mut<T, R>(
        &mut self,
        owner: EntityRef,
        f: impl FnOnce(&mut T, &mut Self) -> R,
    ) -> Option<R>
    where
        T: Component,
    {
        lifecycle::with_component_of::<T, R>(self, owner, f)
    }

    /// Queue an entity for destruction after this frame's update.
    ///
    /// Publishes `on-destroy` synchronously on the first request. Returns
    /// false if the entity is unknown or already queued.
    ///
    /// # Errors
    ///
    /// Returns the first `on-destroy` subscriber error
    pub fn destroy_entity(&mut self, owner: EntityRef) -> Result<bool, EngineError> {
        let Some(scene) = self.scenes.scene_mut(owner.scene) else {
            return Ok(false);
        };
        let name = match scene.entity(owner.entity) {
            Some(entity) => entity.name().to_string(),
            None => return Ok(false),
        };
        if !scene.mark_delete(owner.entity) {
            return Ok(false);
        }
        log::debug!("entity marked for delete: scene={} entity={name}({})", owner.scene, owner.entity);

        let event = DestroyEvent {
            scene: owner.scene,
            entity: owner.entity,
            name,
        };
        let delegate = self.builtins.on_destroy;
        dispatch(self, delegate, &event)?;
        Ok(true)
    }

    /// Enable or disable an entity, running `on_enable` on its loaded
    /// components when the flag changes. Returns false if unknown.
    ///
    /// # Errors
    ///
    /// Returns the first `on_enable` error
    pub fn set_entity_active(&mut self, owner: EntityRef, active: bool) -> Result<bool, EngineError> {
        let Some(entity) = self.entity_mut(owner) else {
            return Ok(false);
        };
        if entity.is_active() == active {
            return Ok(true);
        }
        entity.set_active(active);
        let loaded = entity.is_loaded();
        if loaded {
            lifecycle::enable_entity(self, owner, active)?;
        }
        Ok(true)
    }

    /// Move an entity to another render layer, rebucketing it if loaded.
    /// Returns false if unknown.
    pub fn set_entity_layer(&mut self, owner: EntityRef, layer: Layer) -> bool {
        self.scenes
            .scene_mut(owner.scene)
            .is_some_and(|scene| scene.set_layer(owner.entity, layer))
    }

    /// Ask the engine to stop after the current frame
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Whether a quit was requested
    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Number of frames started
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Duration of the previous frame
    #[must_use]
    pub const fn delta(&self) -> Duration {
        self.delta
    }

    /// Canvas size in pixels
    #[must_use]
    pub const fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    pub(crate) fn begin_frame(&mut self, frame: u64, delta: Duration) {
        self.frame = frame;
        self.delta = delta;
    }
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("frame", &self.frame)
            .field("window_size", &self.window_size)
            .field("scenes", &self.scenes)
            .field("delegates", &self.delegates.delegate_count())
            .field("registers", &self.delegates.register_count())
            .field("audio", &self.audio.is_some())
            .field("should_quit", &self.should_quit)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn context() -> EngineContext {
        let mut ctx = EngineContext::new(800, 400);
        ctx.on_start();
        ctx
    }

    #[test]
    fn test_builtins_exist_at_construction() {
        let ctx = context();
        assert_eq!(
            ctx.delegates.find::<CollisionEvent>("engine/on-collision"),
            Some(ctx.on_collision())
        );
        assert!(ctx.delegates.find::<OutOfBoundsEvent>("engine/on-out-of-bounds").is_some());
        assert_eq!(ctx.window_size(), (800, 400));
    }

    #[test]
    fn test_destroy_entity_publishes_once() {
        let mut ctx = context();
        let scene = ctx.scenes.add_scene(Scene::new("level"));
        let owner = ctx
            .scenes
            .scene_mut(scene)
            .unwrap()
            .add_entity(Entity::new("crate"));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let captured = Rc::clone(&seen);
        let delegate = ctx.on_destroy();
        ctx.delegates.register(ObjectId::next(), delegate, move |_, event: &DestroyEvent| {
            captured.borrow_mut().push(event.name.clone());
            Ok(())
        });

        assert!(ctx.destroy_entity(owner).unwrap());
        assert!(!ctx.destroy_entity(owner).unwrap());
        assert_eq!(*seen.borrow(), ["crate"]);
        assert!(ctx.entity(owner).is_some());
    }

    #[test]
    fn test_trigger_deferred_waits_for_drain() {
        let mut ctx = context();
        let count = Rc::new(RefCell::new(0));
        let captured = Rc::clone(&count);
        let delegate = ctx.on_load();
        ctx.delegates.register(ObjectId::next(), delegate, move |_, _: &LoadEvent| {
            *captured.borrow_mut() += 1;
            Ok(())
        });
        let event = LoadEvent {
            scene: ObjectId::next(),
            entity: ObjectId::next(),
        };

        ctx.trigger(delegate, event, false).unwrap();
        assert_eq!(*count.borrow(), 0);
        crate::delegate::drain(&mut ctx).unwrap();
        assert_eq!(*count.borrow(), 1);
        ctx.trigger(delegate, event, true).unwrap();
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_set_entity_layer_moves_loaded_entity_between_buckets() {
        let mut ctx = context();
        let scene = ctx.scenes.add_scene(Scene::new("level"));
        let owner = ctx
            .scenes
            .scene_mut(scene)
            .unwrap()
            .add_entity(Entity::new("hero").with_layer(Layer::Bottom));
        ctx.scenes.scene_mut(scene).unwrap().mark_loaded(owner.entity);

        assert!(ctx.set_entity_layer(owner, Layer::Top));
        let level = ctx.scene(scene).unwrap();
        assert_eq!(level.layer(Layer::Top), &[owner.entity]);
        assert!(level.layer(Layer::Bottom).is_empty());
        assert_eq!(ctx.entity(owner).unwrap().layer(), Layer::Top);
        level.assert_consistent();

        let stranger = EntityRef::new(scene, ObjectId::next());
        assert!(!ctx.set_entity_layer(stranger, Layer::Middle));
    }

    #[test]
    fn test_quit_flag() {
        let mut ctx = context();
        assert!(!ctx.should_quit());
        ctx.quit();
        assert!(ctx.should_quit());
    }
}
