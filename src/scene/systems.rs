//! Per-frame scene passes
//!
//! The engine loop calls these in order on the active scene:
//! [`frame_start`], [`update`], [`after_update`], [`render`] and
//! [`frame_end`]. Queued scene transitions are applied by [`frame_end`], at
//! most one per frame.

use crate::core::{EngineContext, EngineError, EntityId, SceneId};
use crate::delegate::{self, CollisionEvent, LoadEvent, dispatch};
use crate::ecs::{ComponentSlot, Entity, EntityRef, lifecycle};
use crate::renderer::Canvas;

use super::{CollisionMode, Layer, Scene, SceneTransition, Volume, test_pair};

fn keep_first(first: &mut Option<EngineError>, result: Result<(), EngineError>) {
    if let Err(err) = result {
        if first.is_none() {
            *first = Some(err);
        } else {
            log::error!("error during teardown: {err}");
        }
    }
}

fn loaded_snapshot(ctx: &EngineContext, scene: SceneId) -> Vec<EntityId> {
    ctx.scene(scene).map(|s| s.loaded().to_vec()).unwrap_or_default()
}

/// Whether an entity is active and not queued for deletion
fn is_live(ctx: &EngineContext, owner: EntityRef) -> bool {
    ctx.scene(owner.scene).is_some_and(|scene| {
        !scene.is_pending_delete(owner.entity)
            && scene.entity(owner.entity).is_some_and(Entity::is_active)
    })
}

/// Frame start: load entities waiting in the unloaded projection, then
/// run `on_cycle_start` on the loaded ones
///
/// # Errors
///
/// Returns the first hook or `on-load` subscriber error
pub fn frame_start(ctx: &mut EngineContext) -> Result<(), EngineError> {
    let Some(scene) = ctx.scenes.active_id() else {
        return Ok(());
    };
    load_pass(ctx, scene)?;

    for id in loaded_snapshot(ctx, scene) {
        let owner = EntityRef::new(scene, id);
        if is_live(ctx, owner) {
            lifecycle::cycle_start(ctx, owner)?;
        }
    }
    Ok(())
}

/// Load every active unloaded entity of a scene, then pick up components
/// attached to entities that were already loaded
fn load_pass(ctx: &mut EngineContext, scene: SceneId) -> Result<(), EngineError> {
    let waiting = ctx.scene(scene).map(|s| s.unloaded().to_vec()).unwrap_or_default();
    let mut count = 0;
    for id in waiting {
        let owner = EntityRef::new(scene, id);
        if !is_live(ctx, owner) {
            continue;
        }
        lifecycle::load_entity(ctx, owner)?;
        if let Some(scene) = ctx.scenes.scene_mut(scene) {
            scene.mark_loaded(id);
        }
        let delegate = ctx.on_load();
        dispatch(ctx, delegate, &LoadEvent { scene, entity: id })?;
        count += 1;
    }

    for id in loaded_snapshot(ctx, scene) {
        let owner = EntityRef::new(scene, id);
        if lifecycle::has_unloaded_components(ctx, owner) {
            lifecycle::load_entity(ctx, owner)?;
            if let Some(scene) = ctx.scenes.scene_mut(scene) {
                scene.refresh_collider(id);
            }
        }
    }

    if count > 0 {
        log::debug!("entities loaded: scene={scene} count={count}");
    }
    Ok(())
}

/// Update pass: entity updates, then the deferred delegate drain, then the
/// collision pass
///
/// # Errors
///
/// Returns the first hook or subscriber error
pub fn update(ctx: &mut EngineContext) -> Result<(), EngineError> {
    let Some(scene) = ctx.scenes.active_id() else {
        return Ok(());
    };

    for id in loaded_snapshot(ctx, scene) {
        let owner = EntityRef::new(scene, id);
        if is_live(ctx, owner) {
            lifecycle::update_entity(ctx, owner)?;
        }
    }

    let drained = delegate::drain(ctx)?;
    if drained > 0 {
        log::trace!("deferred deliveries: scene={scene} count={drained}");
    }

    collide(ctx, scene)
}

/// Collision volume of an entity: the first active collider component
fn volume_of(entity: &Entity) -> Option<Volume> {
    if !entity.is_active() {
        return None;
    }
    let shape = entity
        .components()
        .iter()
        .filter_map(ComponentSlot::get)
        .filter(|c| c.base().is_active())
        .find_map(|c| c.collider())?;
    Some(Volume::new(entity.transform().rect(), shape))
}

/// Test every registered pair `(i, j)`, `i < j`, and publish contacts on the
/// built-in collision delegate
fn collide(ctx: &mut EngineContext, scene: SceneId) -> Result<(), EngineError> {
    let Some(current) = ctx.scene(scene) else {
        return Ok(());
    };
    let mode = current.collision_mode();
    if mode == CollisionMode::None {
        return Ok(());
    }
    let volumes: Vec<(EntityId, Volume)> = current
        .colliders()
        .iter()
        .filter_map(|&id| Some((id, volume_of(current.entity(id)?)?)))
        .collect();

    for (i, &(a, volume_a)) in volumes.iter().enumerate() {
        for &(b, volume_b) in &volumes[i + 1..] {
            let skip = ctx
                .scene(scene)
                .is_none_or(|s| s.is_pending_delete(a) || s.is_pending_delete(b));
            if skip {
                continue;
            }
            let Some(contact) = test_pair(mode, &volume_a, &volume_b) else {
                continue;
            };

            let event = CollisionEvent {
                scene,
                a,
                b,
                intersection: contact.intersection(),
            };
            let delegate = ctx.on_collision();
            dispatch(ctx, delegate, &event)?;

            for id in [a, b] {
                let owner = EntityRef::new(scene, id);
                if ctx.entity(owner).is_some_and(|e| e.die_on_collision) {
                    ctx.destroy_entity(owner)?;
                }
            }
        }
    }
    Ok(())
}

/// After-update: destroy and remove every entity queued for deletion
///
/// # Errors
///
/// Returns the first destroy hook error; every queued entity is removed
/// regardless
pub fn after_update(ctx: &mut EngineContext) -> Result<(), EngineError> {
    let Some(scene) = ctx.scenes.active_id() else {
        return Ok(());
    };
    let deletes = ctx
        .scenes
        .scene_mut(scene)
        .map(Scene::take_deletes)
        .unwrap_or_default();
    reap(ctx, scene, deletes)
}

fn reap(ctx: &mut EngineContext, scene: SceneId, ids: Vec<EntityId>) -> Result<(), EngineError> {
    let mut first = None;
    for id in ids {
        let owner = EntityRef::new(scene, id);
        keep_first(&mut first, lifecycle::destroy_entity(ctx, owner));
        if let Some(removed) = ctx.scenes.scene_mut(scene).and_then(|s| s.remove_entity(id)) {
            log::debug!("entity removed: scene={scene} entity={}", removed.object());
        }
    }
    first.map_or(Ok(()), Err)
}

/// Draw the active scene, layer by layer in ascending order
pub fn render(ctx: &EngineContext, canvas: &mut dyn Canvas) {
    let Some(scene) = ctx.active_scene() else {
        return;
    };
    for layer in Layer::ALL {
        for &id in scene.layer(layer) {
            let Some(entity) = scene.entity(id) else {
                continue;
            };
            if !entity.is_active() {
                continue;
            }
            for component in entity.components().iter().filter_map(ComponentSlot::get) {
                if component.base().is_active() {
                    component.on_render(ctx, entity, canvas);
                }
            }
        }
    }
}

/// Frame end: run `on_cycle_end`, then apply at most one queued transition
///
/// # Errors
///
/// Returns the first hook or builder error
pub fn frame_end(ctx: &mut EngineContext) -> Result<(), EngineError> {
    if let Some(scene) = ctx.scenes.active_id() {
        for id in loaded_snapshot(ctx, scene) {
            let owner = EntityRef::new(scene, id);
            if is_live(ctx, owner) {
                lifecycle::cycle_end(ctx, owner)?;
            }
        }
    }

    apply_pending(ctx)
}

/// Apply the oldest queued scene transition, if any
///
/// # Errors
///
/// Returns the first hook or builder error
pub fn apply_pending(ctx: &mut EngineContext) -> Result<(), EngineError> {
    match ctx.scenes.pop_transition() {
        Some(transition) => apply_transition(ctx, transition),
        None => Ok(()),
    }
}

fn apply_transition(ctx: &mut EngineContext, transition: SceneTransition) -> Result<(), EngineError> {
    let Some(target) = ctx.scenes.target_of(transition) else {
        log::warn!("scene transition dropped: {transition:?} has no target");
        return Ok(());
    };
    let active = ctx.scenes.active_id();
    let standby = ctx.scenes.standby_id();
    log::info!(
        "scene transition: {transition:?} from={} to={target}",
        active.map_or_else(|| "none".to_string(), |id| id.to_string())
    );

    match transition {
        SceneTransition::SwapTo(_) => {
            if let Some(active) = active {
                swap_out(ctx, active)?;
            }
            if let Some(old) = standby.filter(|&old| Some(old) != active && old != target) {
                destroy_scene(ctx, old)?;
            }
            ctx.scenes.set_standby_id(active);
            if standby == Some(target) {
                resume(ctx, target)
            } else {
                activate(ctx, target)
            }
        }
        SceneTransition::SwapBack => {
            if let Some(active) = active.filter(|&id| id != target) {
                destroy_scene(ctx, active)?;
            }
            ctx.scenes.set_standby_id(None);
            resume(ctx, target)
        }
        _ => {
            if let Some(active) = active {
                destroy_scene(ctx, active)?;
            }
            if standby == Some(target) {
                ctx.scenes.set_standby_id(None);
                destroy_scene(ctx, target)?;
            }
            activate(ctx, target)
        }
    }
}

/// Make a scene active, run its builder and load what it created
fn activate(ctx: &mut EngineContext, scene: SceneId) -> Result<(), EngineError> {
    ctx.scenes.set_active_id(Some(scene));
    let builder = ctx.scenes.scene_mut(scene).and_then(Scene::take_builder);
    if let Some(mut builder) = builder {
        let result = builder(ctx, scene);
        if let Some(current) = ctx.scenes.scene_mut(scene) {
            current.restore_builder(builder);
        }
        result?;
    }
    load_pass(ctx, scene)
}

/// Make a retained scene active again without rebuilding it
fn resume(ctx: &mut EngineContext, scene: SceneId) -> Result<(), EngineError> {
    ctx.scenes.set_active_id(Some(scene));
    load_pass(ctx, scene)
}

/// Unload a scene's entities, keeping them for a later [`resume`].
/// Entities flagged `destroy_on_unload` and queued deletes are destroyed.
fn swap_out(ctx: &mut EngineContext, scene: SceneId) -> Result<(), EngineError> {
    let mut doomed = ctx
        .scenes
        .scene_mut(scene)
        .map(Scene::take_deletes)
        .unwrap_or_default();

    for id in loaded_snapshot(ctx, scene) {
        let owner = EntityRef::new(scene, id);
        if ctx.entity(owner).is_some_and(|e| e.destroy_on_unload) {
            doomed.push(id);
            continue;
        }
        lifecycle::unload_entity(ctx, owner)?;
        if let Some(scene) = ctx.scenes.scene_mut(scene) {
            scene.mark_unloaded(id);
        }
    }

    reap(ctx, scene, doomed)?;
    log::debug!("scene swapped out: scene={scene}");
    Ok(())
}

/// Destroy every entity of a scene and empty it
///
/// # Errors
///
/// Returns the first destroy hook error; the scene is emptied regardless
pub fn destroy_scene(ctx: &mut EngineContext, scene: SceneId) -> Result<(), EngineError> {
    let ids: Vec<EntityId> = ctx
        .scene(scene)
        .map(|s| s.entities().map(Entity::id).collect())
        .unwrap_or_default();

    let mut first = None;
    for &id in &ids {
        keep_first(&mut first, lifecycle::destroy_entity(ctx, EntityRef::new(scene, id)));
    }
    if let Some(current) = ctx.scenes.scene_mut(scene) {
        current.clear();
    }
    log::debug!("scene destroyed: scene={scene} entities={}", ids.len());
    first.map_or(Ok(()), Err)
}

/// Destroy a scene's entities, standby ones included, then remove the scene
/// from the manager. The active scene is refused and left untouched.
///
/// # Errors
///
/// Returns the first destroy hook error; the scene is removed regardless
pub fn delete_scene(ctx: &mut EngineContext, scene: SceneId) -> Result<Option<Scene>, EngineError> {
    if ctx.scenes.active_id() == Some(scene) || ctx.scene(scene).is_none() {
        return Ok(ctx.scenes.remove_scene(scene));
    }
    let destroyed = destroy_scene(ctx, scene);
    let removed = ctx.scenes.remove_scene(scene);
    destroyed.map(|()| removed)
}

/// Destroy the active and standby scenes. Called once when the engine stops.
///
/// # Errors
///
/// Returns the first destroy hook error
pub fn shutdown(ctx: &mut EngineContext) -> Result<(), EngineError> {
    let mut first = None;
    for scene in [ctx.scenes.active_id(), ctx.scenes.standby_id()].into_iter().flatten() {
        keep_first(&mut first, destroy_scene(ctx, scene));
    }
    ctx.scenes.set_active_id(None);
    ctx.scenes.set_standby_id(None);
    first.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::core::EngineError;
    use crate::delegate::DestroyEvent;
    use crate::ecs::{Component, ComponentBase};
    use crate::math::{Rect, Vector};
    use crate::renderer::{Color, SoftwareCanvas};
    use crate::scene::ColliderShape;

    /// Collides, fills its rectangle and counts updates
    struct Block {
        base: ComponentBase,
        color: Color,
        updates: u32,
    }

    impl Block {
        fn new(color: Color) -> Self {
            Self {
                base: ComponentBase::new("block"),
                color,
                updates: 0,
            }
        }
    }

    impl Component for Block {
        fn base(&self) -> &ComponentBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ComponentBase {
            &mut self.base
        }

        fn on_update(&mut self, _: &mut EngineContext, _: EntityRef) -> Result<(), EngineError> {
            self.updates += 1;
            Ok(())
        }

        fn on_render(&self, _: &EngineContext, entity: &Entity, canvas: &mut dyn Canvas) {
            canvas.set_draw_color(self.color);
            canvas.fill_rect(entity.transform().rect());
        }

        fn collider(&self) -> Option<ColliderShape> {
            Some(ColliderShape::default())
        }
    }

    fn block(name: &str, x: f64, y: f64) -> Entity {
        Entity::new(name)
            .with_position(Vector::new(x, y))
            .with_dim(Vector::new(10.0, 10.0))
            .with_component(Block::new(Color::rgb(255, 255, 255)))
            .unwrap()
    }

    fn context() -> EngineContext {
        let mut ctx = EngineContext::new(100, 100);
        ctx.on_start();
        ctx
    }

    /// Add a scene, activate it and run one frame-end so it becomes active
    fn activate_new(ctx: &mut EngineContext, scene: Scene) -> SceneId {
        let id = ctx.scenes.add_scene(scene);
        assert!(ctx.scenes.set_active_scene(id));
        frame_end(ctx).unwrap();
        id
    }

    fn frame(ctx: &mut EngineContext) {
        frame_start(ctx).unwrap();
        update(ctx).unwrap();
        after_update(ctx).unwrap();
        frame_end(ctx).unwrap();
    }

    #[test]
    fn test_load_pass_skips_inactive_and_publishes_loads() {
        let mut ctx = context();
        let scene = activate_new(&mut ctx, Scene::new("level"));
        let loads = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&loads);
        let delegate = ctx.on_load();
        ctx.delegates.register(ctx.object().id(), delegate, move |_, e: &LoadEvent| {
            seen.borrow_mut().push(e.entity);
            Ok(())
        });

        let current = ctx.scenes.scene_mut(scene).unwrap();
        let a = current.add_entity(block("a", 0.0, 0.0));
        let mut sleeping = block("b", 50.0, 50.0);
        sleeping.set_active(false);
        let b = current.add_entity(sleeping);

        frame_start(&mut ctx).unwrap();
        let current = ctx.scene(scene).unwrap();
        assert_eq!(current.loaded(), &[a.entity]);
        assert_eq!(current.unloaded(), &[b.entity]);
        assert_eq!(current.colliders(), &[a.entity]);
        assert_eq!(*loads.borrow(), [a.entity]);
        current.assert_consistent();

        ctx.entity_mut(b).unwrap().set_active(true);
        frame_start(&mut ctx).unwrap();
        assert_eq!(ctx.scene(scene).unwrap().loaded(), &[a.entity, b.entity]);
        assert_eq!(loads.borrow().len(), 2);
    }

    #[test]
    fn test_bounding_box_collision_publishes_overlap() {
        let mut ctx = context();
        let scene = activate_new(
            &mut ctx,
            Scene::new("level").with_collision_mode(CollisionMode::BoundingBox),
        );
        let current = ctx.scenes.scene_mut(scene).unwrap();
        let a = current.add_entity(block("a", 0.0, 0.0)).entity;
        let b = current.add_entity(block("b", 5.0, 6.0)).entity;
        current.add_entity(block("far", 80.0, 80.0));

        let events = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&events);
        let delegate = ctx.on_collision();
        ctx.delegates.register(ctx.object().id(), delegate, move |_, e: &CollisionEvent| {
            seen.borrow_mut().push(*e);
            Ok(())
        });

        frame_start(&mut ctx).unwrap();
        update(&mut ctx).unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!((events[0].a, events[0].b), (a, b));
        assert_eq!(events[0].intersection, Some(Rect::new(5.0, 6.0, 5.0, 4.0)));
    }

    #[test]
    fn test_die_on_collision_is_deferred_to_after_update() {
        let mut ctx = context();
        let scene = activate_new(
            &mut ctx,
            Scene::new("level").with_collision_mode(CollisionMode::Circle),
        );
        let mut fragile = block("fragile", 0.0, 0.0);
        fragile.die_on_collision = true;
        let current = ctx.scenes.scene_mut(scene).unwrap();
        let fragile = current.add_entity(fragile);
        let wall = current.add_entity(block("wall", 4.0, 0.0));

        let destroyed = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&destroyed);
        let delegate = ctx.on_destroy();
        ctx.delegates.register(ctx.object().id(), delegate, move |_, e: &DestroyEvent| {
            seen.borrow_mut().push(e.name.clone());
            Ok(())
        });

        frame_start(&mut ctx).unwrap();
        update(&mut ctx).unwrap();
        assert_eq!(*destroyed.borrow(), ["fragile"]);
        assert!(ctx.entity(fragile).is_some());
        assert!(ctx.scene(scene).unwrap().colliders().len() == 1);
        ctx.scene(scene).unwrap().assert_consistent();

        after_update(&mut ctx).unwrap();
        assert!(ctx.entity(fragile).is_none());
        assert!(ctx.entity(wall).is_some());
        ctx.scene(scene).unwrap().assert_consistent();
    }

    #[test]
    fn test_render_draws_layers_back_to_front() {
        let mut ctx = context();
        let scene = activate_new(&mut ctx, Scene::new("level"));
        let top = Entity::new("top")
            .with_layer(Layer::Top)
            .with_dim(Vector::new(10.0, 10.0))
            .with_component(Block::new(Color::rgb(255, 0, 0)))
            .unwrap();
        let bottom = Entity::new("bottom")
            .with_layer(Layer::Bottom)
            .with_dim(Vector::new(10.0, 10.0))
            .with_component(Block::new(Color::rgb(0, 0, 255)))
            .unwrap();
        let current = ctx.scenes.scene_mut(scene).unwrap();
        current.add_entity(top);
        current.add_entity(bottom);
        frame_start(&mut ctx).unwrap();

        let mut canvas = SoftwareCanvas::new(20, 20);
        render(&ctx, &mut canvas);
        assert_eq!(canvas.pixel(5, 5), Some(Color::rgb(255, 0, 0)));
    }

    #[test]
    fn test_transition_waits_for_frame_end() {
        let mut ctx = context();
        let first = activate_new(
            &mut ctx,
            Scene::new("first").with_builder(|ctx, id| {
                ctx.scenes.scene_mut(id).unwrap().add_entity(block("a", 0.0, 0.0));
                Ok(())
            }),
        );
        let second = ctx.scenes.add_scene(Scene::new("second"));
        let delegates = ctx.delegates.delegate_count();
        assert_eq!(ctx.scene(first).unwrap().loaded().len(), 1);

        assert!(ctx.scenes.set_active_next());
        frame_start(&mut ctx).unwrap();
        update(&mut ctx).unwrap();
        after_update(&mut ctx).unwrap();
        assert_eq!(ctx.scenes.active_id(), Some(first));

        frame_end(&mut ctx).unwrap();
        assert_eq!(ctx.scenes.active_id(), Some(second));
        assert!(ctx.scene(first).unwrap().is_empty());
        assert!(ctx.delegates.delegate_count() <= delegates);
    }

    #[test]
    fn test_restart_rebuilds_scene() {
        let builds = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&builds);
        let mut ctx = context();
        let scene = activate_new(
            &mut ctx,
            Scene::new("level").with_builder(move |ctx, id| {
                *counter.borrow_mut() += 1;
                ctx.scenes.scene_mut(id).unwrap().add_entity(block("a", 0.0, 0.0));
                Ok(())
            }),
        );
        let before = ctx.scene(scene).unwrap().loaded().to_vec();

        assert!(ctx.scenes.restart_scene());
        frame(&mut ctx);

        assert_eq!(*builds.borrow(), 2);
        let current = ctx.scene(scene).unwrap();
        assert_eq!(current.len(), 1);
        assert_ne!(current.loaded(), before.as_slice());
    }

    #[test]
    fn test_swap_keeps_standby_entities_unloaded() {
        let builds = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&builds);
        let mut ctx = context();
        let home = activate_new(
            &mut ctx,
            Scene::new("home").with_builder(move |ctx, id| {
                *counter.borrow_mut() += 1;
                let current = ctx.scenes.scene_mut(id).unwrap();
                current.add_entity(block("kept", 0.0, 0.0));
                let mut temp = block("temp", 50.0, 50.0);
                temp.destroy_on_unload = true;
                current.add_entity(temp);
                Ok(())
            }),
        );
        let away = ctx.scenes.add_scene(Scene::new("away"));

        assert!(ctx.scenes.swap_to(away));
        frame(&mut ctx);
        assert_eq!(ctx.scenes.active_id(), Some(away));
        assert_eq!(ctx.scenes.standby_id(), Some(home));
        let standby = ctx.scene(home).unwrap();
        assert_eq!(standby.len(), 1);
        assert!(standby.loaded().is_empty());
        assert_eq!(standby.unloaded().len(), 1);
        let kept = standby.unloaded()[0];
        assert!(!standby.entity(kept).unwrap().is_loaded());
        standby.assert_consistent();

        assert!(ctx.scenes.swap_back());
        frame(&mut ctx);
        assert_eq!(ctx.scenes.active_id(), Some(home));
        assert!(ctx.scenes.standby_id().is_none());
        assert_eq!(*builds.borrow(), 1);
        let current = ctx.scene(home).unwrap();
        assert_eq!(current.loaded(), &[kept]);
        assert!(current.entity(kept).unwrap().is_loaded());
        assert!(ctx.scene(away).unwrap().is_empty());
    }

    /// Counts `on_destroy` calls
    struct Tombstone {
        base: ComponentBase,
        destroyed: Rc<RefCell<u32>>,
    }

    impl Component for Tombstone {
        fn base(&self) -> &ComponentBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ComponentBase {
            &mut self.base
        }

        fn on_destroy(&mut self, _: &mut EngineContext, _: EntityRef) -> Result<(), EngineError> {
            *self.destroyed.borrow_mut() += 1;
            Ok(())
        }
    }

    #[test]
    fn test_delete_standby_scene_destroys_retained_entities() {
        let destroyed = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&destroyed);
        let mut ctx = context();
        let home = activate_new(
            &mut ctx,
            Scene::new("home").with_builder(move |ctx, id| {
                let kept = Entity::new("kept").with_component(Tombstone {
                    base: ComponentBase::new("tombstone"),
                    destroyed: Rc::clone(&counter),
                })?;
                if let Some(current) = ctx.scenes.scene_mut(id) {
                    current.add_entity(kept);
                }
                Ok(())
            }),
        );
        let away = ctx.scenes.add_scene(Scene::new("away"));
        assert!(ctx.scenes.swap_to(away));
        frame(&mut ctx);
        assert_eq!(ctx.scenes.standby_id(), Some(home));
        assert_eq!(*destroyed.borrow(), 0);

        assert!(delete_scene(&mut ctx, away).unwrap().is_none());
        let removed = delete_scene(&mut ctx, home).unwrap().unwrap();
        assert_eq!(removed.id(), home);
        assert!(removed.is_empty());
        assert_eq!(*destroyed.borrow(), 1);
        assert!(ctx.scenes.standby_id().is_none());
        assert!(ctx.scene(home).is_none());
        assert!(!ctx.scenes.swap_back());
    }

    #[test]
    fn test_inactive_entity_is_not_updated() {
        let mut ctx = context();
        let scene = activate_new(&mut ctx, Scene::new("level"));
        let owner = ctx.scenes.scene_mut(scene).unwrap().add_entity(block("a", 0.0, 0.0));

        frame(&mut ctx);
        assert_eq!(ctx.component::<Block>(owner).unwrap().updates, 1);

        ctx.set_entity_active(owner, false).unwrap();
        frame(&mut ctx);
        assert_eq!(ctx.component::<Block>(owner).unwrap().updates, 1);
    }

    #[test]
    fn test_shutdown_empties_scenes() {
        let mut ctx = context();
        let scene = activate_new(&mut ctx, Scene::new("level"));
        ctx.scenes.scene_mut(scene).unwrap().add_entity(block("a", 0.0, 0.0));
        frame(&mut ctx);

        shutdown(&mut ctx).unwrap();
        assert!(ctx.scenes.active_id().is_none());
        assert!(ctx.scene(scene).unwrap().is_empty());
    }
}
