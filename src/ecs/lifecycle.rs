//! Entity lifecycle passes
//!
//! Each pass walks an entity's component slots in insertion order and runs
//! one hook per component. A component is taken out of its slot while its
//! hook runs, so the hook can borrow the whole [`EngineContext`] mutably;
//! it is put back afterwards unless its entity disappeared meanwhile.

use crate::core::{EngineContext, EngineError};
use crate::delegate::PendingTarget;

use super::{Component, ComponentType, EntityRef, PendingRegister};

/// Run `f` on the component in slot `index` of `owner`.
///
/// Returns `None` if the entity, the slot or the component (already taken
/// by a hook higher up the stack) is missing.
pub fn with_component<R>(
    ctx: &mut EngineContext,
    owner: EntityRef,
    index: usize,
    f: impl FnOnce(&mut dyn Component, &mut EngineContext) -> R,
) -> Option<R> {
    let mut component = ctx.entity_mut(owner)?.take_component(index)?;
    let result = f(component.as_mut(), ctx);
    match ctx.entity_mut(owner) {
        Some(entity) => entity.restore_component(index, component),
        None => log::trace!(
            "component dropped with its entity: entity={owner} component={}",
            component.base().object()
        ),
    }
    Some(result)
}

/// Run `f` on the component of type `T` of `owner`
pub fn with_component_of<T, R>(
    ctx: &mut EngineContext,
    owner: EntityRef,
    f: impl FnOnce(&mut T, &mut EngineContext) -> R,
) -> Option<R>
where
    T: Component,
{
    let index = ctx
        .entity(owner)?
        .component_index(ComponentType::of::<T>())?;
    with_component(ctx, owner, index, |component, ctx| {
        component
            .as_any_mut()
            .downcast_mut::<T>()
            .map(|component| f(component, ctx))
    })
    .flatten()
}

fn run_hook(
    ctx: &mut EngineContext,
    owner: EntityRef,
    index: usize,
    hook: impl FnOnce(&mut dyn Component, &mut EngineContext) -> Result<(), EngineError>,
) -> Result<(), EngineError> {
    with_component(ctx, owner, index, hook).unwrap_or(Ok(()))
}

fn component_count(ctx: &EngineContext, owner: EntityRef) -> usize {
    ctx.entity(owner).map_or(0, super::Entity::component_count)
}

/// Slots holding a component that has not started yet
fn unloaded_slots(ctx: &EngineContext, owner: EntityRef) -> Vec<usize> {
    ctx.entity(owner).map_or_else(Vec::new, |entity| {
        entity
            .components()
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.get().is_some_and(|c| !c.base().is_loaded()))
            .map(|(index, _)| index)
            .collect()
    })
}

/// Whether an entity carries components attached after it was loaded
#[must_use]
pub fn has_unloaded_components(ctx: &EngineContext, owner: EntityRef) -> bool {
    !unloaded_slots(ctx, owner).is_empty()
}

/// Load an entity: every component not yet started is awoken, then started
/// and its pending subscriptions resolved.
///
/// Components attached after the entity was loaded are picked up by
/// calling this again.
///
/// # Errors
///
/// Returns the first hook error; components after it stay unloaded
pub fn load_entity(ctx: &mut EngineContext, owner: EntityRef) -> Result<(), EngineError> {
    let slots = unloaded_slots(ctx, owner);

    for &index in &slots {
        run_hook(ctx, owner, index, |component, ctx| {
            component.base_mut().set_owner(owner);
            component.on_awake(ctx, owner)
        })?;
    }

    for &index in &slots {
        run_hook(ctx, owner, index, |component, ctx| {
            component.on_start(ctx, owner)?;
            for declaration in component.base().subscriptions() {
                if let Some(register) = resolve_pending(ctx, owner, component, declaration)? {
                    component.base_mut().track_register(register);
                }
            }
            component.base_mut().set_loaded(true);
            Ok(())
        })?;
    }

    if let Some(entity) = ctx.entity_mut(owner) {
        entity.set_loaded(true);
        log::trace!("entity loaded: entity={} components={}", entity.object(), slots.len());
    }
    Ok(())
}

/// Bind a declared subscription to the delegate owned by its target
/// component. Unresolvable declarations are logged and skipped until the
/// next start.
fn resolve_pending(
    ctx: &mut EngineContext,
    owner: EntityRef,
    subscriber: &dyn Component,
    declaration: PendingRegister,
) -> Result<Option<crate::delegate::RegisterId>, EngineError> {
    let target = EntityRef::new(owner.scene, declaration.target.unwrap_or(owner.entity));
    let delegate = ctx.entity(target).and_then(|entity| {
        let index = entity.component_index(declaration.component)?;
        entity.components()[index].get()?.base().delegate()
    });

    let Some(delegate) = delegate else {
        log::warn!(
            "pending register unresolved: component={} entity={owner} target={target} type={}",
            subscriber.base().object(),
            declaration.component.name()
        );
        return Ok(None);
    };

    let register = ctx.delegates.register_erased(
        subscriber.base().id(),
        PendingTarget {
            entity: declaration.target,
            component: declaration.component,
        },
        declaration.payload,
        declaration.payload_name,
        Box::new(declaration.callback),
    );
    match ctx.delegates.resolve(register, delegate) {
        Ok(true) => Ok(Some(register)),
        Ok(false) => {
            ctx.delegates.deregister(register);
            Ok(None)
        }
        Err(err) => {
            log::warn!(
                "pending register rejected: component={} entity={owner}: {err}",
                subscriber.base().object()
            );
            ctx.delegates.deregister(register);
            Ok(None)
        }
    }
}

/// Remove every register of a component and delete its owned delegate
fn teardown(ctx: &mut EngineContext, component: &mut dyn Component) {
    let base = component.base_mut();
    for register in base.take_registers() {
        ctx.delegates.deregister(register);
    }
    if let Some(delegate) = base.take_delegate() {
        ctx.delegates.delete(delegate);
    }
    base.set_loaded(false);
}

/// Unload an entity: `on_unload` runs on every loaded component, then its
/// registers and owned delegate are removed from the bus.
///
/// # Errors
///
/// Returns the first `on_unload` error, after every component has been
/// torn down
pub fn unload_entity(ctx: &mut EngineContext, owner: EntityRef) -> Result<(), EngineError> {
    let mut first_error = None;
    for index in 0..component_count(ctx, owner) {
        let result = run_hook(ctx, owner, index, |component, ctx| {
            if !component.base().is_loaded() {
                return Ok(());
            }
            let result = component.on_unload(ctx, owner);
            teardown(ctx, component);
            result
        });
        if let Err(err) = result {
            first_error.get_or_insert(err);
        }
    }

    if let Some(entity) = ctx.entity_mut(owner) {
        entity.set_loaded(false);
        log::trace!("entity unloaded: entity={}", entity.object());
    }
    first_error.map_or(Ok(()), Err)
}

/// Final pass before an entity is dropped: unload if needed, then
/// `on_destroy` on every component
///
/// # Errors
///
/// Returns the first hook error
pub fn destroy_entity(ctx: &mut EngineContext, owner: EntityRef) -> Result<(), EngineError> {
    let loaded = ctx.entity(owner).is_some_and(super::Entity::is_loaded);
    let unloaded = if loaded { unload_entity(ctx, owner) } else { Ok(()) };

    for index in 0..component_count(ctx, owner) {
        run_hook(ctx, owner, index, |component, ctx| component.on_destroy(ctx, owner))?;
    }
    log::trace!("entity destroyed: entity={owner}");
    unloaded
}

/// Per-frame update: the custom update of each active component, then its
/// `on_update`
///
/// # Errors
///
/// Returns the first hook error
pub fn update_entity(ctx: &mut EngineContext, owner: EntityRef) -> Result<(), EngineError> {
    for index in 0..component_count(ctx, owner) {
        run_hook(ctx, owner, index, |component, ctx| {
            if !component.base().is_active() || !component.base().is_loaded() {
                return Ok(());
            }
            if let Some(mut update) = component.base_mut().take_custom_update() {
                let result = update(ctx, owner);
                component.base_mut().restore_custom_update(update);
                result?;
            }
            component.on_update(ctx, owner)
        })?;
    }
    Ok(())
}

/// Run `on_cycle_start` on active loaded components
///
/// # Errors
///
/// Returns the first hook error
pub fn cycle_start(ctx: &mut EngineContext, owner: EntityRef) -> Result<(), EngineError> {
    for index in 0..component_count(ctx, owner) {
        run_hook(ctx, owner, index, |component, ctx| {
            if component.base().is_active() && component.base().is_loaded() {
                component.on_cycle_start(ctx, owner)
            } else {
                Ok(())
            }
        })?;
    }
    Ok(())
}

/// Run `on_cycle_end` on active loaded components
///
/// # Errors
///
/// Returns the first hook error
pub fn cycle_end(ctx: &mut EngineContext, owner: EntityRef) -> Result<(), EngineError> {
    for index in 0..component_count(ctx, owner) {
        run_hook(ctx, owner, index, |component, ctx| {
            if component.base().is_active() && component.base().is_loaded() {
                component.on_cycle_end(ctx, owner)
            } else {
                Ok(())
            }
        })?;
    }
    Ok(())
}

/// Run `on_enable` on loaded components
///
/// # Errors
///
/// Returns the first hook error
pub fn enable_entity(ctx: &mut EngineContext, owner: EntityRef, enabled: bool) -> Result<(), EngineError> {
    for index in 0..component_count(ctx, owner) {
        run_hook(ctx, owner, index, |component, ctx| {
            if component.base().is_loaded() {
                component.on_enable(ctx, owner, enabled)
            } else {
                Ok(())
            }
        })?;
    }
    Ok(())
}
