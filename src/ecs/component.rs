//! Component base and lifecycle hooks
//!
//! Components are boxed trait objects owned by their [`Entity`]. Every hook
//! receives the [`EngineContext`] and the [`EntityRef`] of the owner, so a
//! component can reach the delegate bus, resource managers and its own
//! entity without holding references into the scene.
//!
//! While a hook runs, the component is taken out of its slot; lookups of the
//! same component from inside its own hook return `None`.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHashMap;

use crate::core::{EngineContext, EngineError, EntityId, Object, ObjectId, SceneId};
use crate::delegate::{
    CollisionEvent, Delegate, DelegateId, OutOfBoundsEvent, RegisterId, SharedCallback,
    erase_callback,
};
use crate::renderer::Canvas;
use crate::scene::ColliderShape;

use super::Entity;

/// Key/value data used to configure a component by name
pub type DataBag = FxHashMap<String, serde_json::Value>;

/// Per-frame update installed on a component from the outside
pub type CustomUpdate = Box<dyn FnMut(&mut EngineContext, EntityRef) -> Result<(), EngineError>>;

/// Address of an entity: the scene it lives in plus its ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    /// Owning scene
    pub scene: SceneId,
    /// Entity ID
    pub entity: EntityId,
}

impl EntityRef {
    /// Create a new entity reference
    #[must_use]
    pub const fn new(scene: SceneId, entity: EntityId) -> Self {
        Self { scene, entity }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.entity, self.scene)
    }
}

/// Compile-time component discriminator
#[derive(Debug, Clone, Copy)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
}

impl ComponentType {
    /// Discriminator of a concrete component type
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_type_name(std::any::type_name::<T>()),
        }
    }

    /// Underlying type ID
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.id
    }

    /// Short type name, without the module path
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl Hash for ComponentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Upcast to [`Any`] for downcasting boxed components
pub trait AsAny: Any {
    /// Borrow as `&dyn Any`
    fn as_any(&self) -> &dyn Any;
    /// Borrow as `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A unit of behavior attached to an entity.
///
/// All hooks default to no-ops. `on_awake` runs for every component of an
/// entity before any `on_start`; `on_unload` is followed by automatic
/// teardown of the component's registers and owned delegate.
#[allow(unused_variables)]
pub trait Component: AsAny {
    /// Shared component state
    fn base(&self) -> &ComponentBase;

    /// Shared component state, mutably
    fn base_mut(&mut self) -> &mut ComponentBase;

    /// Called when the owning entity is loaded, before any `on_start`
    fn on_awake(&mut self, ctx: &mut EngineContext, owner: EntityRef) -> Result<(), EngineError> {
        Ok(())
    }

    /// Called after every component of the entity is awake
    fn on_start(&mut self, ctx: &mut EngineContext, owner: EntityRef) -> Result<(), EngineError> {
        Ok(())
    }

    /// Called once per frame while the component and its entity are active
    fn on_update(&mut self, ctx: &mut EngineContext, owner: EntityRef) -> Result<(), EngineError> {
        Ok(())
    }

    /// Draw the component
    fn on_render(&self, ctx: &EngineContext, entity: &Entity, canvas: &mut dyn Canvas) {}

    /// Called when the owning entity is enabled or disabled
    fn on_enable(
        &mut self,
        ctx: &mut EngineContext,
        owner: EntityRef,
        enabled: bool,
    ) -> Result<(), EngineError> {
        Ok(())
    }

    /// Called at scene frame-start for loaded components
    fn on_cycle_start(
        &mut self,
        ctx: &mut EngineContext,
        owner: EntityRef,
    ) -> Result<(), EngineError> {
        Ok(())
    }

    /// Called at scene frame-end for loaded components
    fn on_cycle_end(&mut self, ctx: &mut EngineContext, owner: EntityRef) -> Result<(), EngineError> {
        Ok(())
    }

    /// Called when the owning entity is unloaded
    fn on_unload(&mut self, ctx: &mut EngineContext, owner: EntityRef) -> Result<(), EngineError> {
        Ok(())
    }

    /// Called once when the owning entity is destroyed
    fn on_destroy(&mut self, ctx: &mut EngineContext, owner: EntityRef) -> Result<(), EngineError> {
        Ok(())
    }

    /// Default collision callback, wired with [`ComponentBase::listen_collisions`]
    fn on_collision(
        &mut self,
        ctx: &mut EngineContext,
        owner: EntityRef,
        event: &CollisionEvent,
    ) -> Result<(), EngineError> {
        Ok(())
    }

    /// Default out-of-bounds callback
    fn on_out_of_bounds(
        &mut self,
        ctx: &mut EngineContext,
        owner: EntityRef,
        event: &OutOfBoundsEvent,
    ) -> Result<(), EngineError> {
        Ok(())
    }

    /// Collision shape, if this component registers its entity for collisions
    fn collider(&self) -> Option<ColliderShape> {
        None
    }

    /// Apply a data bag to the component's fields
    fn unmarshal(&mut self, data: &DataBag) -> Result<(), EngineError> {
        Ok(())
    }
}

/// A subscription declared before the publisher is known.
///
/// The declaration stays on its component for the component's whole life
/// and is resolved at every start: the component of type `component` on
/// `target` (or on the declaring entity) must own a delegate by then,
/// otherwise nothing is registered until the next start.
#[derive(Clone)]
pub struct PendingRegister {
    pub(crate) target: Option<EntityId>,
    pub(crate) component: ComponentType,
    pub(crate) payload: TypeId,
    pub(crate) payload_name: &'static str,
    pub(crate) callback: SharedCallback,
}

impl fmt::Debug for PendingRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRegister")
            .field("target", &self.target)
            .field("component", &self.component.name())
            .field("payload", &self.payload_name)
            .finish()
    }
}

/// State shared by every component
pub struct ComponentBase {
    object: Object,
    owner: Option<EntityRef>,
    active: bool,
    loaded: bool,
    delegate: Option<DelegateId>,
    registers: Vec<RegisterId>,
    pending: Vec<PendingRegister>,
    custom_update: Option<CustomUpdate>,
}

impl ComponentBase {
    /// Create an active, unloaded component base
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            object: Object::new(name),
            owner: None,
            active: true,
            loaded: false,
            delegate: None,
            registers: Vec::new(),
            pending: Vec::new(),
            custom_update: None,
        }
    }

    /// Component ID
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.object.id()
    }

    /// Component name
    #[must_use]
    pub fn name(&self) -> &str {
        self.object.name()
    }

    /// Identity
    #[must_use]
    pub const fn object(&self) -> &Object {
        &self.object
    }

    /// Owning entity, known once the entity has been loaded
    #[must_use]
    pub const fn owner(&self) -> Option<EntityRef> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: EntityRef) {
        self.owner = Some(owner);
    }

    /// Whether the component takes part in updates and rendering
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enable or disable the component
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Whether `on_start` has completed
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub(crate) fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    /// Delegate owned by this component
    #[must_use]
    pub const fn delegate(&self) -> Option<DelegateId> {
        self.delegate
    }

    /// Registers owned by this component
    #[must_use]
    pub fn registers(&self) -> &[RegisterId] {
        &self.registers
    }

    /// Number of subscriptions waiting for the next start
    #[must_use]
    pub fn pending_count(&self) -> usize {
        if self.loaded { 0 } else { self.pending.len() }
    }

    /// Number of subscriptions declared with [`subscribe`](Self::subscribe)
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.pending.len()
    }

    /// Create the delegate this component publishes on, replacing any
    /// previously owned one.
    pub fn create_delegate<P: 'static>(
        &mut self,
        ctx: &mut EngineContext,
        event: &str,
    ) -> Delegate<P> {
        if let Some(old) = self.delegate.take() {
            ctx.delegates.delete(old);
        }
        let delegate = ctx.delegates.create::<P>(&self.object, event);
        self.delegate = Some(delegate.id());
        delegate
    }

    /// Subscribe to a known delegate. The register is removed when this
    /// component unloads.
    pub fn register<P, F>(
        &mut self,
        ctx: &mut EngineContext,
        delegate: Delegate<P>,
        callback: F,
    ) -> RegisterId
    where
        P: 'static,
        F: FnMut(&mut EngineContext, &P) -> Result<(), EngineError> + 'static,
    {
        let id = ctx.delegates.register(self.object.id(), delegate, callback);
        self.registers.push(id);
        id
    }

    /// Declare a subscription to the delegate owned by the component of type
    /// `T` on `target` (or on this component's entity when `None`).
    pub fn subscribe<T, P, F>(&mut self, target: Option<EntityId>, callback: F)
    where
        T: Component,
        P: 'static,
        F: FnMut(&mut EngineContext, &P) -> Result<(), EngineError> + 'static,
    {
        self.pending.push(PendingRegister {
            target,
            component: ComponentType::of::<T>(),
            payload: TypeId::of::<P>(),
            payload_name: std::any::type_name::<P>(),
            callback: SharedCallback::new(erase_callback(callback)),
        });
    }

    /// Route collisions involving the owner to `T::on_collision`.
    ///
    /// Returns `None` before the component has an owner.
    pub fn listen_collisions<T: Component>(
        &mut self,
        ctx: &mut EngineContext,
    ) -> Option<RegisterId> {
        let owner = self.owner?;
        let id = ctx.listen_collisions::<T>(self.object.id(), owner);
        self.registers.push(id);
        Some(id)
    }

    /// Install a per-frame update that runs before `on_update`
    pub fn set_custom_update<F>(&mut self, update: F)
    where
        F: FnMut(&mut EngineContext, EntityRef) -> Result<(), EngineError> + 'static,
    {
        self.custom_update = Some(Box::new(update));
    }

    pub(crate) fn track_register(&mut self, id: RegisterId) {
        self.registers.push(id);
    }

    pub(crate) fn subscriptions(&self) -> Vec<PendingRegister> {
        self.pending.clone()
    }

    pub(crate) fn take_registers(&mut self) -> Vec<RegisterId> {
        std::mem::take(&mut self.registers)
    }

    pub(crate) fn take_delegate(&mut self) -> Option<DelegateId> {
        self.delegate.take()
    }

    pub(crate) fn take_custom_update(&mut self) -> Option<CustomUpdate> {
        self.custom_update.take()
    }

    pub(crate) fn restore_custom_update(&mut self, update: CustomUpdate) {
        if self.custom_update.is_none() {
            self.custom_update = Some(update);
        }
    }
}

impl fmt::Debug for ComponentBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentBase")
            .field("object", &self.object)
            .field("owner", &self.owner)
            .field("active", &self.active)
            .field("loaded", &self.loaded)
            .field("delegate", &self.delegate)
            .field("registers", &self.registers)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}
