//! Entities
//!
//! An [`Entity`] is a scene-scoped bag of components with a transform,
//! render layer, tag and scratch cache. Components are stored in slots in
//! insertion order, at most one per concrete type; slot indices never change.

use std::any::{Any, TypeId};
use std::fmt;

use rustc_hash::FxHashMap;

use crate::core::{EngineError, EntityId, Object, SceneId};
use crate::math::{Transform, Vector};
use crate::scene::Layer;

use super::{Children, Component, ComponentType};

/// A component and its type. The component is absent while one of its
/// hooks is running.
pub struct ComponentSlot {
    kind: ComponentType,
    component: Option<Box<dyn Component>>,
}

impl ComponentSlot {
    /// Component type of the slot
    #[must_use]
    pub const fn kind(&self) -> ComponentType {
        self.kind
    }

    /// The component, unless it is currently taken out
    #[must_use]
    pub fn get(&self) -> Option<&dyn Component> {
        self.component.as_deref()
    }

    /// The component, mutably
    pub fn get_mut(&mut self) -> Option<&mut (dyn Component + 'static)> {
        self.component.as_deref_mut()
    }
}

impl fmt::Debug for ComponentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentSlot")
            .field("kind", &self.kind.name())
            .field("present", &self.component.is_some())
            .finish()
    }
}

/// A composite of components placed in a scene
pub struct Entity {
    object: Object,
    components: Vec<ComponentSlot>,
    index: FxHashMap<TypeId, usize>,
    children: Children,
    parent: Option<EntityId>,
    scene: Option<SceneId>,
    transform: Transform,
    layer: Layer,
    tag: String,
    active: bool,
    loaded: bool,
    cache: FxHashMap<String, Box<dyn Any>>,
    /// Destroyed by its bounds component when it leaves the field
    pub die_on_out_of_bounds: bool,
    /// Destroyed right after a collision involving it is published
    pub die_on_collision: bool,
    /// Destroyed instead of kept when its scene is swapped out
    pub destroy_on_unload: bool,
}

impl Entity {
    /// Create an active, unloaded entity with no components
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            object: Object::new(name),
            components: Vec::new(),
            index: FxHashMap::default(),
            children: Children::new(),
            parent: None,
            scene: None,
            transform: Transform::default(),
            layer: Layer::default(),
            tag: String::new(),
            active: true,
            loaded: false,
            cache: FxHashMap::default(),
            die_on_out_of_bounds: false,
            die_on_collision: false,
            destroy_on_unload: false,
        }
    }

    /// Set the tag
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Set the render layer
    #[must_use]
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    /// Set the position
    #[must_use]
    pub fn with_position(mut self, position: Vector) -> Self {
        self.transform.position = position;
        self
    }

    /// Set the intrinsic size
    #[must_use]
    pub fn with_dim(mut self, dim: Vector) -> Self {
        self.transform.dim = dim;
        self
    }

    /// Add a component, builder style
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateComponent`] if a component of the same
    /// type is already attached
    pub fn with_component<T: Component>(mut self, component: T) -> Result<Self, EngineError> {
        self.add_component(component)?;
        Ok(self)
    }

    /// Entity ID
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.object.id()
    }

    /// Entity name
    #[must_use]
    pub fn name(&self) -> &str {
        self.object.name()
    }

    /// Rename the entity
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.object.set_name(name);
    }

    /// Identity
    #[must_use]
    pub const fn object(&self) -> &Object {
        &self.object
    }

    /// Attach a component. Returns its slot index.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateComponent`] if a component of the same
    /// type is already attached
    pub fn add_component<T: Component>(&mut self, component: T) -> Result<usize, EngineError> {
        self.add_boxed(ComponentType::of::<T>(), Box::new(component))
    }

    /// Attach an already boxed component of the given type
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateComponent`] if a component of the same
    /// type is already attached
    pub fn add_boxed(
        &mut self,
        kind: ComponentType,
        component: Box<dyn Component>,
    ) -> Result<usize, EngineError> {
        if self.index.contains_key(&kind.type_id()) {
            log::error!(
                "duplicate component: entity={} component={}",
                self.object,
                kind.name()
            );
            return Err(EngineError::DuplicateComponent {
                entity: self.object.to_string(),
                component: kind.name(),
            });
        }
        let index = self.components.len();
        self.components.push(ComponentSlot {
            kind,
            component: Some(component),
        });
        self.index.insert(kind.type_id(), index);
        Ok(index)
    }

    /// Get a component by type
    #[must_use]
    pub fn get_component<T: Component>(&self) -> Option<&T> {
        let index = self.component_index(ComponentType::of::<T>())?;
        self.components[index]
            .get()
            .and_then(|c| c.as_any().downcast_ref::<T>())
    }

    /// Get a component by type, mutably
    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        let index = self.component_index(ComponentType::of::<T>())?;
        self.components[index]
            .get_mut()
            .and_then(|c| c.as_any_mut().downcast_mut::<T>())
    }

    /// Whether a component of this type is attached
    #[must_use]
    pub fn has_component<T: Component>(&self) -> bool {
        self.index.contains_key(&TypeId::of::<T>())
    }

    /// Slot index of a component type
    #[must_use]
    pub fn component_index(&self, kind: ComponentType) -> Option<usize> {
        self.index.get(&kind.type_id()).copied()
    }

    /// Component slots in insertion order
    #[must_use]
    pub fn components(&self) -> &[ComponentSlot] {
        &self.components
    }

    /// Number of attached components
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub(crate) fn take_component(&mut self, index: usize) -> Option<Box<dyn Component>> {
        self.components.get_mut(index).and_then(|s| s.component.take())
    }

    pub(crate) fn restore_component(&mut self, index: usize, component: Box<dyn Component>) {
        if let Some(slot) = self.components.get_mut(index) {
            slot.component = Some(component);
        }
    }

    /// Link a child by ID
    pub fn add_child(&mut self, child: EntityId) -> bool {
        self.children.add(child)
    }

    /// Unlink a child by ID. The child stays in its scene.
    pub fn delete_child(&mut self, child: EntityId) -> bool {
        self.children.remove(child)
    }

    /// Child IDs in insertion order
    #[must_use]
    pub fn children(&self) -> &[EntityId] {
        self.children.as_slice()
    }

    /// Parent entity
    #[must_use]
    pub const fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Set or clear the parent link
    pub fn set_parent(&mut self, parent: Option<EntityId>) {
        self.parent = parent;
    }

    /// Scene the entity was added to
    #[must_use]
    pub const fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    pub(crate) fn set_scene(&mut self, scene: Option<SceneId>) {
        self.scene = scene;
    }

    /// Tag
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Set the tag
    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    /// Render layer
    #[must_use]
    pub const fn layer(&self) -> Layer {
        self.layer
    }

    /// Set the render layer field only. Scenes keep their layer buckets in
    /// step through [`crate::scene::Scene::set_layer`].
    pub(crate) fn set_layer(&mut self, layer: Layer) {
        self.layer = layer;
    }

    /// Whether the entity takes part in load, update and render
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Set the active flag without running `on_enable` hooks
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Whether the entity is loaded in its scene
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub(crate) fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    /// Transform
    #[must_use]
    pub const fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Transform, mutably
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Whether a point lies inside the entity's world rectangle
    #[must_use]
    pub fn is_inside(&self, point: Vector) -> bool {
        self.transform.rect().contains(point)
    }

    /// Read a cached value
    #[must_use]
    pub fn cache_get<T: Any>(&self, key: &str) -> Option<&T> {
        self.cache.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Read a cached value, mutably
    pub fn cache_get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.cache.get_mut(key).and_then(|v| v.downcast_mut::<T>())
    }

    /// Store a value in the cache, replacing any previous value
    pub fn cache_set<T: Any>(&mut self, key: impl Into<String>, value: T) {
        self.cache.insert(key.into(), Box::new(value));
    }

    /// Remove a cached value
    pub fn cache_remove(&mut self, key: &str) -> bool {
        self.cache.remove(key).is_some()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("object", &self.object)
            .field("components", &self.components)
            .field("children", &self.children)
            .field("parent", &self.parent)
            .field("scene", &self.scene)
            .field("layer", &self.layer)
            .field("tag", &self.tag)
            .field("active", &self.active)
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}
