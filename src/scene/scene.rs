//! Scenes
//!
//! A [`Scene`] owns its entities and keeps three disjoint projections of
//! them: `loaded`, `unloaded` and the deferred-delete queue. Loaded entities
//! are also bucketed by render layer, and those carrying a collider are
//! listed in the collider registry.
//!
//! Everything here is bookkeeping; passes that run component hooks live in
//! [`super::systems`].

use std::fmt;

use rustc_hash::FxHashMap;

use crate::core::{EngineContext, EngineError, EntityId, Object, SceneId};
use crate::ecs::{Entity, EntityRef};

use super::{CollisionMode, Layer};

/// Callback that populates a scene each time it becomes active
pub type SceneBuilder = Box<dyn FnMut(&mut EngineContext, SceneId) -> Result<(), EngineError>>;

/// A container of entities with its own load/unload cycle
pub struct Scene {
    object: Object,
    tag: String,
    collision_mode: CollisionMode,
    entities: FxHashMap<EntityId, Entity>,
    order: Vec<EntityId>,
    loaded: Vec<EntityId>,
    unloaded: Vec<EntityId>,
    to_delete: Vec<EntityId>,
    layers: [Vec<EntityId>; Layer::COUNT],
    colliders: Vec<EntityId>,
    builder: Option<SceneBuilder>,
}

impl Scene {
    /// Create an empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            object: Object::new(name),
            tag: String::new(),
            collision_mode: CollisionMode::None,
            entities: FxHashMap::default(),
            order: Vec::new(),
            loaded: Vec::new(),
            unloaded: Vec::new(),
            to_delete: Vec::new(),
            layers: Default::default(),
            colliders: Vec::new(),
            builder: None,
        }
    }

    /// Set the build callback
    #[must_use]
    pub fn with_builder<F>(mut self, builder: F) -> Self
    where
        F: FnMut(&mut EngineContext, SceneId) -> Result<(), EngineError> + 'static,
    {
        self.builder = Some(Box::new(builder));
        self
    }

    /// Set the collision mode
    #[must_use]
    pub fn with_collision_mode(mut self, mode: CollisionMode) -> Self {
        self.collision_mode = mode;
        self
    }

    /// Set the tag
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Scene ID
    #[must_use]
    pub const fn id(&self) -> SceneId {
        self.object.id()
    }

    /// Scene name
    #[must_use]
    pub fn name(&self) -> &str {
        self.object.name()
    }

    /// Identity
    #[must_use]
    pub const fn object(&self) -> &Object {
        &self.object
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

    /// Collision mode
    #[must_use]
    pub const fn collision_mode(&self) -> CollisionMode {
        self.collision_mode
    }

    /// Change the collision mode
    pub fn set_collision_mode(&mut self, mode: CollisionMode) {
        self.collision_mode = mode;
    }

    /// Add an entity. It is loaded at the next frame-start if active.
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityRef {
        let id = entity.id();
        entity.set_scene(Some(self.id()));
        log::trace!("entity added: scene={} entity={}", self.object, entity.object());
        self.entities.insert(id, entity);
        self.order.push(id);
        self.unloaded.push(id);
        EntityRef::new(self.id(), id)
    }

    /// Add an entity as a child of another entity of this scene.
    /// If the parent is unknown the child is added unlinked.
    pub fn add_child(&mut self, parent: EntityId, mut child: Entity) -> EntityRef {
        let known = self.entities.contains_key(&parent);
        if known {
            child.set_parent(Some(parent));
        }
        let child_id = child.id();
        let added = self.add_entity(child);
        if let Some(parent) = self.entities.get_mut(&parent) {
            parent.add_child(child_id);
        }
        added
    }

    /// Get an entity by ID. Entities queued for deletion are still returned
    /// until the after-update pass removes them.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get an entity by ID, mutably
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// First entity with this name, in insertion order
    #[must_use]
    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities().find(|e| e.name() == name)
    }

    /// All entities in insertion order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    /// Entities with a tag, in insertion order
    pub fn entities_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities().filter(move |e| e.tag() == tag)
    }

    /// Children of an entity, in link order
    pub fn children(&self, parent: EntityId) -> impl Iterator<Item = &Entity> {
        self.entities
            .get(&parent)
            .map(Entity::children)
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.entities.get(id))
    }

    /// Child of an entity by name
    #[must_use]
    pub fn child_by_name(&self, parent: EntityId, name: &str) -> Option<&Entity> {
        self.children(parent).find(|e| e.name() == name)
    }

    /// Unlink a child from its parent. The child stays in the scene.
    pub fn unlink_child(&mut self, parent: EntityId, child: EntityId) -> bool {
        let removed = self
            .entities
            .get_mut(&parent)
            .is_some_and(|p| p.delete_child(child));
        if removed {
            if let Some(child) = self.entities.get_mut(&child) {
                child.set_parent(None);
            }
        }
        removed
    }

    /// Number of entities, including those queued for deletion
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the scene has no entities
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Loaded entities in load order
    #[must_use]
    pub fn loaded(&self) -> &[EntityId] {
        &self.loaded
    }

    /// Entities waiting to be loaded
    #[must_use]
    pub fn unloaded(&self) -> &[EntityId] {
        &self.unloaded
    }

    /// Entities queued for deletion
    #[must_use]
    pub fn pending_deletes(&self) -> &[EntityId] {
        &self.to_delete
    }

    /// Whether an entity is queued for deletion
    #[must_use]
    pub fn is_pending_delete(&self, id: EntityId) -> bool {
        self.to_delete.contains(&id)
    }

    /// Loaded entities of a layer, in render order
    #[must_use]
    pub fn layer(&self, layer: Layer) -> &[EntityId] {
        &self.layers[layer.index()]
    }

    /// Entities registered for collision tests
    #[must_use]
    pub fn colliders(&self) -> &[EntityId] {
        &self.colliders
    }

    /// Move an entity to another layer, keeping the buckets in step
    pub fn set_layer(&mut self, id: EntityId, layer: Layer) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        let old = entity.layer();
        entity.set_layer(layer);
        if old != layer && self.loaded.contains(&id) {
            self.layers[old.index()].retain(|&e| e != id);
            self.layers[layer.index()].push(id);
        }
        true
    }

    /// Queue an entity for deletion.
    ///
    /// The entity leaves every projection except the delete queue right
    /// away, so it is neither updated, rendered nor collided again, but it
    /// stays reachable by ID until after-update. Returns false if the entity
    /// is unknown or already queued.
    pub fn mark_delete(&mut self, id: EntityId) -> bool {
        if !self.entities.contains_key(&id) || self.to_delete.contains(&id) {
            return false;
        }
        self.detach(id);
        self.to_delete.push(id);
        true
    }

    /// Move an unloaded entity to the loaded projection, bucket it by layer
    /// and register its collider
    pub(crate) fn mark_loaded(&mut self, id: EntityId) {
        if self.to_delete.contains(&id) {
            return;
        }
        let Some(entity) = self.entities.get(&id) else {
            return;
        };
        let layer = entity.layer();
        let collides = entity
            .components()
            .iter()
            .any(|slot| slot.get().is_some_and(|c| c.base().is_active() && c.collider().is_some()));

        self.unloaded.retain(|&e| e != id);
        if !self.loaded.contains(&id) {
            self.loaded.push(id);
            self.layers[layer.index()].push(id);
            if collides {
                self.colliders.push(id);
            }
        }
    }

    /// Re-evaluate whether a loaded entity belongs in the collider registry
    pub(crate) fn refresh_collider(&mut self, id: EntityId) {
        let collides = self.entities.get(&id).is_some_and(|entity| {
            entity
                .components()
                .iter()
                .any(|slot| slot.get().is_some_and(|c| c.base().is_active() && c.collider().is_some()))
        });
        let registered = self.colliders.contains(&id);
        if collides && !registered && self.loaded.contains(&id) {
            self.colliders.push(id);
        } else if !collides && registered {
            self.colliders.retain(|&e| e != id);
        }
    }

    /// Move a loaded entity back to the unloaded projection
    pub(crate) fn mark_unloaded(&mut self, id: EntityId) {
        if self.to_delete.contains(&id) || !self.entities.contains_key(&id) {
            return;
        }
        self.detach(id);
        self.unloaded.push(id);
    }

    /// Remove an entity from every projection (delete queue excluded)
    fn detach(&mut self, id: EntityId) {
        self.loaded.retain(|&e| e != id);
        self.unloaded.retain(|&e| e != id);
        for bucket in &mut self.layers {
            bucket.retain(|&e| e != id);
        }
        self.colliders.retain(|&e| e != id);
    }

    /// Drain the deferred-delete queue
    pub(crate) fn take_deletes(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.to_delete)
    }

    /// Remove an entity for good, unlinking it from its parent and children
    pub(crate) fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        self.detach(id);
        self.to_delete.retain(|&e| e != id);
        self.order.retain(|&e| e != id);
        let mut entity = self.entities.remove(&id)?;

        if let Some(parent) = entity.parent() {
            if let Some(parent) = self.entities.get_mut(&parent) {
                parent.delete_child(id);
            }
        }
        for &child in entity.children() {
            if let Some(child) = self.entities.get_mut(&child) {
                child.set_parent(None);
            }
        }
        entity.set_scene(None);
        Some(entity)
    }

    /// Remove every entity and empty all projections
    pub(crate) fn clear(&mut self) {
        self.entities.clear();
        self.order.clear();
        self.loaded.clear();
        self.unloaded.clear();
        self.to_delete.clear();
        for bucket in &mut self.layers {
            bucket.clear();
        }
        self.colliders.clear();
    }

    pub(crate) fn take_builder(&mut self) -> Option<SceneBuilder> {
        self.builder.take()
    }

    pub(crate) fn restore_builder(&mut self, builder: SceneBuilder) {
        if self.builder.is_none() {
            self.builder = Some(builder);
        }
    }

    /// Check the projection, layer and collider invariants
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        use std::collections::HashSet;

        let loaded: HashSet<_> = self.loaded.iter().copied().collect();
        let unloaded: HashSet<_> = self.unloaded.iter().copied().collect();
        let deleted: HashSet<_> = self.to_delete.iter().copied().collect();
        assert!(loaded.is_disjoint(&unloaded), "loaded/unloaded overlap");
        assert!(loaded.is_disjoint(&deleted), "loaded/to-delete overlap");
        assert!(unloaded.is_disjoint(&deleted), "unloaded/to-delete overlap");
        assert_eq!(
            loaded.len() + unloaded.len() + deleted.len(),
            self.entities.len(),
            "projections do not cover the entity map"
        );

        for layer in Layer::ALL {
            for id in &self.layers[layer.index()] {
                assert!(loaded.contains(id), "{id} bucketed but not loaded");
                assert_eq!(self.entities[id].layer(), layer, "{id} in wrong bucket");
            }
        }
        let bucketed: usize = self.layers.iter().map(Vec::len).sum();
        assert_eq!(bucketed, loaded.len(), "layer buckets out of step");

        for id in &self.colliders {
            assert!(loaded.contains(id), "{id} registered as collider but not loaded");
        }
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("object", &self.object)
            .field("tag", &self.tag)
            .field("collision_mode", &self.collision_mode)
            .field("entities", &self.entities.len())
            .field("loaded", &self.loaded.len())
            .field("unloaded", &self.unloaded.len())
            .field("to_delete", &self.to_delete.len())
            .field("colliders", &self.colliders.len())
            .finish_non_exhaustive()
    }
}
