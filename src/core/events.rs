//! Event pools
//!
//! An [`EventPool`] is a named FIFO of [`Event`]s. The [`EventManager`] owns
//! any number of pools, addressed by ID or name, and is used for deferred
//! signaling between systems: producers add events during a frame, consumers
//! pop them at a well-defined point later.
//!
//! Pools are non-blocking and unbounded.
//!
//! # Example
//!
//! ```ignore
//! let pool = ctx.events.create_pool("score")?;
//! ctx.events.add(pool, Event::new("scored", Box::new(10_u32)));
//!
//! while let Some(event) = ctx.events.pop(pool) {
//!     if let Some(points) = event.downcast_ref::<u32>() {
//!         total += points;
//!     }
//! }
//! ```

use std::any::Any;
use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use super::error::EngineError;
use super::object::{Object, ObjectId};

/// Type-erased event payload
pub type AnyPayload = Box<dyn Any>;

/// A named data envelope
#[derive(Debug)]
pub struct Event<T = AnyPayload> {
    object: Object,
    payload: T,
}

impl<T> Event<T> {
    /// Create a new event
    pub fn new(name: impl Into<String>, payload: T) -> Self {
        Self {
            object: Object::new(name),
            payload,
        }
    }

    /// Event ID
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.object.id()
    }

    /// Event name
    #[must_use]
    pub fn name(&self) -> &str {
        self.object.name()
    }

    /// Borrow the payload
    #[must_use]
    pub const fn payload(&self) -> &T {
        &self.payload
    }

    /// Take the payload
    #[must_use]
    pub fn into_payload(self) -> T {
        self.payload
    }
}

impl Event<AnyPayload> {
    /// Borrow the payload as a concrete type
    #[must_use]
    pub fn downcast_ref<P: Any>(&self) -> Option<&P> {
        self.payload.downcast_ref::<P>()
    }
}

/// Named FIFO queue of events
#[derive(Debug)]
pub struct EventPool<T = AnyPayload> {
    object: Object,
    queue: VecDeque<Event<T>>,
}

impl<T> EventPool<T> {
    /// Create an empty pool
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            object: Object::new(name),
            queue: VecDeque::new(),
        }
    }

    /// Pool ID
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.object.id()
    }

    /// Pool name
    #[must_use]
    pub fn name(&self) -> &str {
        self.object.name()
    }

    /// Append an event at the back
    pub fn add(&mut self, event: Event<T>) {
        self.queue.push_back(event);
    }

    /// Peek at the oldest event
    #[must_use]
    pub fn next(&self) -> Option<&Event<T>> {
        self.queue.front()
    }

    /// Remove and return the oldest event
    pub fn pop(&mut self) -> Option<Event<T>> {
        self.queue.pop_front()
    }

    /// Drop every queued event, returning how many were dropped
    pub fn flush(&mut self) -> usize {
        let count = self.queue.len();
        self.queue.clear();
        count
    }

    /// Number of queued events
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the pool is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Owns all named event pools
#[derive(Debug)]
pub struct EventManager {
    object: Object,
    pools: FxHashMap<ObjectId, EventPool>,
    names: FxHashMap<String, ObjectId>,
}

impl EventManager {
    /// Create an empty manager
    #[must_use]
    pub fn new() -> Self {
        Self {
            object: Object::new("event-manager"),
            pools: FxHashMap::default(),
            names: FxHashMap::default(),
        }
    }

    /// Called once by the engine after construction
    pub fn on_start(&mut self) {
        log::debug!("{} started", self.object);
    }

    /// Create a named pool
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PoolExists`] if the name is taken
    pub fn create_pool(&mut self, name: &str) -> Result<ObjectId, EngineError> {
        if self.names.contains_key(name) {
            return Err(EngineError::PoolExists(name.to_string()));
        }
        let pool = EventPool::new(name);
        let id = pool.id();
        self.names.insert(name.to_string(), id);
        self.pools.insert(id, pool);
        Ok(id)
    }

    /// Delete a pool and its queued events
    pub fn delete_pool(&mut self, id: ObjectId) -> bool {
        match self.pools.remove(&id) {
            Some(pool) => {
                self.names.remove(pool.name());
                true
            }
            None => false,
        }
    }

    /// Look up a pool by ID
    #[must_use]
    pub fn pool(&self, id: ObjectId) -> Option<&EventPool> {
        self.pools.get(&id)
    }

    /// Look up a pool by ID, mutably
    pub fn pool_mut(&mut self, id: ObjectId) -> Option<&mut EventPool> {
        self.pools.get_mut(&id)
    }

    /// Look up a pool ID by name
    #[must_use]
    pub fn pool_id(&self, name: &str) -> Option<ObjectId> {
        self.names.get(name).copied()
    }

    /// Add an event to a pool. Returns false if the pool does not exist.
    pub fn add(&mut self, pool: ObjectId, event: Event) -> bool {
        self.pools.get_mut(&pool).map(|p| p.add(event)).is_some()
    }

    /// Peek at the oldest event of a pool
    #[must_use]
    pub fn next(&self, pool: ObjectId) -> Option<&Event> {
        self.pools.get(&pool).and_then(EventPool::next)
    }

    /// Pop the oldest event of a pool
    pub fn pop(&mut self, pool: ObjectId) -> Option<Event> {
        self.pools.get_mut(&pool).and_then(EventPool::pop)
    }

    /// Drop all events of a pool
    pub fn flush(&mut self, pool: ObjectId) -> usize {
        self.pools.get_mut(&pool).map_or(0, EventPool::flush)
    }

    /// Number of pools
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Whether there are no pools
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Remove every pool
    pub fn clear(&mut self) {
        self.pools.clear();
        self.names.clear();
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}
