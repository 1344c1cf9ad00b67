//! Object identity
//!
//! Every addressable engine thing (entity, component, scene, delegate,
//! register, resource, event) carries an [`Object`]: a globally unique,
//! monotonically allocated ID plus a mutable display name.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Global counter for generating unique object IDs
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of an engine object.
///
/// IDs are never reused during a process run and compare in allocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocate the next unique ID
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj-{}", self.0)
    }
}

/// ID of an entity
pub type EntityId = ObjectId;

/// ID of a scene
pub type SceneId = ObjectId;

/// Identity shared by all engine things. Equality is by ID only.
#[derive(Debug, Clone)]
pub struct Object {
    id: ObjectId,
    name: String,
}

impl Object {
    /// Create a named object with a freshly allocated ID
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ObjectId::next(),
            name: name.into(),
        }
    }

    /// Get the object ID
    #[must_use]
    #[inline]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// Get the display name
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the object
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.id)
    }
}
