//! Parent/child links between entities
//!
//! Links are by ID only. A parent never owns its children: the scene does,
//! so unlinking a child leaves it alive in its scene.

use smallvec::SmallVec;

use crate::core::EntityId;

/// Ordered list of child entity IDs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children(SmallVec<[EntityId; 8]>);

impl Children {
    /// Create an empty children list
    #[must_use]
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Append a child, ignoring duplicates. Returns true if it was added.
    pub fn add(&mut self, child: EntityId) -> bool {
        if self.0.contains(&child) {
            return false;
        }
        self.0.push(child);
        true
    }

    /// Remove a child, keeping the order of the others
    pub fn remove(&mut self, child: EntityId) -> bool {
        if let Some(pos) = self.0.iter().position(|&e| e == child) {
            self.0.remove(pos);
            true
        } else {
            false
        }
    }

    /// Whether the entity is a child
    #[must_use]
    pub fn contains(&self, child: EntityId) -> bool {
        self.0.contains(&child)
    }

    /// Check if there are no children
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of children
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Children in insertion order
    #[must_use]
    pub fn as_slice(&self) -> &[EntityId] {
        &self.0
    }

    /// Iterate over children
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.0.iter().copied()
    }
}
