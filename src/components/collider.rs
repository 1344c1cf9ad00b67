//! Collider component

use crate::core::EngineError;
use crate::ecs::{Component, ComponentBase, DataBag};
use crate::scene::ColliderShape;

/// Registers its entity for the scene's collision pass
#[derive(Debug)]
pub struct Collider {
    base: ComponentBase,
    radius: Option<f64>,
}

impl Collider {
    /// Collider sized by the entity rectangle
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: ComponentBase::new("collider"),
            radius: None,
        }
    }

    /// Use an explicit radius in circle mode
    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Explicit circle radius
    #[must_use]
    pub const fn radius(&self) -> Option<f64> {
        self.radius
    }
}

impl Default for Collider {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Collider {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn collider(&self) -> Option<ColliderShape> {
        Some(ColliderShape { radius: self.radius })
    }

    fn unmarshal(&mut self, data: &DataBag) -> Result<(), EngineError> {
        if let Some(radius) = super::field(data, "radius")? {
            self.radius = Some(radius);
        }
        Ok(())
    }
}
