//! Mouse-over cursor component

use crate::core::{EngineContext, EngineError};
use crate::ecs::{Component, ComponentBase, DataBag, EntityRef};
use crate::input::CursorShape;

/// Requests a cursor shape while the mouse is over its entity
#[derive(Debug)]
pub struct Hover {
    base: ComponentBase,
    shape: CursorShape,
    hovered: bool,
}

impl Hover {
    /// Show a pointing hand on hover
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: ComponentBase::new("hover"),
            shape: CursorShape::Hand,
            hovered: false,
        }
    }

    /// Set the requested shape
    #[must_use]
    pub fn with_shape(mut self, shape: CursorShape) -> Self {
        self.shape = shape;
        self
    }

    /// Requested shape
    #[must_use]
    pub const fn shape(&self) -> CursorShape {
        self.shape
    }

    /// Whether the mouse was inside the entity on the last update
    #[must_use]
    pub const fn is_hovered(&self) -> bool {
        self.hovered
    }
}

impl Default for Hover {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Hover {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn on_update(&mut self, ctx: &mut EngineContext, owner: EntityRef) -> Result<(), EngineError> {
        let mouse = ctx.input.mouse_position();
        self.hovered = ctx.entity(owner).is_some_and(|entity| entity.is_inside(mouse));
        if self.hovered {
            ctx.cursor.request(Some(owner.entity), self.shape);
        }
        Ok(())
    }

    fn on_enable(&mut self, _ctx: &mut EngineContext, _owner: EntityRef, enabled: bool) -> Result<(), EngineError> {
        if !enabled {
            self.hovered = false;
        }
        Ok(())
    }

    fn unmarshal(&mut self, data: &DataBag) -> Result<(), EngineError> {
        if let Some(shape) = super::field(data, "shape")? {
            self.shape = shape;
        }
        Ok(())
    }
}
