//! Box drawing component

use crate::core::{EngineContext, EngineError};
use crate::ecs::{Component, ComponentBase, DataBag, Entity};
use crate::renderer::{Canvas, Color};

/// Draws its entity's rectangle, filled or outlined
#[derive(Debug)]
pub struct Shape {
    base: ComponentBase,
    color: Color,
    filled: bool,
}

impl Shape {
    /// A filled white box
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: ComponentBase::new("shape"),
            color: Color::WHITE,
            filled: true,
        }
    }

    /// Set the draw color
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Draw the outline only
    #[must_use]
    pub fn outlined(mut self) -> Self {
        self.filled = false;
        self
    }

    /// Draw color
    #[must_use]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Change the draw color
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

impl Default for Shape {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Shape {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn on_render(&self, _ctx: &EngineContext, entity: &Entity, canvas: &mut dyn Canvas) {
        canvas.set_draw_color(self.color);
        let rect = entity.transform().rect();
        if self.filled {
            canvas.fill_rect(rect);
        } else {
            canvas.stroke_rect(rect);
        }
    }

    fn unmarshal(&mut self, data: &DataBag) -> Result<(), EngineError> {
        if let Some(color) = super::field(data, "color")? {
            self.color = color;
        }
        if let Some(filled) = super::field(data, "filled")? {
            self.filled = filled;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector;
    use crate::renderer::SoftwareCanvas;

    #[test]
    fn test_outline_leaves_center_clear() {
        let ctx = EngineContext::new(20, 20);
        let entity = Entity::new("frame")
            .with_position(Vector::new(2.0, 2.0))
            .with_dim(Vector::new(10.0, 10.0));
        let mut canvas = SoftwareCanvas::new(20, 20);

        Shape::new().with_color(Color::RED).outlined().on_render(&ctx, &entity, &mut canvas);
        assert_eq!(canvas.pixel(2, 2), Some(Color::RED));
        assert_eq!(canvas.pixel(6, 6), Some(Color::BLACK));
    }
}
