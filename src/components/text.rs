//! Text label component
//!
//! The font is shared through the engine's font manager. The string is
//! rendered to a surface when the component starts and again on the first
//! update after it changes.

use std::path::{Path, PathBuf};

use crate::assets::{FontFormat, ResourceId, Surface};
use crate::core::{EngineContext, EngineError};
use crate::ecs::{Component, ComponentBase, DataBag, Entity, EntityRef};
use crate::math::Rect;
use crate::renderer::{Canvas, Color, Flip};

/// Draws a line of text at its entity's position
#[derive(Debug)]
pub struct Text {
    base: ComponentBase,
    filename: PathBuf,
    format: FontFormat,
    text: String,
    color: Color,
    font: Option<ResourceId>,
    surface: Option<Surface>,
    dirty: bool,
}

impl Text {
    /// A white label using a font file at its default size
    #[must_use]
    pub fn new(filename: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            base: ComponentBase::new("text"),
            filename: filename.into(),
            format: FontFormat::default(),
            text: text.into(),
            color: Color::WHITE,
            font: None,
            surface: None,
            dirty: true,
        }
    }

    /// Set the pixel size
    #[must_use]
    pub fn with_size(mut self, size: f32) -> Self {
        self.format = FontFormat { size };
        self
    }

    /// Set the color
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Font file
    #[must_use]
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Current string
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the string; it is re-rendered on the next update
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.dirty = true;
        }
    }

    /// Change the color; the string is re-rendered on the next update
    pub fn set_color(&mut self, color: Color) {
        if color != self.color {
            self.color = color;
            self.dirty = true;
        }
    }

    /// Size in pixels of the rendered string
    #[must_use]
    pub fn rendered_size(&self) -> Option<(u32, u32)> {
        self.surface.as_ref().map(Surface::dimensions)
    }

    fn rerender(&mut self, ctx: &EngineContext) {
        if let Some(font) = self.font.and_then(|id| ctx.fonts.payload(id)) {
            self.surface = Some(font.render(&self.text, self.format.size, self.color));
            self.dirty = false;
        }
    }
}

impl Component for Text {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn on_start(&mut self, ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        let id = ctx.fonts.create(self.base.name(), &self.filename, self.format)?;
        self.font = Some(id);
        self.rerender(ctx);
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        if self.dirty {
            self.rerender(ctx);
        }
        Ok(())
    }

    fn on_render(&self, _ctx: &EngineContext, entity: &Entity, canvas: &mut dyn Canvas) {
        let Some(surface) = &self.surface else {
            return;
        };
        let position = entity.transform().position();
        let dst = Rect::new(
            position.x,
            position.y,
            f64::from(surface.width()),
            f64::from(surface.height()),
        );
        canvas.copy(surface, None, dst, 0.0, Flip::NONE);
    }

    fn on_unload(&mut self, ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        if let Some(id) = self.font.take() {
            ctx.fonts.delete(id);
        }
        self.surface = None;
        self.dirty = true;
        Ok(())
    }

    fn unmarshal(&mut self, data: &DataBag) -> Result<(), EngineError> {
        if let Some(filename) = super::field(data, "filename")? {
            self.filename = filename;
        }
        if let Some(size) = super::field(data, "size")? {
            self.format = FontFormat { size };
        }
        if let Some(text) = super::field::<String>(data, "text")? {
            self.set_text(text);
        }
        if let Some(color) = super::field(data, "color")? {
            self.set_color(color);
        }
        Ok(())
    }
}
