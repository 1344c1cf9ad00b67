//! Image sprite component
//!
//! The image is acquired from the engine's image manager when the component
//! starts and released when it unloads, so sprites sharing a file share one
//! decoded surface.

use std::path::{Path, PathBuf};

use crate::assets::{ImageFormat, ResourceId};
use crate::core::{EngineContext, EngineError};
use crate::ecs::{Component, ComponentBase, DataBag, Entity, EntityRef};
use crate::math::Rect;
use crate::renderer::{Canvas, Flip};

/// Draws an image over its entity's rectangle
#[derive(Debug)]
pub struct Sprite {
    base: ComponentBase,
    filename: PathBuf,
    format: Option<ImageFormat>,
    source: Option<Rect>,
    flip: Flip,
    image: Option<ResourceId>,
}

impl Sprite {
    /// Sprite showing the whole of an image file
    #[must_use]
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        let filename = filename.into();
        Self {
            base: ComponentBase::new("sprite"),
            format: ImageFormat::from_path(&filename),
            filename,
            source: None,
            flip: Flip::NONE,
            image: None,
        }
    }

    /// Show only part of the image
    #[must_use]
    pub fn with_source(mut self, source: Rect) -> Self {
        self.source = Some(source);
        self
    }

    /// Mirror the image
    #[must_use]
    pub fn with_flip(mut self, flip: Flip) -> Self {
        self.flip = flip;
        self
    }

    /// Image file
    #[must_use]
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Handle in the image manager while loaded
    #[must_use]
    pub const fn image(&self) -> Option<ResourceId> {
        self.image
    }

    /// Change the shown part of the image
    pub fn set_source(&mut self, source: Option<Rect>) {
        self.source = source;
    }

    /// Change the mirroring
    pub fn set_flip(&mut self, flip: Flip) {
        self.flip = flip;
    }
}

impl Component for Sprite {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn on_start(&mut self, ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        let id = ctx
            .images
            .create(self.base.name(), &self.filename, self.format)?;
        self.image = Some(id);
        Ok(())
    }

    fn on_render(&self, ctx: &EngineContext, entity: &Entity, canvas: &mut dyn Canvas) {
        let Some(surface) = self.image.and_then(|id| ctx.images.payload(id)) else {
            return;
        };
        let transform = entity.transform();
        canvas.copy(surface, self.source, transform.rect(), transform.rotation(), self.flip);
    }

    fn on_unload(&mut self, ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        if let Some(id) = self.image.take() {
            ctx.images.delete(id);
        }
        Ok(())
    }

    fn unmarshal(&mut self, data: &DataBag) -> Result<(), EngineError> {
        if let Some(filename) = super::field::<PathBuf>(data, "filename")? {
            self.format = ImageFormat::from_path(&filename);
            self.filename = filename;
        }
        if let Some(format) = super::field(data, "format")? {
            self.format = Some(format);
        }
        if let Some(source) = super::field(data, "source")? {
            self.source = Some(source);
        }
        if let Some(flip) = super::field(data, "flip")? {
            self.flip = flip;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::core::AssetPhase;
    use crate::ecs::lifecycle;
    use crate::math::Vector;
    use crate::renderer::{Color, SoftwareCanvas};
    use crate::scene::Scene;

    fn spawn(ctx: &mut EngineContext, sprite: Sprite) -> EntityRef {
        let scene = ctx.scenes.add_scene(Scene::new("s"));
        let entity = Entity::new("hero")
            .with_dim(Vector::new(4.0, 4.0))
            .with_component(sprite)
            .unwrap();
        ctx.scenes.scene_mut(scene).unwrap().add_entity(entity)
    }

    #[test]
    fn test_sprites_share_image_and_release_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hero.png");
        RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255])).save(&path).unwrap();

        let mut ctx = EngineContext::new(8, 8);
        let a = spawn(&mut ctx, Sprite::new(&path));
        let b = spawn(&mut ctx, Sprite::new(&path));
        lifecycle::load_entity(&mut ctx, a).unwrap();
        lifecycle::load_entity(&mut ctx, b).unwrap();

        let id = ctx.component::<Sprite>(a).unwrap().image().unwrap();
        assert_eq!(ctx.images.ref_count(id), 2);

        let mut canvas = SoftwareCanvas::new(8, 8);
        let entity = ctx.entity(a).unwrap();
        entity.get_component::<Sprite>().unwrap().on_render(&ctx, entity, &mut canvas);
        assert_eq!(canvas.pixel(1, 1), Some(Color::GREEN));

        lifecycle::unload_entity(&mut ctx, a).unwrap();
        assert_eq!(ctx.images.ref_count(id), 1);
        lifecycle::unload_entity(&mut ctx, b).unwrap();
        assert!(ctx.images.is_empty());
    }

    #[test]
    fn test_missing_image_fails_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = EngineContext::new(8, 8);
        let owner = spawn(&mut ctx, Sprite::new(dir.path().join("nope.png")));

        let err = lifecycle::load_entity(&mut ctx, owner).unwrap_err();
        assert!(matches!(err, EngineError::Asset(e) if e.phase == AssetPhase::Open));
    }
}
