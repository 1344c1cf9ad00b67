//! Asset and resource management
//!
//! Provides the reference-counted [`ResourceManager`] and its image and
//! font instantiations. Sounds use the same manager from
//! [`crate::audio`].

mod font;
mod image;
mod resource;

pub use font::{Font, FontFormat, FontLoader, FontManager, font_manager};
pub use self::image::{ImageFormat, ImageLoader, ImageManager, Surface, image_manager};
pub use resource::{Resource, ResourceId, ResourceLoader, ResourceManager};

#[cfg(test)]
pub(crate) use resource::tests::CountingLoader;
