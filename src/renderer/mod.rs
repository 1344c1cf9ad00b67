//! Rendering module
//!
//! Components draw through the [`Canvas`] trait. The engine renders into a
//! [`SoftwareCanvas`]; windowed platforms hand the finished framebuffer to
//! the wgpu [`Presenter`].

mod canvas;
mod context;
mod software;
mod texture;

pub use canvas::{Canvas, Color, Flip};
pub use context::Presenter;
pub use software::SoftwareCanvas;
pub use texture::FrameTexture;
