//! Host platforms
//!
//! A [`Platform`] provides what the engine needs from its host: a window to
//! present the software canvas on, translated input events and a system
//! cursor. [`WindowPlatform`] runs on a desktop window; [`HeadlessPlatform`]
//! drives the engine without one, from scripted input.

mod headless;
mod window;

pub use headless::HeadlessPlatform;
pub use window::WindowPlatform;

use crate::core::{EngineConfig, EngineError};
use crate::input::{CursorSink, Input};
use crate::renderer::SoftwareCanvas;

/// Host capabilities used by the engine loop
pub trait Platform: CursorSink {
    /// Open the window (or its stand-in) described by the configuration
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Platform`] if the host refuses
    fn init(&mut self, config: &EngineConfig) -> Result<(), EngineError>;

    /// Poll pending host events without blocking and fold them into `input`.
    /// A close request sets [`Input::quit_requested`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Platform`] if the event source failed
    fn pump(&mut self, input: &mut Input) -> Result<(), EngineError>;

    /// Current output size in pixels
    fn size(&self) -> (u32, u32);

    /// Show a finished frame
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Platform`] if the frame could not be shown
    fn present(&mut self, canvas: &SoftwareCanvas) -> Result<(), EngineError>;
}
