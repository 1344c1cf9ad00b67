//! Headless platform
//!
//! No window: input comes from a script keyed by pump number, presented
//! frames are counted (and the last one kept), and cursor changes are
//! recorded. Used by tests and by tools that run a game without a display.

use image::RgbaImage;

use crate::core::{EngineConfig, EngineError};
use crate::input::{CursorShape, CursorSink, Input, InputEvent};
use crate::renderer::SoftwareCanvas;

use super::Platform;

/// Platform without a window
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    size: (u32, u32),
    script: Vec<(u64, InputEvent)>,
    pumps: u64,
    quit_after: Option<u64>,
    presented: u64,
    last_frame: Option<RgbaImage>,
    cursor: CursorShape,
    cursor_history: Vec<CursorShape>,
}

impl HeadlessPlatform {
    /// Create a platform; its size is taken from the configuration at init
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a quit on the given pump, so the engine runs exactly
    /// `frames` frames
    #[must_use]
    pub fn with_quit_after(mut self, frames: u64) -> Self {
        self.quit_after = Some(frames);
        self
    }

    /// Deliver an event on the given pump (0 is the first frame)
    #[must_use]
    pub fn with_event(mut self, frame: u64, event: InputEvent) -> Self {
        self.script.push((frame, event));
        self
    }

    /// Number of pumps so far
    #[must_use]
    pub const fn pumps(&self) -> u64 {
        self.pumps
    }

    /// Number of frames presented
    #[must_use]
    pub const fn presented(&self) -> u64 {
        self.presented
    }

    /// Copy of the last presented frame
    #[must_use]
    pub const fn last_frame(&self) -> Option<&RgbaImage> {
        self.last_frame.as_ref()
    }

    /// Cursor shape currently shown
    #[must_use]
    pub const fn cursor(&self) -> CursorShape {
        self.cursor
    }

    /// Every cursor change, in order
    #[must_use]
    pub fn cursor_history(&self) -> &[CursorShape] {
        &self.cursor_history
    }
}

impl Platform for HeadlessPlatform {
    fn init(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        self.size = (config.width, config.height);
        log::info!("headless platform: size={}x{}", config.width, config.height);
        Ok(())
    }

    fn pump(&mut self, input: &mut Input) -> Result<(), EngineError> {
        let pump = self.pumps;
        self.pumps += 1;

        for &(_, event) in self.script.iter().filter(|(frame, _)| *frame == pump) {
            if let InputEvent::Resized { width, height } = event {
                self.size = (width, height);
            }
            input.apply(event);
        }
        if self.quit_after.is_some_and(|frames| pump >= frames) {
            input.apply(InputEvent::Quit);
        }
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn present(&mut self, canvas: &SoftwareCanvas) -> Result<(), EngineError> {
        self.presented += 1;
        self.last_frame = Some(canvas.frame().clone());
        Ok(())
    }
}

impl CursorSink for HeadlessPlatform {
    fn set_cursor(&mut self, shape: CursorShape) {
        self.cursor = shape;
        self.cursor_history.push(shape);
    }
}
