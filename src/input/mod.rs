//! Input handling module
//!
//! Raw keyboard and mouse state tracking, plus per-frame cursor
//! arbitration.

mod cursor;
mod state;

pub use cursor::{CursorManager, CursorRequest, CursorShape, CursorSink};
pub use state::{Input, InputEvent};

pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;
