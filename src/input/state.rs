//! Keyboard and mouse state
//!
//! Platforms translate their native events into [`InputEvent`]s and feed
//! them to [`Input::apply`] once per frame, after [`Input::begin_frame`]
//! has cleared the per-frame edges.

use rustc_hash::FxHashSet;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use crate::math::Vector;

/// Host input, already translated from the platform's native events
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Key pressed or released
    Key {
        /// Physical key
        code: KeyCode,
        /// True on press
        pressed: bool,
    },
    /// Mouse button pressed or released
    Button {
        /// Button
        button: MouseButton,
        /// True on press
        pressed: bool,
    },
    /// Cursor moved to a position in window coordinates
    MouseMoved(Vector),
    /// Scroll wheel moved
    Scroll(Vector),
    /// Window resized
    Resized {
        /// New width in pixels
        width: u32,
        /// New height in pixels
        height: u32,
    },
    /// The user asked to close the application
    Quit,
}

/// Snapshot of keyboard and mouse state for the current frame
#[derive(Debug, Default)]
pub struct Input {
    pressed_keys: FxHashSet<KeyCode>,
    just_pressed_keys: FxHashSet<KeyCode>,
    just_released_keys: FxHashSet<KeyCode>,
    pressed_buttons: FxHashSet<MouseButton>,
    just_pressed_buttons: FxHashSet<MouseButton>,
    just_released_buttons: FxHashSet<MouseButton>,
    mouse_position: Vector,
    mouse_delta: Vector,
    scroll_delta: Vector,
    quit_requested: bool,
}

impl Input {
    /// Create an empty input state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame state. Called before the frame's events are applied.
    pub fn begin_frame(&mut self) {
        self.just_pressed_keys.clear();
        self.just_released_keys.clear();
        self.just_pressed_buttons.clear();
        self.just_released_buttons.clear();
        self.mouse_delta = Vector::ZERO;
        self.scroll_delta = Vector::ZERO;
    }

    /// Fold one event into the state
    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key { code, pressed } => self.process_key(code, pressed),
            InputEvent::Button { button, pressed } => self.process_button(button, pressed),
            InputEvent::MouseMoved(position) => {
                self.mouse_delta += position - self.mouse_position;
                self.mouse_position = position;
            }
            InputEvent::Scroll(delta) => self.scroll_delta += delta,
            InputEvent::Quit => self.quit_requested = true,
            InputEvent::Resized { .. } => {}
        }
    }

    fn process_key(&mut self, code: KeyCode, pressed: bool) {
        if pressed {
            if self.pressed_keys.insert(code) {
                self.just_pressed_keys.insert(code);
            }
        } else if self.pressed_keys.remove(&code) {
            self.just_released_keys.insert(code);
        }
    }

    fn process_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            if self.pressed_buttons.insert(button) {
                self.just_pressed_buttons.insert(button);
            }
        } else if self.pressed_buttons.remove(&button) {
            self.just_released_buttons.insert(button);
        }
    }

    /// Check if a key is currently pressed
    #[must_use]
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Check if a key was just pressed this frame
    #[must_use]
    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.just_pressed_keys.contains(&key)
    }

    /// Check if a key was just released this frame
    #[must_use]
    pub fn is_key_just_released(&self, key: KeyCode) -> bool {
        self.just_released_keys.contains(&key)
    }

    /// Check if a mouse button is currently pressed
    #[must_use]
    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    /// Check if a mouse button was just pressed this frame
    #[must_use]
    pub fn is_button_just_pressed(&self, button: MouseButton) -> bool {
        self.just_pressed_buttons.contains(&button)
    }

    /// Check if a mouse button was just released this frame
    #[must_use]
    pub fn is_button_just_released(&self, button: MouseButton) -> bool {
        self.just_released_buttons.contains(&button)
    }

    /// Current mouse position in window coordinates
    #[must_use]
    pub const fn mouse_position(&self) -> Vector {
        self.mouse_position
    }

    /// Mouse movement this frame
    #[must_use]
    pub const fn mouse_delta(&self) -> Vector {
        self.mouse_delta
    }

    /// Scroll wheel movement this frame
    #[must_use]
    pub const fn scroll_delta(&self) -> Vector {
        self.scroll_delta
    }

    /// Whether the platform reported a quit request
    #[must_use]
    pub const fn quit_requested(&self) -> bool {
        self.quit_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_edges_last_one_frame() {
        let mut input = Input::new();
        input.apply(InputEvent::Key {
            code: KeyCode::Space,
            pressed: true,
        });

        assert!(input.is_key_pressed(KeyCode::Space));
        assert!(input.is_key_just_pressed(KeyCode::Space));

        input.begin_frame();
        input.apply(InputEvent::Key {
            code: KeyCode::Space,
            pressed: true,
        });
        assert!(input.is_key_pressed(KeyCode::Space));
        assert!(!input.is_key_just_pressed(KeyCode::Space));

        input.begin_frame();
        input.apply(InputEvent::Key {
            code: KeyCode::Space,
            pressed: false,
        });
        assert!(!input.is_key_pressed(KeyCode::Space));
        assert!(input.is_key_just_released(KeyCode::Space));
    }

    #[test]
    fn test_mouse_motion_accumulates_delta() {
        let mut input = Input::new();
        input.apply(InputEvent::MouseMoved(Vector::new(10.0, 10.0)));
        input.apply(InputEvent::MouseMoved(Vector::new(15.0, 5.0)));

        assert_eq!(input.mouse_position(), Vector::new(15.0, 5.0));
        assert_eq!(input.mouse_delta(), Vector::new(15.0, 5.0));

        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vector::ZERO);
    }

    #[test]
    fn test_buttons_and_quit() {
        let mut input = Input::new();
        input.apply(InputEvent::Button {
            button: MouseButton::Left,
            pressed: true,
        });
        input.apply(InputEvent::Quit);

        assert!(input.is_button_just_pressed(MouseButton::Left));
        assert!(input.quit_requested());
    }
}
