//! Cursor arbitration
//!
//! Components request cursor shapes during the frame (a button under the
//! mouse asks for a hand, for example). After the update phase the first
//! request that carries a focus entity wins; when nothing has focus any more
//! the cursor falls back to the arrow.

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, Object};

/// System cursor shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CursorShape {
    /// Default pointer
    #[default]
    Arrow,
    /// Pointing hand
    Hand,
    /// Text insertion bar
    Text,
    /// Crosshair
    Crosshair,
    /// Busy indicator
    Wait,
    /// Four-way move arrows
    Move,
    /// Forbidden action
    NotAllowed,
}

/// Something that can show a system cursor
pub trait CursorSink {
    /// Change the visible cursor
    fn set_cursor(&mut self, shape: CursorShape);
}

/// One cursor request collected during a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorRequest {
    /// Entity asking for the cursor; requests without focus never win
    pub focus: Option<EntityId>,
    /// Requested shape
    pub shape: CursorShape,
}

/// Collects cursor requests and applies the winner once per frame
#[derive(Debug)]
pub struct CursorManager {
    object: Object,
    requests: Vec<CursorRequest>,
    focus: Option<EntityId>,
    current: CursorShape,
}

impl CursorManager {
    /// Create a manager showing the arrow
    #[must_use]
    pub fn new() -> Self {
        Self {
            object: Object::new("cursor-manager"),
            requests: Vec::new(),
            focus: None,
            current: CursorShape::Arrow,
        }
    }

    /// Called once by the engine after construction
    pub fn on_start(&mut self) {
        log::debug!("{} started", self.object);
    }

    /// Request a cursor shape for this frame
    pub fn request(&mut self, focus: Option<EntityId>, shape: CursorShape) {
        self.requests.push(CursorRequest { focus, shape });
    }

    /// Requests collected so far this frame
    #[must_use]
    pub fn requests(&self) -> &[CursorRequest] {
        &self.requests
    }

    /// Entity whose request was applied last
    #[must_use]
    pub const fn focus(&self) -> Option<EntityId> {
        self.focus
    }

    /// Shape currently shown
    #[must_use]
    pub const fn current(&self) -> CursorShape {
        self.current
    }

    /// Resolve this frame's requests and clear them.
    ///
    /// Returns the shape pushed to the sink, if it changed.
    pub fn on_after_update(&mut self, sink: &mut dyn CursorSink) -> Option<CursorShape> {
        let winner = self.requests.iter().find(|r| r.focus.is_some()).copied();
        self.requests.clear();

        let shape = match winner {
            Some(request) => {
                self.focus = request.focus;
                request.shape
            }
            None if self.focus.is_some() => {
                self.focus = None;
                CursorShape::Arrow
            }
            None => return None,
        };

        if shape == self.current {
            return None;
        }
        self.current = shape;
        sink.set_cursor(shape);
        Some(shape)
    }
}

impl Default for CursorManager {
    fn default() -> Self {
        Self::new()
    }
}
