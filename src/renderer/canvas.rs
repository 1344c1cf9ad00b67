//! 2D drawing surface consumed by components

use serde::{Deserialize, Serialize};

use crate::assets::Surface;
use crate::math::{Rect, Vector};

/// RGBA color, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha (255 = opaque)
    pub a: u8,
}

impl Color {
    /// Opaque black
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque red
    pub const RED: Self = Self::rgb(255, 0, 0);
    /// Opaque green
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    /// Opaque blue
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    /// Fully transparent
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Create an opaque color
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a color with alpha
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channels as an array
    #[must_use]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Same color with another alpha
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

impl From<[u8; 4]> for Color {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// Mirroring applied when copying a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flip {
    /// Mirror left/right
    pub horizontal: bool,
    /// Mirror top/bottom
    pub vertical: bool,
}

impl Flip {
    /// No mirroring
    pub const NONE: Self = Self {
        horizontal: false,
        vertical: false,
    };
    /// Mirror left/right
    pub const HORIZONTAL: Self = Self {
        horizontal: true,
        vertical: false,
    };
    /// Mirror top/bottom
    pub const VERTICAL: Self = Self {
        horizontal: false,
        vertical: true,
    };
}

/// Render target for one frame
pub trait Canvas {
    /// Output size in pixels
    fn size(&self) -> (u32, u32);

    /// Color used by subsequent clear, fill, stroke and line calls
    fn set_draw_color(&mut self, color: Color);

    /// Current draw color
    fn draw_color(&self) -> Color;

    /// Fill the whole target with the draw color
    fn clear(&mut self);

    /// Fill a rectangle
    fn fill_rect(&mut self, rect: Rect);

    /// Outline a rectangle, one pixel wide
    fn stroke_rect(&mut self, rect: Rect);

    /// Draw a one pixel line
    fn draw_line(&mut self, from: Vector, to: Vector);

    /// Copy part of a texture into `dst`, rotated by `angle` degrees around
    /// the center of `dst` and mirrored by `flip`. `src` defaults to the
    /// whole texture.
    fn copy(&mut self, texture: &Surface, src: Option<Rect>, dst: Rect, angle: f64, flip: Flip);
}
