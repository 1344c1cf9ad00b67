//! CPU rasteriser
//!
//! [`SoftwareCanvas`] draws into an RGBA framebuffer. Platforms present the
//! framebuffer at the end of each frame; tests inspect it directly.

use image::{Rgba, RgbaImage};

use crate::assets::Surface;
use crate::math::{Rect, Vector};

use super::{Canvas, Color, Flip};

/// Framebuffer-backed [`Canvas`]
#[derive(Debug, Clone)]
pub struct SoftwareCanvas {
    frame: RgbaImage,
    color: Color,
}

impl SoftwareCanvas {
    /// Create a black framebuffer
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: RgbaImage::from_pixel(width.max(1), height.max(1), Rgba([0, 0, 0, 255])),
            color: Color::BLACK,
        }
    }

    /// Resize the framebuffer, discarding its contents
    pub fn resize(&mut self, width: u32, height: u32) {
        self.frame = RgbaImage::from_pixel(width.max(1), height.max(1), Rgba([0, 0, 0, 255]));
    }

    /// The framebuffer
    #[must_use]
    pub const fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    /// Raw RGBA bytes of the framebuffer, row-major
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.frame.as_raw()
    }

    /// Color of one pixel, if inside the framebuffer
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        (x < self.frame.width() && y < self.frame.height())
            .then(|| Color::from(self.frame.get_pixel(x, y).0))
    }

    fn blend(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= i64::from(self.frame.width()) || y >= i64::from(self.frame.height()) {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if color.a == 255 {
            self.frame.put_pixel(x, y, Rgba(color.to_array()));
            return;
        }
        if color.a == 0 {
            return;
        }
        let dst = self.frame.get_pixel_mut(x, y);
        let alpha = u32::from(color.a);
        let inv = 255 - alpha;
        let mix = |s: u8, d: u8| ((u32::from(s) * alpha + u32::from(d) * inv) / 255) as u8;
        dst.0 = [
            mix(color.r, dst.0[0]),
            mix(color.g, dst.0[1]),
            mix(color.b, dst.0[2]),
            (alpha + u32::from(dst.0[3]) * inv / 255).min(255) as u8,
        ];
    }

    /// Integer pixel span covered by a rectangle, clipped to the framebuffer
    fn span(&self, rect: Rect) -> Option<(i64, i64, i64, i64)> {
        if rect.is_empty() {
            return None;
        }
        let x0 = (rect.x.round() as i64).max(0);
        let y0 = (rect.y.round() as i64).max(0);
        let x1 = (rect.right().round() as i64).min(i64::from(self.frame.width()));
        let y1 = (rect.bottom().round() as i64).min(i64::from(self.frame.height()));
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }
}

impl Canvas for SoftwareCanvas {
    fn size(&self) -> (u32, u32) {
        self.frame.dimensions()
    }

    fn set_draw_color(&mut self, color: Color) {
        self.color = color;
    }

    fn draw_color(&self) -> Color {
        self.color
    }

    fn clear(&mut self) {
        let pixel = Rgba(self.color.to_array());
        for p in self.frame.pixels_mut() {
            *p = pixel;
        }
    }

    fn fill_rect(&mut self, rect: Rect) {
        let Some((x0, y0, x1, y1)) = self.span(rect) else {
            return;
        };
        let color = self.color;
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, color);
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        let (l, t) = (rect.x.round(), rect.y.round());
        let (r, b) = (rect.right().round() - 1.0, rect.bottom().round() - 1.0);
        self.draw_line(Vector::new(l, t), Vector::new(r, t));
        self.draw_line(Vector::new(l, b), Vector::new(r, b));
        self.draw_line(Vector::new(l, t), Vector::new(l, b));
        self.draw_line(Vector::new(r, t), Vector::new(r, b));
    }

    fn draw_line(&mut self, from: Vector, to: Vector) {
        // Bresenham
        let (mut x0, mut y0) = (from.x.round() as i64, from.y.round() as i64);
        let (x1, y1) = (to.x.round() as i64, to.y.round() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let color = self.color;
        loop {
            self.blend(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn copy(&mut self, texture: &Surface, src: Option<Rect>, dst: Rect, angle: f64, flip: Flip) {
        let (tw, th) = texture.dimensions();
        let src = src.unwrap_or_else(|| Rect::new(0.0, 0.0, f64::from(tw), f64::from(th)));
        if src.is_empty() || dst.is_empty() {
            return;
        }

        let center = dst.center();
        let (sin, cos) = angle.to_radians().sin_cos();
        // Rotated destination bounds
        let corners = [
            Vector::new(dst.x, dst.y),
            Vector::new(dst.right(), dst.y),
            Vector::new(dst.x, dst.bottom()),
            Vector::new(dst.right(), dst.bottom()),
        ]
        .map(|p| {
            let d = p - center;
            center + Vector::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos)
        });
        let min = corners.iter().fold(Vector::splat(f64::MAX), |m, p| m.min(*p));
        let max = corners.iter().fold(Vector::splat(f64::MIN), |m, p| m.max(*p));
        let Some((x0, y0, x1, y1)) = self.span(Rect::from_position_size(min, max - min)) else {
            return;
        };

        for y in y0..y1 {
            for x in x0..x1 {
                // Inverse-rotate the pixel center back into the unrotated dst rect
                let d = Vector::new(x as f64 + 0.5, y as f64 + 0.5) - center;
                let local = center + Vector::new(d.x * cos + d.y * sin, -d.x * sin + d.y * cos);
                let mut u = (local.x - dst.x) / dst.w;
                let mut v = (local.y - dst.y) / dst.h;
                if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                    continue;
                }
                if flip.horizontal {
                    u = 1.0 - u;
                }
                if flip.vertical {
                    v = 1.0 - v;
                }
                let sx = (src.x + u * src.w).floor() as i64;
                let sy = (src.y + v * src.h).floor() as i64;
                if sx < 0 || sy < 0 || sx >= i64::from(tw) || sy >= i64::from(th) {
                    continue;
                }
                let texel = Color::from(texture.get_pixel(sx as u32, sy as u32).0);
                self.blend(x, y, texel);
            }
        }
    }
}
