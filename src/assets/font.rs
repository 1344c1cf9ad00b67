//! TrueType fonts
//!
//! Fonts are parsed once per filename with `fontdue`. The parsed font is
//! size-independent; each caller rasterises strings into [`Surface`]s at its
//! own pixel size.

use std::path::Path;

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::core::{AssetError, AssetPhase};
use crate::renderer::Color;

use super::{ResourceLoader, ResourceManager, Surface};

/// Font manager used by text components
pub type FontManager = ResourceManager<FontLoader>;

/// Pixel size requested by the first user of a font file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontFormat {
    /// Em size in pixels
    pub size: f32,
}

impl Default for FontFormat {
    fn default() -> Self {
        Self { size: 16.0 }
    }
}

/// A parsed font, rasterised at any pixel size
pub struct Font {
    inner: fontdue::Font,
}

impl Font {
    /// Parse a font from TTF/OTF bytes
    ///
    /// # Errors
    ///
    /// Returns the parser's message if the bytes are not a usable font
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        let inner = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(String::from)?;
        Ok(Self { inner })
    }

    /// Width and height in pixels of a string rendered at `size`
    #[must_use]
    pub fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        let size = size.max(1.0);
        let (ascent, descent) = self.vertical_extent(size);
        let mut width = 0.0f32;
        let mut prev = None;
        for c in text.chars() {
            width += self.kern(prev, c, size) + self.inner.metrics(c, size).advance_width;
            prev = Some(c);
        }
        (width.ceil().max(0.0) as u32, (ascent - descent).ceil().max(0.0) as u32)
    }

    /// Render a single line of text at `size` pixels. Empty strings yield a
    /// 1x1 transparent surface.
    #[must_use]
    pub fn render(&self, text: &str, size: f32, color: Color) -> Surface {
        let size = size.max(1.0);
        let (width, height) = self.measure(text, size);
        let mut surface = Surface::new(width.max(1), height.max(1));
        let (ascent, _) = self.vertical_extent(size);
        let baseline = ascent.round() as i64;

        let mut pen = 0.0f32;
        let mut prev = None;
        for c in text.chars() {
            pen += self.kern(prev, c, size);
            let (metrics, coverage) = self.inner.rasterize(c, size);
            let left = pen.round() as i64 + i64::from(metrics.xmin);
            let top = baseline - (metrics.height as i64 + i64::from(metrics.ymin));

            for (row, line) in coverage.chunks(metrics.width.max(1)).enumerate() {
                for (col, &alpha) in line.iter().enumerate() {
                    let (x, y) = (left + col as i64, top + row as i64);
                    if alpha == 0 || x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
                        continue;
                    }
                    let a = (u16::from(alpha) * u16::from(color.a) / 255) as u8;
                    let pixel = surface.get_pixel_mut(x as u32, y as u32);
                    if a > pixel.0[3] {
                        *pixel = Rgba([color.r, color.g, color.b, a]);
                    }
                }
            }

            pen += metrics.advance_width;
            prev = Some(c);
        }
        surface
    }

    fn kern(&self, prev: Option<char>, c: char, size: f32) -> f32 {
        prev.and_then(|p| self.inner.horizontal_kern(p, c, size))
            .unwrap_or(0.0)
    }

    fn vertical_extent(&self, size: f32) -> (f32, f32) {
        self.inner
            .horizontal_line_metrics(size)
            .map_or((size, 0.0), |m| (m.ascent, m.descent))
    }
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("glyphs", &self.inner.glyph_count())
            .finish()
    }
}

/// Reads and parses font files
#[derive(Debug, Default, Clone, Copy)]
pub struct FontLoader;

impl ResourceLoader for FontLoader {
    type Payload = Font;
    type Format = FontFormat;

    fn load(&mut self, filename: &Path, format: FontFormat) -> Result<Font, AssetError> {
        let bytes = std::fs::read(filename)
            .map_err(|e| AssetError::new(filename, AssetPhase::Open, e))?;
        let font = Font::from_bytes(&bytes)
            .map_err(|e| AssetError::new(filename, AssetPhase::Decode, e))?;
        log::debug!(
            "font opened: filename={} size={}",
            filename.display(),
            format.size
        );
        Ok(font)
    }
}

/// Create the engine's font manager
#[must_use]
pub fn font_manager() -> FontManager {
    ResourceManager::new("font-manager", FontLoader)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_fail_to_parse() {
        assert!(Font::from_bytes(b"not a font").is_err());
    }

    #[test]
    fn test_shared_font_renders_at_each_callers_size() {
        let mut fonts = font_manager();
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/fonts/Cantarell-Regular.ttf");
        let large = fonts.create("title", path, FontFormat { size: 32.0 }).unwrap();
        let small = fonts.create("label", path, FontFormat { size: 12.0 }).unwrap();
        assert_eq!(large, small);
        assert_eq!(fonts.len(), 1);

        let font = fonts.payload(large).unwrap();
        let (wide, tall) = font.measure("Score", 32.0);
        let (narrow, short) = font.measure("Score", 12.0);
        assert!(wide > narrow);
        assert!(tall > short);
        assert_eq!(font.render("Score", 12.0, Color::WHITE).dimensions(), (narrow, short));
    }

    #[test]
    fn test_missing_font_reports_open_phase() {
        let mut fonts = font_manager();
        let err = fonts
            .create("ui", "fonts/missing.ttf", FontFormat::default())
            .unwrap_err();
        assert_eq!(err.phase, AssetPhase::Open);
    }

    #[test]
    fn test_invalid_font_file_reports_decode_phase() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ttf");
        std::fs::write(&path, [0u8; 64]).unwrap();

        let err = FontLoader.load(&path, FontFormat { size: 10.0 }).unwrap_err();
        assert_eq!(err.phase, AssetPhase::Decode);
        assert!(err.to_string().contains("bad.ttf"));
    }
}
