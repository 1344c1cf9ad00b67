//! Image surfaces
//!
//! Images are decoded once per filename into RGBA [`Surface`]s that
//! components copy onto the canvas.

use std::path::Path;

use image::{ImageReader, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::core::{AssetError, AssetPhase};

use super::{ResourceLoader, ResourceManager};

/// Decoded RGBA pixels, ready to be copied onto a canvas
pub type Surface = RgbaImage;

/// Image manager used by sprite components
pub type ImageManager = ResourceManager<ImageLoader>;

/// Supported image file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    /// Windows bitmap
    Bmp,
    /// Portable network graphics
    Png,
    /// JPEG
    Jpg,
}

impl ImageFormat {
    /// Guess the format from a file extension
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "bmp" => Some(Self::Bmp),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpg),
            _ => None,
        }
    }

    const fn codec(self) -> image::ImageFormat {
        match self {
            Self::Bmp => image::ImageFormat::Bmp,
            Self::Png => image::ImageFormat::Png,
            Self::Jpg => image::ImageFormat::Jpeg,
        }
    }
}

/// Decodes image files into [`Surface`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageLoader;

impl ResourceLoader for ImageLoader {
    type Payload = Surface;
    /// Explicit format, or `None` to sniff the file contents
    type Format = Option<ImageFormat>;

    fn load(&mut self, filename: &Path, format: Option<ImageFormat>) -> Result<Surface, AssetError> {
        let reader = ImageReader::open(filename)
            .map_err(|e| AssetError::new(filename, AssetPhase::Open, e))?;
        let reader = match format {
            Some(format) => {
                let mut reader = reader;
                reader.set_format(format.codec());
                reader
            }
            None => reader
                .with_guessed_format()
                .map_err(|e| AssetError::new(filename, AssetPhase::Open, e))?,
        };
        let image = reader
            .decode()
            .map_err(|e| AssetError::new(filename, AssetPhase::Decode, e))?;

        log::debug!(
            "image decoded: filename={} size={}x{}",
            filename.display(),
            image.width(),
            image.height()
        );
        Ok(image.to_rgba8())
    }
}

/// Create the engine's image manager
#[must_use]
pub fn image_manager() -> ImageManager {
    ResourceManager::new("image-manager", ImageLoader)
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ImageFormat::from_path("a/b.PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_path("photo.jpeg"), Some(ImageFormat::Jpg));
        assert_eq!(ImageFormat::from_path("old.bmp"), Some(ImageFormat::Bmp));
        assert_eq!(ImageFormat::from_path("notes.txt"), None);
        assert_eq!(ImageFormat::from_path("noext"), None);
    }

    #[test]
    fn test_decodes_png_once_per_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();

        let mut images = image_manager();
        let id = images.create("dot", &path, Some(ImageFormat::Png)).unwrap();
        let again = images.create("dot", &path, None).unwrap();

        assert_eq!(id, again);
        assert_eq!(images.ref_count(id), 2);
        let surface = images.payload(id).unwrap();
        assert_eq!(surface.dimensions(), (3, 2));
        assert_eq!(surface.get_pixel(2, 1), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_missing_file_reports_open_phase() {
        let mut images = image_manager();
        let err = images
            .create("ghost", "does/not/exist.png", None)
            .unwrap_err();

        assert_eq!(err.phase, AssetPhase::Open);
        assert!(images.is_empty());
    }

    #[test]
    fn test_garbage_reports_decode_phase() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let err = ImageLoader
            .load(&path, Some(ImageFormat::Png))
            .unwrap_err();
        assert_eq!(err.phase, AssetPhase::Decode);
    }
}
