//! Sound assets
//!
//! Sound files are read into memory once per filename and checked by
//! decoding their header. Playback decodes from the shared bytes, so one
//! loaded sound can play on several channels at once.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, Source};
use serde::{Deserialize, Serialize};

use crate::assets::{ResourceLoader, ResourceManager};
use crate::core::{AssetError, AssetPhase};

/// Sound manager used by sound components
pub type SoundManager = ResourceManager<SoundLoader>;

/// Supported sound formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SoundFormat {
    /// Compressed music track
    Mp3,
    /// Short uncompressed sample
    #[default]
    Wav,
}

impl SoundFormat {
    /// Guess the format from a file extension
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "mp3" => Some(Self::Mp3),
            "wav" => Some(Self::Wav),
            _ => None,
        }
    }
}

/// Encoded sound bytes, shared between every channel playing them
#[derive(Debug, Clone)]
pub struct Sound {
    data: Arc<[u8]>,
    format: SoundFormat,
    duration: Option<Duration>,
}

impl Sound {
    /// Wrap encoded bytes, checking that they decode
    ///
    /// # Errors
    ///
    /// Returns the decoder's message if the bytes are not a supported sound
    pub fn from_bytes(data: impl Into<Arc<[u8]>>, format: SoundFormat) -> Result<Self, String> {
        let data = data.into();
        let decoder = Decoder::new(Cursor::new(Arc::clone(&data))).map_err(|e| e.to_string())?;
        let duration = decoder.total_duration();
        Ok(Self {
            data,
            format,
            duration,
        })
    }

    /// A fresh decoder over the shared bytes
    ///
    /// # Errors
    ///
    /// Returns the decoder's message if decoding fails
    pub fn decoder(&self) -> Result<Decoder<Cursor<Arc<[u8]>>>, String> {
        Decoder::new(Cursor::new(Arc::clone(&self.data))).map_err(|e| e.to_string())
    }

    /// Format tag
    #[must_use]
    pub const fn format(&self) -> SoundFormat {
        self.format
    }

    /// Length of one play-through, when the decoder knows it
    #[must_use]
    pub const fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Size of the encoded data in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the encoded data is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Reads sound files into memory
#[derive(Debug, Default, Clone, Copy)]
pub struct SoundLoader;

impl ResourceLoader for SoundLoader {
    type Payload = Sound;
    type Format = SoundFormat;

    fn load(&mut self, filename: &Path, format: SoundFormat) -> Result<Sound, AssetError> {
        let bytes = std::fs::read(filename)
            .map_err(|e| AssetError::new(filename, AssetPhase::Open, e))?;
        let sound = Sound::from_bytes(bytes, format)
            .map_err(|e| AssetError::new(filename, AssetPhase::Decode, e))?;
        log::debug!(
            "sound loaded: filename={} format={:?} bytes={}",
            filename.display(),
            format,
            sound.len()
        );
        Ok(sound)
    }
}

/// Create the engine's sound manager
#[must_use]
pub fn sound_manager() -> SoundManager {
    ResourceManager::new("sound-manager", SoundLoader)
}
