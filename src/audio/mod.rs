//! Audio module
//!
//! Sound assets are cached by the [`SoundManager`]; playback goes through
//! [`AudioOutput`] when the engine was configured with audio.

mod output;
mod sound;

pub use output::{AudioOutput, ChannelId, Fade, Loops};
pub use sound::{Sound, SoundFormat, SoundLoader, SoundManager, sound_manager};

#[cfg(test)]
pub(crate) use sound::tests::silent_wav;
