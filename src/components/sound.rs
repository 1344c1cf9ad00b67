//! Sound playback component
//!
//! Loads its sound through the shared sound manager when the entity starts
//! and plays it on the engine's audio output. Without an output (audio
//! disabled in the configuration) playback requests are ignored.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assets::ResourceId;
use crate::audio::{ChannelId, Loops, SoundFormat};
use crate::core::{EngineContext, EngineError};
use crate::ecs::{Component, ComponentBase, DataBag, EntityRef};

/// Plays a sound file
#[derive(Debug)]
pub struct SoundPlayer {
    base: ComponentBase,
    filename: PathBuf,
    format: Option<SoundFormat>,
    loops: Loops,
    play_on_start: bool,
    fade_in: Option<Duration>,
    sound: Option<ResourceId>,
    channel: Option<ChannelId>,
}

impl SoundPlayer {
    /// A player for `filename`, format guessed from the extension
    #[must_use]
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            base: ComponentBase::new("sound"),
            filename: filename.into(),
            format: None,
            loops: 0,
            play_on_start: false,
            fade_in: None,
            sound: None,
            channel: None,
        }
    }

    /// Force the file format
    #[must_use]
    pub fn with_format(mut self, format: SoundFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Extra play-throughs; `-1` loops forever
    #[must_use]
    pub fn with_loops(mut self, loops: Loops) -> Self {
        self.loops = loops;
        self
    }

    /// Start playing as soon as the sound is loaded
    #[must_use]
    pub fn with_autoplay(mut self) -> Self {
        self.play_on_start = true;
        self
    }

    /// Ramp the volume up when playback starts
    #[must_use]
    pub fn with_fade_in(mut self, duration: Duration) -> Self {
        self.fade_in = Some(duration);
        self
    }

    /// Sound file
    #[must_use]
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Loaded sound, once started
    #[must_use]
    pub const fn sound(&self) -> Option<ResourceId> {
        self.sound
    }

    /// Channel of the current playback
    #[must_use]
    pub const fn channel(&self) -> Option<ChannelId> {
        self.channel
    }

    /// Start playback, stopping any previous one
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Platform`] if the output cannot decode the sound
    pub fn play(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        let Some(id) = self.sound else {
            return Ok(());
        };
        let (Some(audio), Some(sound)) = (ctx.audio.as_mut(), ctx.sounds.payload(id)) else {
            log::debug!("no audio output, not playing: file={}", self.filename.display());
            return Ok(());
        };
        if let Some(channel) = self.channel.take() {
            audio.halt(channel);
        }
        let channel = match self.fade_in {
            Some(duration) => audio.fade_in(self.base.name(), sound, self.loops, duration)?,
            None => audio.play(self.base.name(), sound, self.loops)?,
        };
        self.channel = Some(channel);
        Ok(())
    }

    /// Stop playback immediately
    pub fn stop(&mut self, ctx: &mut EngineContext) {
        if let (Some(channel), Some(audio)) = (self.channel.take(), ctx.audio.as_mut()) {
            audio.halt(channel);
        }
    }

    /// Ramp playback down to silence, then stop
    pub fn fade_out(&mut self, ctx: &mut EngineContext, duration: Duration) {
        if let (Some(channel), Some(audio)) = (self.channel.take(), ctx.audio.as_mut()) {
            audio.fade_out(channel, duration);
        }
    }

    /// Whether the current playback is still running
    #[must_use]
    pub fn is_playing(&self, ctx: &EngineContext) -> bool {
        match (self.channel, ctx.audio.as_ref()) {
            (Some(channel), Some(audio)) => audio.is_playing(channel),
            _ => false,
        }
    }
}

impl Component for SoundPlayer {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn on_start(&mut self, ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        let format = self
            .format
            .or_else(|| SoundFormat::from_path(&self.filename))
            .unwrap_or_default();
        self.sound = Some(ctx.sounds.create(self.base.name(), &self.filename, format)?);
        if self.play_on_start {
            self.play(ctx)?;
        }
        Ok(())
    }

    fn on_unload(&mut self, ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        self.stop(ctx);
        if let Some(id) = self.sound.take() {
            ctx.sounds.delete(id);
        }
        Ok(())
    }

    fn unmarshal(&mut self, data: &DataBag) -> Result<(), EngineError> {
        if let Some(filename) = super::field(data, "filename")? {
            self.filename = filename;
        }
        if let Some(format) = super::field(data, "format")? {
            self.format = Some(format);
        }
        if let Some(loops) = super::field(data, "loops")? {
            self.loops = loops;
        }
        if let Some(autoplay) = super::field(data, "autoplay")? {
            self.play_on_start = autoplay;
        }
        if let Some(millis) = super::field::<u64>(data, "fade_in_ms")? {
            self.fade_in = Some(Duration::from_millis(millis));
        }
        Ok(())
    }
}
