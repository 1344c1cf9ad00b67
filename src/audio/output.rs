//! Audio output
//!
//! [`AudioOutput`] owns the output stream and plays [`Sound`]s on channels.
//! Each channel is a rodio sink; fades are stepped once per frame by
//! [`AudioOutput::update`].

use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink, Source, mixer::Mixer};

use crate::core::{EngineError, Object, ObjectId};

use super::Sound;

/// ID of a playing channel
pub type ChannelId = ObjectId;

/// Number of times a sound plays after its first run; `-1` repeats forever
pub type Loops = i32;

/// Linear volume ramp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    from: f32,
    to: f32,
    elapsed: Duration,
    duration: Duration,
    stop_at_end: bool,
}

impl Fade {
    /// Ramp from `from` to `to` over `duration`
    #[must_use]
    pub fn new(from: f32, to: f32, duration: Duration) -> Self {
        Self {
            from,
            to,
            elapsed: Duration::ZERO,
            duration,
            stop_at_end: false,
        }
    }

    /// Stop the channel once the ramp completes
    #[must_use]
    pub const fn then_stop(mut self) -> Self {
        self.stop_at_end = true;
        self
    }

    /// Advance the ramp. Returns the new volume and whether it is finished.
    pub fn step(&mut self, delta: Duration) -> (f32, bool) {
        self.elapsed = (self.elapsed + delta).min(self.duration);
        if self.duration.is_zero() {
            return (self.to, true);
        }
        let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        (self.from + (self.to - self.from) * t, self.elapsed >= self.duration)
    }

    /// Whether the channel stops when the ramp completes
    #[must_use]
    pub const fn stops_at_end(&self) -> bool {
        self.stop_at_end
    }
}

struct Channel {
    object: Object,
    sink: Sink,
    volume: f32,
    fade: Option<Fade>,
}

/// Mixer output with per-channel playback control
pub struct AudioOutput {
    _stream: OutputStream,
    mixer: Mixer,
    channels: Vec<Channel>,
    master_volume: f32,
}

impl AudioOutput {
    /// Open the default output device
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Platform`] if no audio output device is
    /// available
    pub fn new() -> Result<Self, EngineError> {
        let mut stream = OutputStreamBuilder::from_default_device()
            .map_err(|e| EngineError::Platform(format!("audio device: {e}")))?
            .open_stream()
            .map_err(|e| EngineError::Platform(format!("audio stream: {e}")))?;
        stream.log_on_drop(false);
        let mixer = stream.mixer().clone();
        log::info!("audio output opened");

        Ok(Self {
            _stream: stream,
            mixer,
            channels: Vec::new(),
            master_volume: 1.0,
        })
    }

    /// Play a sound. `loops` is the number of extra play-throughs, `-1`
    /// for endless repetition.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Platform`] if the sound fails to decode
    pub fn play(&mut self, name: &str, sound: &Sound, loops: Loops) -> Result<ChannelId, EngineError> {
        self.start(name, sound, loops, 1.0, None)
    }

    /// Play a sound starting silent and ramping up to full volume
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Platform`] if the sound fails to decode
    pub fn fade_in(
        &mut self,
        name: &str,
        sound: &Sound,
        loops: Loops,
        duration: Duration,
    ) -> Result<ChannelId, EngineError> {
        self.start(name, sound, loops, 0.0, Some(Fade::new(0.0, 1.0, duration)))
    }

    /// Ramp a channel down to silence and stop it. False if unknown.
    pub fn fade_out(&mut self, channel: ChannelId, duration: Duration) -> bool {
        let Some(channel) = self.channel_mut(channel) else {
            return false;
        };
        channel.fade = Some(Fade::new(channel.volume, 0.0, duration).then_stop());
        true
    }

    /// Stop a channel now. False if unknown.
    pub fn halt(&mut self, channel: ChannelId) -> bool {
        let Some(index) = self.channels.iter().position(|c| c.object.id() == channel) else {
            return false;
        };
        let channel = self.channels.remove(index);
        channel.sink.stop();
        log::debug!("audio channel halted: channel={}", channel.object);
        true
    }

    /// Stop every channel
    pub fn halt_all(&mut self) {
        for channel in self.channels.drain(..) {
            channel.sink.stop();
        }
    }

    /// Set a channel's volume (before the master volume). False if unknown.
    pub fn set_volume(&mut self, channel: ChannelId, volume: f32) -> bool {
        let master = self.master_volume;
        let Some(channel) = self.channel_mut(channel) else {
            return false;
        };
        channel.volume = volume.max(0.0);
        channel.fade = None;
        channel.sink.set_volume(channel.volume * master);
        true
    }

    /// Set the master volume
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.max(0.0);
        for channel in &self.channels {
            channel.sink.set_volume(channel.volume * self.master_volume);
        }
    }

    /// Master volume
    #[must_use]
    pub const fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Whether a channel is still playing
    #[must_use]
    pub fn is_playing(&self, channel: ChannelId) -> bool {
        self.channels
            .iter()
            .any(|c| c.object.id() == channel && !c.sink.empty())
    }

    /// Number of live channels
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Step fades and drop finished channels. Called once per frame.
    pub fn update(&mut self, delta: Duration) {
        let master = self.master_volume;
        for channel in &mut self.channels {
            let Some(fade) = channel.fade.as_mut() else {
                continue;
            };
            let (volume, done) = fade.step(delta);
            let stop = done && fade.stops_at_end();
            channel.volume = volume;
            channel.sink.set_volume(volume * master);
            if done {
                channel.fade = None;
            }
            if stop {
                channel.sink.stop();
            }
        }
        self.channels.retain(|c| !c.sink.empty());
    }

    fn start(
        &mut self,
        name: &str,
        sound: &Sound,
        loops: Loops,
        volume: f32,
        fade: Option<Fade>,
    ) -> Result<ChannelId, EngineError> {
        let sink = Sink::connect_new(&self.mixer);
        sink.set_volume(volume * self.master_volume);

        if loops < 0 {
            let source = sound.decoder().map_err(EngineError::Platform)?;
            sink.append(source.repeat_infinite());
        } else {
            for _ in 0..=loops {
                sink.append(sound.decoder().map_err(EngineError::Platform)?);
            }
        }

        let object = Object::new(name);
        let id = object.id();
        log::debug!("audio channel started: channel={object} loops={loops}");
        self.channels.push(Channel {
            object,
            sink,
            volume,
            fade,
        });
        Ok(id)
    }

    fn channel_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.object.id() == id)
    }
}

impl std::fmt::Debug for AudioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioOutput")
            .field("channels", &self.channels.len())
            .field("master_volume", &self.master_volume)
            .finish()
    }
}
