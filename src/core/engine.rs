//! Engine configuration and the main loop

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::AudioOutput;
use crate::platform::{Platform, WindowPlatform};
use crate::renderer::{Canvas, Color, SoftwareCanvas};
use crate::scene::systems;

use super::{EngineContext, EngineError, FrameStats, LogConfig, Time, init_logging};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window title
    pub title: String,
    /// Canvas width
    pub width: u32,
    /// Canvas height
    pub height: u32,
    /// Target frames per second (0 for unlimited)
    pub target_fps: u32,
    /// Enable VSync
    pub vsync: bool,
    /// Open an audio output at start
    pub audio: bool,
    /// Background color the canvas is cleared to
    pub clear_color: Color,
    /// Log backend settings
    pub log: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: String::from("sprout"),
            width: 800,
            height: 600,
            target_fps: 30,
            vsync: true,
            audio: false,
            clear_color: Color::BLACK,
            log: LogConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration written in RON. Missing fields keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the text is not a valid configuration
    pub fn from_ron_str(text: &str) -> Result<Self, EngineError> {
        ron::from_str(text).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Read a RON configuration file
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the file cannot be read and
    /// [`EngineError::Config`] if it does not parse
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
            .map_err(|e| EngineError::Config(format!("file={} {e}", path.display())))
    }

    /// Set the window title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set canvas dimensions
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set target FPS
    #[must_use]
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    /// Enable or disable VSync
    #[must_use]
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Enable or disable the audio output
    #[must_use]
    pub fn with_audio(mut self, audio: bool) -> Self {
        self.audio = audio;
        self
    }

    /// Set the canvas background color
    #[must_use]
    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Append log output to a file instead of stderr
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log.file = Some(path.into());
        self
    }
}

/// Game hooks called by the engine. Every hook defaults to doing nothing.
pub trait Game: 'static {
    /// Called once after the managers have started; add scenes here
    ///
    /// # Errors
    ///
    /// An error stops the engine before the first frame
    fn init(&mut self, _ctx: &mut EngineContext) -> Result<(), EngineError> {
        Ok(())
    }

    /// Called once after [`Game::init`] to preload shared resources
    ///
    /// # Errors
    ///
    /// An error stops the engine before the first frame
    fn create_assets(&mut self, _ctx: &mut EngineContext) -> Result<(), EngineError> {
        Ok(())
    }

    /// Called every frame after input, before the scene passes
    ///
    /// # Errors
    ///
    /// An error stops the engine
    fn frame_start(&mut self, _ctx: &mut EngineContext) -> Result<(), EngineError> {
        Ok(())
    }

    /// Called every frame after the queued scene transition was applied
    ///
    /// # Errors
    ///
    /// An error stops the engine
    fn frame_end(&mut self, _ctx: &mut EngineContext) -> Result<(), EngineError> {
        Ok(())
    }

    /// Called once when the engine stops, before the scenes are destroyed
    fn shutdown(&mut self, _ctx: &mut EngineContext) {}
}

/// Main engine struct
pub struct Engine<G: Game, P: Platform = WindowPlatform> {
    config: EngineConfig,
    ctx: EngineContext,
    game: G,
    platform: P,
    time: Time,
    stats: FrameStats,
    canvas: SoftwareCanvas,
    started: bool,
}

impl<G: Game> Engine<G> {
    /// Create an engine that opens a desktop window
    #[must_use]
    pub fn new(config: EngineConfig, game: G) -> Self {
        Self::with_platform(config, game, WindowPlatform::new())
    }
}

impl<G: Game, P: Platform> Engine<G, P> {
    /// Create an engine on a given host platform
    #[must_use]
    pub fn with_platform(config: EngineConfig, game: G, platform: P) -> Self {
        let ctx = EngineContext::new(config.width, config.height);
        let samples = usize::try_from(config.target_fps.max(1)).unwrap_or(60);
        Self {
            time: Time::new(config.target_fps),
            stats: FrameStats::new(samples),
            canvas: SoftwareCanvas::new(config.width, config.height),
            config,
            ctx,
            game,
            platform,
            started: false,
        }
    }

    /// Open the platform, start the managers and run the game's setup
    /// hooks. A scene queued by the game (or the first scene, if none was
    /// queued) becomes active before the first frame.
    ///
    /// # Errors
    ///
    /// Returns the platform, game or scene builder error
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.started {
            return Ok(());
        }
        log::info!(
            "starting engine: title={} size={}x{} fps={}",
            self.config.title,
            self.config.width,
            self.config.height,
            self.config.target_fps
        );
        self.platform.init(&self.config)?;
        self.ctx.on_start();
        self.started = true;

        if self.config.audio {
            match AudioOutput::new() {
                Ok(audio) => self.ctx.audio = Some(audio),
                Err(err) => log::warn!("audio disabled: {err}"),
            }
        }

        self.game.init(&mut self.ctx)?;
        self.game.create_assets(&mut self.ctx)?;

        if self.ctx.scenes.active_id().is_none() && self.ctx.scenes.pending_transitions() == 0 {
            self.ctx.scenes.set_active_first();
        }
        systems::apply_pending(&mut self.ctx)
    }

    /// Run one frame. Returns `false` once a quit was requested, in which
    /// case nothing else happened this frame.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the platform, the game or a
    /// component hook
    pub fn frame(&mut self) -> Result<bool, EngineError> {
        self.time.begin_frame();
        self.ctx.begin_frame(self.time.frame(), self.time.delta());

        self.ctx.input.begin_frame();
        self.platform.pump(&mut self.ctx.input)?;
        if self.ctx.input.quit_requested() || self.ctx.should_quit() {
            log::info!("quit requested: frame={}", self.time.frame());
            return Ok(false);
        }

        self.game.frame_start(&mut self.ctx)?;
        systems::frame_start(&mut self.ctx)?;
        systems::update(&mut self.ctx)?;
        systems::after_update(&mut self.ctx)?;
        self.ctx.cursor.on_after_update(&mut self.platform);

        self.canvas.set_draw_color(self.config.clear_color);
        self.canvas.clear();
        systems::render(&self.ctx, &mut self.canvas);
        self.platform.present(&self.canvas)?;

        systems::frame_end(&mut self.ctx)?;
        self.game.frame_end(&mut self.ctx)?;

        if let Some(audio) = self.ctx.audio.as_mut() {
            audio.update(self.time.delta());
        }
        self.stats.record_frame(self.time.elapsed(), self.time.budget());
        if self.stats.total_frames() % u64::from(self.config.target_fps.max(60)) == 0 {
            log::debug!("frame stats: {}", self.stats.format_stats());
        }
        Ok(true)
    }

    /// Install the logger, start, and run frames until a quit is requested,
    /// sleeping after each frame to hold the frame budget
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the loop, after logging it
    pub fn run(&mut self) -> Result<(), EngineError> {
        init_logging(&self.config.log)?;

        let result = self.run_frames();
        if let Err(err) = &result {
            log::error!("engine stopped: {err}");
        }
        let stopped = self.shutdown();
        if let Err(err) = &stopped {
            log::error!("shutdown failed: {err}");
        }
        result.and(stopped)
    }

    fn run_frames(&mut self) -> Result<(), EngineError> {
        self.start()?;
        while self.frame()? {
            self.time.sleep_remaining();
        }
        Ok(())
    }

    /// Destroy the remaining scenes and release the audio output
    ///
    /// # Errors
    ///
    /// Returns the first destroy hook error
    pub fn shutdown(&mut self) -> Result<(), EngineError> {
        if !self.started {
            return Ok(());
        }
        self.started = false;
        self.game.shutdown(&mut self.ctx);
        let result = systems::shutdown(&mut self.ctx);
        if let Some(audio) = self.ctx.audio.as_mut() {
            audio.halt_all();
        }
        log::info!("engine stopped: {}", self.stats.format_stats());
        result
    }

    /// Engine configuration
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Managers
    #[must_use]
    pub const fn context(&self) -> &EngineContext {
        &self.ctx
    }

    /// Managers, mutably
    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.ctx
    }

    /// Host platform
    #[must_use]
    pub const fn platform(&self) -> &P {
        &self.platform
    }

    /// Game hooks
    #[must_use]
    pub const fn game(&self) -> &G {
        &self.game
    }

    /// Game hooks, mutably
    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    /// Canvas the last frame was drawn on
    #[must_use]
    pub const fn canvas(&self) -> &SoftwareCanvas {
        &self.canvas
    }

    /// Frame statistics
    #[must_use]
    pub const fn stats(&self) -> &FrameStats {
        &self.stats
    }
}

impl<G: Game, P: Platform> std::fmt::Debug for Engine<G, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("frame", &self.time.frame())
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Shape;
    use crate::ecs::Entity;
    use crate::math::Vector;
    use crate::platform::HeadlessPlatform;
    use crate::scene::Scene;

    #[derive(Default)]
    struct Counter {
        inits: u32,
        starts: u32,
        ends: u32,
        stopped: bool,
    }

    impl Game for Counter {
        fn init(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
            self.inits += 1;
            let scene = Scene::new("only").with_builder(|ctx, id| {
                let block = Entity::new("block")
                    .with_position(Vector::new(2.0, 2.0))
                    .with_dim(Vector::new(4.0, 4.0))
                    .with_component(Shape::new().with_color(Color::RED))?;
                if let Some(scene) = ctx.scenes.scene_mut(id) {
                    scene.add_entity(block);
                }
                Ok(())
            });
            ctx.scenes.add_scene(scene);
            Ok(())
        }

        fn frame_start(&mut self, _ctx: &mut EngineContext) -> Result<(), EngineError> {
            self.starts += 1;
            Ok(())
        }

        fn frame_end(&mut self, _ctx: &mut EngineContext) -> Result<(), EngineError> {
            self.ends += 1;
            Ok(())
        }

        fn shutdown(&mut self, _ctx: &mut EngineContext) {
            self.stopped = true;
        }
    }

    fn headless(frames: u64) -> Engine<Counter, HeadlessPlatform> {
        let config = EngineConfig::default().with_size(16, 16).with_target_fps(0);
        Engine::with_platform(config, Counter::default(), HeadlessPlatform::new().with_quit_after(frames))
    }

    #[test]
    fn test_config_from_ron_keeps_defaults() {
        let config = EngineConfig::from_ron_str("(title: \"pong\", width: 320, target_fps: 60)").unwrap();
        assert_eq!(config.title, "pong");
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 600);
        assert_eq!(config.target_fps, 60);
        assert!(!config.audio);
    }

    #[test]
    fn test_config_errors() {
        let err = EngineConfig::from_ron_str("(width: \"wide\")").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));

        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load_ron(dir.path().join("missing.ron")).unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.ron");
        let config = EngineConfig::default().with_title("demo").with_log_file("logs/demo.log");
        std::fs::write(&path, ron::to_string(&config).unwrap()).unwrap();

        assert_eq!(EngineConfig::load_ron(&path).unwrap(), config);
    }

    #[test]
    fn test_start_activates_first_scene() {
        let mut engine = headless(1);
        engine.start().unwrap();

        let active = engine.context().active_scene().unwrap();
        assert_eq!(active.name(), "only");
        assert_eq!(active.loaded().len(), 1);
        assert_eq!(engine.game().inits, 1);
    }

    #[test]
    fn test_run_stops_after_quit() {
        let mut engine = headless(3);
        engine.run().unwrap();

        assert_eq!(engine.platform().presented(), 3);
        assert_eq!(engine.game().starts, 3);
        assert_eq!(engine.game().ends, 3);
        assert!(engine.game().stopped);
        assert!(engine.context().active_scene().is_none());
        assert_eq!(engine.stats().total_frames(), 3);
    }

    #[test]
    fn test_frame_renders_active_scene() {
        let mut engine = headless(10);
        engine.start().unwrap();
        assert!(engine.frame().unwrap());

        let frame = engine.platform().last_frame().unwrap();
        assert_eq!(frame.get_pixel(3, 3).0, Color::RED.to_array());
        assert_eq!(frame.get_pixel(10, 10).0, Color::BLACK.to_array());
    }

    #[test]
    fn test_context_quit_ends_loop() {
        let mut engine = headless(100);
        engine.start().unwrap();
        assert!(engine.frame().unwrap());

        engine.context_mut().quit();
        assert!(!engine.frame().unwrap());
    }
}
