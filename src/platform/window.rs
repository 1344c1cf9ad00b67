//! Desktop window platform
//!
//! Runs a winit event loop in pump mode, so the engine keeps control of its
//! own frame loop, and presents the software canvas through a wgpu
//! [`Presenter`].

use std::sync::Arc;
use std::time::Duration;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{CursorIcon, Window, WindowId},
};

use crate::core::{EngineConfig, EngineError};
use crate::input::{CursorShape, CursorSink, Input, InputEvent};
use crate::math::Vector;
use crate::renderer::{Presenter, SoftwareCanvas};

use super::Platform;

/// Pump attempts while waiting for the window to appear
const OPEN_ATTEMPTS: usize = 100;

/// Window state driven by winit callbacks
#[derive(Default)]
struct WindowState {
    title: String,
    canvas_size: (u32, u32),
    vsync: bool,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    size: (u32, u32),
    events: Vec<InputEvent>,
    error: Option<EngineError>,
}

impl WindowState {
    fn open(&mut self, event_loop: &ActiveEventLoop) -> Result<(), EngineError> {
        let (width, height) = self.canvas_size;
        let attributes = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(PhysicalSize::new(width, height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|e| EngineError::Platform(format!("window: {e}")))?,
        );

        let presenter = pollster::block_on(Presenter::new(
            Arc::clone(&window),
            self.vsync,
            self.canvas_size,
        ))?;
        let size = window.inner_size();
        self.size = (size.width, size.height);
        self.presenter = Some(presenter);
        self.window = Some(window);
        log::info!("window opened: title={} size={}x{}", self.title, size.width, size.height);
        Ok(())
    }

    /// Window position to canvas position
    fn to_canvas(&self, x: f64, y: f64) -> Vector {
        let (cw, ch) = self.canvas_size;
        let (ww, wh) = self.size;
        if ww == 0 || wh == 0 {
            return Vector::new(x, y);
        }
        Vector::new(x * f64::from(cw) / f64::from(ww), y * f64::from(ch) / f64::from(wh))
    }
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.open(event_loop) {
            self.error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested");
                self.events.push(InputEvent::Quit);
            }

            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    self.size = (size.width, size.height);
                    if let Some(presenter) = &mut self.presenter {
                        presenter.resize(size.width, size.height);
                    }
                    self.events.push(InputEvent::Resized {
                        width: size.width,
                        height: size.height,
                    });
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.repeat {
                    return;
                }
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.events.push(InputEvent::Key {
                        code,
                        pressed: event.state == ElementState::Pressed,
                    });
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                self.events.push(InputEvent::Button {
                    button,
                    pressed: state == ElementState::Pressed,
                });
            }

            WindowEvent::CursorMoved { position, .. } => {
                let position = self.to_canvas(position.x, position.y);
                self.events.push(InputEvent::MouseMoved(position));
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vector::new(f64::from(x), f64::from(y)),
                    MouseScrollDelta::PixelDelta(pos) => Vector::new(pos.x, pos.y),
                };
                self.events.push(InputEvent::Scroll(scroll));
            }

            _ => {}
        }
    }
}

/// Platform backed by a desktop window
pub struct WindowPlatform {
    event_loop: Option<EventLoop<()>>,
    state: WindowState,
}

impl WindowPlatform {
    /// Create an unopened platform; the window appears in [`Platform::init`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            event_loop: None,
            state: WindowState::default(),
        }
    }

    fn pump_once(&mut self) -> Result<PumpStatus, EngineError> {
        let event_loop = self
            .event_loop
            .as_mut()
            .ok_or_else(|| EngineError::Platform("window platform not initialised".into()))?;
        let status = event_loop.pump_app_events(Some(Duration::ZERO), &mut self.state);
        match self.state.error.take() {
            Some(err) => Err(err),
            None => Ok(status),
        }
    }
}

impl Default for WindowPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for WindowPlatform {
    fn init(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        let event_loop =
            EventLoop::new().map_err(|e| EngineError::Platform(format!("event loop: {e}")))?;
        event_loop.set_control_flow(ControlFlow::Poll);
        self.event_loop = Some(event_loop);
        self.state.title.clone_from(&config.title);
        self.state.canvas_size = (config.width, config.height);
        self.state.size = (config.width, config.height);
        self.state.vsync = config.vsync;

        for _ in 0..OPEN_ATTEMPTS {
            if let PumpStatus::Exit(code) = self.pump_once()? {
                return Err(EngineError::Platform(format!("event loop exited early: code={code}")));
            }
            if self.state.window.is_some() {
                return Ok(());
            }
        }
        Err(EngineError::Platform("window did not open".into()))
    }

    fn pump(&mut self, input: &mut Input) -> Result<(), EngineError> {
        if let PumpStatus::Exit(_) = self.pump_once()? {
            self.state.events.push(InputEvent::Quit);
        }
        for event in self.state.events.drain(..) {
            input.apply(event);
        }
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        self.state.size
    }

    fn present(&mut self, canvas: &SoftwareCanvas) -> Result<(), EngineError> {
        match &mut self.state.presenter {
            Some(presenter) => presenter.present(canvas),
            None => Err(EngineError::Platform("no window to present on".into())),
        }
    }
}

impl CursorSink for WindowPlatform {
    fn set_cursor(&mut self, shape: CursorShape) {
        let icon = match shape {
            CursorShape::Arrow => CursorIcon::Default,
            CursorShape::Hand => CursorIcon::Pointer,
            CursorShape::Text => CursorIcon::Text,
            CursorShape::Crosshair => CursorIcon::Crosshair,
            CursorShape::Wait => CursorIcon::Wait,
            CursorShape::Move => CursorIcon::Move,
            CursorShape::NotAllowed => CursorIcon::NotAllowed,
        };
        if let Some(window) = &self.state.window {
            window.set_cursor(icon);
        }
    }
}

impl std::fmt::Debug for WindowPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowPlatform")
            .field("title", &self.state.title)
            .field("size", &self.state.size)
            .field("open", &self.state.window.is_some())
            .finish()
    }
}
