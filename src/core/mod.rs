//! Core engine module
//!
//! Object identity, errors, logging, frame timing, event pools, the
//! [`EngineContext`] holding every manager, and the [`Engine`] loop.

mod context;
mod debug;
mod engine;
mod error;
mod events;
mod logging;
mod object;
mod time;

#[cfg(test)]
mod scenarios;

pub use context::EngineContext;
pub use debug::FrameStats;
pub use engine::{Engine, EngineConfig, Game};
pub use error::{AssetError, AssetPhase, EngineError};
pub use events::{AnyPayload, Event, EventManager, EventPool};
pub use logging::{LogConfig, init_logging, open_log_file};
pub use object::{EntityId, Object, ObjectId, SceneId};
pub use time::Time;
