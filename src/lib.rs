//! A 2D game engine core built in Rust
//!
//! This engine provides:
//! - Scenes of entities composed of components, with a fixed frame pipeline
//! - A typed publish/subscribe delegate bus with deferred delivery
//! - Scene transitions applied at frame end, with a standby slot for swaps
//! - Bounding-box and circle collisions published as events
//! - Reference-counted image, font and sound managers
//! - Windowed presentation with winit and wgpu, or headless runs

pub mod assets;
pub mod audio;
pub mod components;
pub mod core;
pub mod delegate;
pub mod ecs;
pub mod input;
pub mod math;
pub mod platform;
pub mod renderer;
pub mod scene;

// Re-exports for convenience
pub use glam;
pub use winit;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::components::{
        Body, Collider, Hover, OutOfBounds, Shape, SoundPlayer, Sprite, Text, Timer, TimerEvent,
    };
    pub use crate::core::{
        Engine, EngineConfig, EngineContext, EngineError, EntityId, Game, SceneId,
    };
    pub use crate::delegate::{
        CollisionEvent, Delegate, DestroyEvent, LoadEvent, OutOfBoundsEvent, dispatch,
    };
    pub use crate::ecs::{Component, ComponentBase, DataBag, Entity, EntityRef};
    pub use crate::input::{CursorShape, Input, KeyCode, MouseButton};
    pub use crate::math::{Direction, Rect, Transform, Vector};
    pub use crate::platform::{HeadlessPlatform, Platform, WindowPlatform};
    pub use crate::renderer::{Canvas, Color, Flip};
    pub use crate::scene::{CollisionMode, Layer, Scene};
}
