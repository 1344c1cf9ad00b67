//! Scenes and the scene manager
//!
//! A [`Scene`] is a container of entities with its own load/unload cycle.
//! The [`SceneManager`] owns the scene list and applies queued transitions
//! at frame end. Per-frame passes over the active scene are in [`systems`].

mod collision;
mod layer;
mod manager;
#[allow(clippy::module_inception)]
mod scene;
pub mod systems;

pub use collision::{ColliderShape, CollisionMode, Contact, Volume, test_pair};
pub use layer::Layer;
pub use manager::{SceneManager, SceneTransition};
pub use scene::{Scene, SceneBuilder};
