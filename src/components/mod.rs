//! Concrete components
//!
//! Ready-made users of the core: collision shapes, a velocity integrator,
//! timers, out-of-bounds detection, drawing, text, sound and hover cursors.
//! Each is registered by name in the [`ComponentRegistry`] so entities can
//! be assembled from data bags.

mod body;
mod bounds;
mod collider;
mod hover;
mod shape;
mod sound;
mod sprite;
mod text;
mod timer;

pub use body::Body;
pub use bounds::OutOfBounds;
pub use collider::Collider;
pub use hover::Hover;
pub use shape::Shape;
pub use sound::SoundPlayer;
pub use sprite::Sprite;
pub use text::Text;
pub use timer::{Timer, TimerEvent};

use serde::de::DeserializeOwned;

use crate::core::EngineError;
use crate::ecs::{ComponentRegistry, DataBag};

/// Register every component of this module under its type name
pub fn register_builtin(registry: &mut ComponentRegistry) {
    registry.register("Collider", Collider::new);
    registry.register("Body", Body::new);
    registry.register("Timer", || Timer::new(1));
    registry.register("OutOfBounds", OutOfBounds::new);
    registry.register("Shape", Shape::new);
    registry.register("Sprite", || Sprite::new(""));
    registry.register("Text", || Text::new("", ""));
    registry.register("SoundPlayer", || SoundPlayer::new(""));
    registry.register("Hover", Hover::new);
}

/// Read an optional typed field from a data bag
pub(crate) fn field<T: DeserializeOwned>(data: &DataBag, key: &str) -> Result<Option<T>, EngineError> {
    data.get(key)
        .map(|value| {
            serde_json::from_value(value.clone())
                .map_err(|e| EngineError::ComponentData(format!("{key}: {e}")))
        })
        .transpose()
}
