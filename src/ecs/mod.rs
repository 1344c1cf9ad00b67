//! Entities and components
//!
//! Entities own their components as boxed trait objects. Lifecycle passes
//! that call component hooks live in [`lifecycle`] and take the engine
//! context explicitly.

mod component;
mod entity;
mod hierarchy;
pub mod lifecycle;
mod registry;

pub use component::{
    AsAny, Component, ComponentBase, ComponentType, CustomUpdate, DataBag, EntityRef,
    PendingRegister,
};
pub use entity::{ComponentSlot, Entity};
pub use hierarchy::Children;
pub use registry::ComponentRegistry;
