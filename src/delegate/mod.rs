//! Publish/subscribe bus
//!
//! Channels ("delegates") are named `<publisher>/<event>` and carry one
//! payload type each. Subscriptions ("registers") either target a channel
//! directly or wait, pending, until their subscriber starts and resolves the
//! publisher by component type.
//!
//! Payloads are delivered either immediately ([`dispatch`]) or queued
//! ([`DelegateManager::defer`]) and delivered at the next [`drain`], which
//! the active scene runs once per frame after entity updates.

mod builtin;
mod channel;
mod manager;

pub use builtin::{Builtins, CollisionEvent, DestroyEvent, LoadEvent, OutOfBoundsEvent};
pub use channel::{
    Delegate, DelegateEntry, DelegateId, ErasedCallback, PendingTarget, RegisterEntry, RegisterId,
    SharedCallback, erase_callback,
};
pub use manager::{DelegateManager, dispatch, drain};
