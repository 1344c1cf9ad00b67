//! Delegates, registers and type-erased callbacks

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::core::{EngineContext, EngineError, EntityId, Object, ObjectId};
use crate::ecs::ComponentType;

/// ID of a delegate channel
pub type DelegateId = ObjectId;

/// ID of a register (subscription)
pub type RegisterId = ObjectId;

/// Typed handle to a delegate channel publishing payloads of type `P`
pub struct Delegate<P> {
    id: DelegateId,
    _payload: PhantomData<fn(&P)>,
}

impl<P> Delegate<P> {
    pub(crate) const fn from_id(id: DelegateId) -> Self {
        Self {
            id,
            _payload: PhantomData,
        }
    }

    /// Delegate ID
    #[must_use]
    pub const fn id(&self) -> DelegateId {
        self.id
    }
}

impl<P> Clone for Delegate<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for Delegate<P> {}

impl<P> PartialEq for Delegate<P> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<P> Eq for Delegate<P> {}

impl<P> fmt::Debug for Delegate<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Delegate<{}>({})", std::any::type_name::<P>(), self.id)
    }
}

/// Callback with its payload type erased
pub trait ErasedCallback {
    /// Invoke with a payload. Payloads of the wrong type are ignored.
    fn call(&mut self, ctx: &mut EngineContext, payload: &dyn Any) -> Result<(), EngineError>;
}

struct TypedCallback<P, F> {
    callback: F,
    _payload: PhantomData<fn(&P)>,
}

impl<P, F> ErasedCallback for TypedCallback<P, F>
where
    P: 'static,
    F: FnMut(&mut EngineContext, &P) -> Result<(), EngineError>,
{
    fn call(&mut self, ctx: &mut EngineContext, payload: &dyn Any) -> Result<(), EngineError> {
        match payload.downcast_ref::<P>() {
            Some(payload) => (self.callback)(ctx, payload),
            None => Ok(()),
        }
    }
}

/// Box a typed callback
pub fn erase_callback<P, F>(callback: F) -> Box<dyn ErasedCallback>
where
    P: 'static,
    F: FnMut(&mut EngineContext, &P) -> Result<(), EngineError> + 'static,
{
    Box::new(TypedCallback {
        callback,
        _payload: PhantomData,
    })
}

/// A callback kept by its declaring component and lent to every register
/// made from the declaration.
#[derive(Clone)]
pub struct SharedCallback(Rc<RefCell<Box<dyn ErasedCallback>>>);

impl SharedCallback {
    /// Share a boxed callback
    #[must_use]
    pub fn new(callback: Box<dyn ErasedCallback>) -> Self {
        Self(Rc::new(RefCell::new(callback)))
    }
}

impl ErasedCallback for SharedCallback {
    fn call(&mut self, ctx: &mut EngineContext, payload: &dyn Any) -> Result<(), EngineError> {
        // Busy: the same declaration is already running higher up the stack
        match self.0.try_borrow_mut() {
            Ok(mut callback) => callback.call(ctx, payload),
            Err(_) => Ok(()),
        }
    }
}

impl fmt::Debug for SharedCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedCallback").field(&Rc::strong_count(&self.0)).finish()
    }
}

/// A named channel, `<publisher>/<event>`
#[derive(Debug)]
pub struct DelegateEntry {
    pub(crate) object: Object,
    pub(crate) publisher: ObjectId,
    pub(crate) payload: TypeId,
    pub(crate) payload_name: &'static str,
}

impl DelegateEntry {
    /// Delegate ID
    #[must_use]
    pub const fn id(&self) -> DelegateId {
        self.object.id()
    }

    /// Channel name
    #[must_use]
    pub fn name(&self) -> &str {
        self.object.name()
    }

    /// Object that created the channel
    #[must_use]
    pub const fn publisher(&self) -> ObjectId {
        self.publisher
    }

    /// Name of the payload type
    #[must_use]
    pub const fn payload_name(&self) -> &'static str {
        self.payload_name
    }
}

/// What a pending register is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTarget {
    /// Entity hosting the publisher, or `None` for the subscriber's own entity
    pub entity: Option<EntityId>,
    /// Type of the publishing component
    pub component: ComponentType,
}

/// A single subscription
pub struct RegisterEntry {
    pub(crate) object: Object,
    pub(crate) subscriber: ObjectId,
    pub(crate) delegate: Option<DelegateId>,
    pub(crate) target: Option<PendingTarget>,
    pub(crate) payload: TypeId,
    pub(crate) payload_name: &'static str,
    pub(crate) callback: Option<Box<dyn ErasedCallback>>,
}

impl RegisterEntry {
    /// Register ID
    #[must_use]
    pub const fn id(&self) -> RegisterId {
        self.object.id()
    }

    /// Subscribing object
    #[must_use]
    pub const fn subscriber(&self) -> ObjectId {
        self.subscriber
    }

    /// Target delegate, `None` while pending
    #[must_use]
    pub const fn delegate(&self) -> Option<DelegateId> {
        self.delegate
    }

    /// Whether the register still waits for its delegate
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.delegate.is_none()
    }

    /// Resolution target of a pending register
    #[must_use]
    pub const fn target(&self) -> Option<PendingTarget> {
        self.target
    }
}

impl fmt::Debug for RegisterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterEntry")
            .field("id", &self.object.id())
            .field("subscriber", &self.subscriber)
            .field("delegate", &self.delegate)
            .field("target", &self.target)
            .field("payload", &self.payload_name)
            .finish_non_exhaustive()
    }
}
