//! Delegate registry and dispatch
//!
//! The [`DelegateManager`] stores channels and subscriptions. Dispatching
//! needs the whole [`EngineContext`] (callbacks receive it mutably), so the
//! dispatch entry points are free functions taking the context: each
//! callback is taken out of its register for the duration of the call and
//! put back afterwards.

use std::any::{Any, TypeId};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::core::{EngineContext, EngineError, Object, ObjectId};

use super::channel::{
    Delegate, DelegateEntry, DelegateId, ErasedCallback, PendingTarget, RegisterEntry, RegisterId,
    erase_callback,
};

/// A deferred invocation of one register
struct Delivery {
    register: RegisterId,
    payload: Rc<dyn Any>,
}

/// Registry of delegate channels and their subscriptions
pub struct DelegateManager {
    object: Object,
    delegates: Vec<DelegateEntry>,
    registers: Vec<RegisterEntry>,
    queue: VecDeque<Delivery>,
}

impl DelegateManager {
    /// Create an empty bus
    #[must_use]
    pub fn new() -> Self {
        Self {
            object: Object::new("delegate-manager"),
            delegates: Vec::new(),
            registers: Vec::new(),
            queue: VecDeque::new(),
        }
    }

    /// Called once by the engine after construction
    pub fn on_start(&mut self) {
        log::debug!("{} started delegates={}", self.object, self.delegates.len());
    }

    /// Create a channel named `<publisher>/<event>`
    pub fn create<P: 'static>(&mut self, publisher: &Object, event: &str) -> Delegate<P> {
        let entry = DelegateEntry {
            object: Object::new(format!("{}/{event}", publisher.name())),
            publisher: publisher.id(),
            payload: TypeId::of::<P>(),
            payload_name: std::any::type_name::<P>(),
        };
        let id = entry.id();
        log::trace!("delegate created: name={} id={id}", entry.name());
        self.delegates.push(entry);
        Delegate::from_id(id)
    }

    /// Remove a channel and every register targeting it
    pub fn delete(&mut self, id: DelegateId) -> bool {
        let Some(index) = self.delegates.iter().position(|d| d.id() == id) else {
            return false;
        };
        let entry = self.delegates.remove(index);
        let before = self.registers.len();
        self.registers.retain(|r| r.delegate != Some(id));
        log::trace!(
            "delegate deleted: name={} registers_removed={}",
            entry.name(),
            before - self.registers.len()
        );
        true
    }

    /// Look up a channel
    #[must_use]
    pub fn delegate(&self, id: DelegateId) -> Option<&DelegateEntry> {
        self.delegates.iter().find(|d| d.id() == id)
    }

    /// Look up a channel by name
    #[must_use]
    pub fn delegate_by_name(&self, name: &str) -> Option<&DelegateEntry> {
        self.delegates.iter().find(|d| d.name() == name)
    }

    /// Typed handle to a channel, if it exists and publishes `P`
    #[must_use]
    pub fn find<P: 'static>(&self, name: &str) -> Option<Delegate<P>> {
        self.delegate_by_name(name)
            .filter(|d| d.payload == TypeId::of::<P>())
            .map(|d| Delegate::from_id(d.id()))
    }

    /// Whether a channel exists
    #[must_use]
    pub fn contains(&self, id: DelegateId) -> bool {
        self.delegate(id).is_some()
    }

    /// Channels owned by a publisher
    pub fn delegates_of(&self, publisher: ObjectId) -> impl Iterator<Item = &DelegateEntry> {
        self.delegates.iter().filter(move |d| d.publisher == publisher)
    }

    /// Subscribe to a channel
    pub fn register<P, F>(
        &mut self,
        subscriber: ObjectId,
        delegate: Delegate<P>,
        callback: F,
    ) -> RegisterId
    where
        P: 'static,
        F: FnMut(&mut EngineContext, &P) -> Result<(), EngineError> + 'static,
    {
        if !self.contains(delegate.id()) {
            log::debug!("register on missing delegate: delegate={} subscriber={subscriber}", delegate.id());
        }
        self.push_register(
            subscriber,
            Some(delegate.id()),
            None,
            TypeId::of::<P>(),
            std::any::type_name::<P>(),
            erase_callback(callback),
        )
    }

    /// Subscribe before the publisher is known. The register receives
    /// nothing until [`resolve`](Self::resolve) binds it to a channel.
    pub fn register_pending<P, F>(
        &mut self,
        subscriber: ObjectId,
        target: PendingTarget,
        callback: F,
    ) -> RegisterId
    where
        P: 'static,
        F: FnMut(&mut EngineContext, &P) -> Result<(), EngineError> + 'static,
    {
        self.push_register(
            subscriber,
            None,
            Some(target),
            TypeId::of::<P>(),
            std::any::type_name::<P>(),
            erase_callback(callback),
        )
    }

    pub(crate) fn register_erased(
        &mut self,
        subscriber: ObjectId,
        target: PendingTarget,
        payload: TypeId,
        payload_name: &'static str,
        callback: Box<dyn ErasedCallback>,
    ) -> RegisterId {
        self.push_register(subscriber, None, Some(target), payload, payload_name, callback)
    }

    fn push_register(
        &mut self,
        subscriber: ObjectId,
        delegate: Option<DelegateId>,
        target: Option<PendingTarget>,
        payload: TypeId,
        payload_name: &'static str,
        callback: Box<dyn ErasedCallback>,
    ) -> RegisterId {
        let entry = RegisterEntry {
            object: Object::new("register"),
            subscriber,
            delegate,
            target,
            payload,
            payload_name,
            callback: Some(callback),
        };
        let id = entry.id();
        self.registers.push(entry);
        id
    }

    /// Bind a pending register to a channel.
    ///
    /// Returns `Ok(false)` if either side is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PayloadMismatch`] if the channel publishes a
    /// different payload type than the register expects
    pub fn resolve(&mut self, register: RegisterId, delegate: DelegateId) -> Result<bool, EngineError> {
        let Some(channel) = self.delegates.iter().find(|d| d.id() == delegate) else {
            return Ok(false);
        };
        let Some(entry) = self.registers.iter_mut().find(|r| r.id() == register) else {
            return Ok(false);
        };
        if entry.payload != channel.payload {
            return Err(EngineError::PayloadMismatch {
                delegate: channel.name().to_string(),
                published: channel.payload_name,
                expected: entry.payload_name,
            });
        }
        entry.delegate = Some(delegate);
        Ok(true)
    }

    /// Remove a single register. Returns false if unknown.
    pub fn deregister(&mut self, id: RegisterId) -> bool {
        match self.registers.iter().position(|r| r.id() == id) {
            Some(index) => {
                self.registers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every register of a subscriber, returning how many were removed
    pub fn deregister_subscriber(&mut self, subscriber: ObjectId) -> usize {
        let before = self.registers.len();
        self.registers.retain(|r| r.subscriber != subscriber);
        before - self.registers.len()
    }

    /// Look up a register
    #[must_use]
    pub fn register_entry(&self, id: RegisterId) -> Option<&RegisterEntry> {
        self.registers.iter().find(|r| r.id() == id)
    }

    /// Registers bound to a channel, in registration order
    pub fn registers_for(&self, delegate: DelegateId) -> impl Iterator<Item = &RegisterEntry> {
        self.registers
            .iter()
            .filter(move |r| r.delegate == Some(delegate))
    }

    /// Number of channels
    #[must_use]
    pub fn delegate_count(&self) -> usize {
        self.delegates.len()
    }

    /// Number of registers, pending ones included
    #[must_use]
    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    /// Number of deliveries waiting for the next drain
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Queue a payload for every current subscriber of a channel.
    ///
    /// Subscribers that register after this call do not receive it; those
    /// deregistered before the drain are skipped. Returns the number of
    /// deliveries queued.
    pub fn defer<P: 'static>(&mut self, delegate: Delegate<P>, payload: P) -> usize {
        let payload: Rc<dyn Any> = Rc::new(payload);
        let targets = self.targets(delegate.id());
        let count = targets.len();
        for register in targets {
            self.queue.push_back(Delivery {
                register,
                payload: Rc::clone(&payload),
            });
        }
        count
    }

    /// Drop every channel, register and queued delivery
    pub fn clear(&mut self) {
        self.delegates.clear();
        self.registers.clear();
        self.queue.clear();
    }

    fn targets(&self, delegate: DelegateId) -> Vec<RegisterId> {
        self.registers_for(delegate).map(RegisterEntry::id).collect()
    }

    fn take_callback(&mut self, register: RegisterId) -> Option<Box<dyn ErasedCallback>> {
        self.registers
            .iter_mut()
            .find(|r| r.id() == register)
            .and_then(|r| r.callback.take())
    }

    fn restore_callback(&mut self, register: RegisterId, callback: Box<dyn ErasedCallback>) {
        if let Some(entry) = self.registers.iter_mut().find(|r| r.id() == register) {
            entry.callback = Some(callback);
        }
    }
}

impl Default for DelegateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DelegateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateManager")
            .field("delegates", &self.delegates)
            .field("registers", &self.registers)
            .field("queued", &self.queue.len())
            .finish()
    }
}

fn invoke(ctx: &mut EngineContext, register: RegisterId, payload: &dyn Any) -> Result<(), EngineError> {
    // Missing callback: deregistered, or already running higher up the stack
    let Some(mut callback) = ctx.delegates.take_callback(register) else {
        return Ok(());
    };
    let result = callback.call(ctx, payload);
    ctx.delegates.restore_callback(register, callback);
    result
}

/// Invoke every subscriber of a channel now, in registration order
///
/// # Errors
///
/// Stops at and returns the first callback error
pub fn dispatch<P: 'static>(
    ctx: &mut EngineContext,
    delegate: Delegate<P>,
    payload: &P,
) -> Result<(), EngineError> {
    for register in ctx.delegates.targets(delegate.id()) {
        invoke(ctx, register, payload)?;
    }
    Ok(())
}

/// Deliver every deferred payload queued so far, in trigger order.
///
/// Payloads deferred by the callbacks themselves wait for the next drain.
/// Returns the number of deliveries attempted.
///
/// # Errors
///
/// Stops at and returns the first callback error
pub fn drain(ctx: &mut EngineContext) -> Result<usize, EngineError> {
    let batch = std::mem::take(&mut ctx.delegates.queue);
    let count = batch.len();
    for delivery in batch {
        invoke(ctx, delivery.register, &*delivery.payload)?;
    }
    Ok(count)
}
