//! Execution contexts and the occurrences that trigger them.
//!
//! A [`Context`] is the opaque handle threaded through every interpreter call
//! of one execution pass. The interpreter only ever uses its identity; the
//! [`Event`] and local variables inside are for syntax elements and stores.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use im::OrdMap;
use parking_lot::{Mutex, MutexGuard};

use crate::name::VariableName;
use crate::value::Value;

/// Local variables of one execution.
pub type Locals = OrdMap<VariableName, Value>;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

// =============================================================================
// Event
// =============================================================================

/// An occurrence delivered by the host application.
#[derive(Debug)]
pub struct Event {
    name: Arc<str>,
    payload: Option<Value>,
    cancelled: AtomicBool,
}

impl Event {
    /// Creates an event with no payload.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            payload: None,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Attaches a payload.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Returns the event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the payload, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Returns whether the host should treat this occurrence as cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Sets the cancellation flag.
    pub fn set_cancelled(&self, cancelled: bool) {
        self.cancelled.store(cancelled, Ordering::Release);
    }
}

// =============================================================================
// Context
// =============================================================================

/// Unique identity of a context.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct ContextInner {
    id: ContextId,
    event: Arc<Event>,
    locals: Mutex<Locals>,
}

/// Handle to one execution pass.
///
/// Cloning is cheap and yields the same context; equality is identity.
#[derive(Clone, Debug)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// Creates a fresh context for an occurrence.
    #[must_use]
    pub fn new(event: Arc<Event>) -> Self {
        let id = ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            inner: Arc::new(ContextInner {
                id,
                event,
                locals: Mutex::new(Locals::new()),
            }),
        }
    }

    /// Creates a context for an event with the given name and no payload.
    #[must_use]
    pub fn for_event(name: &str) -> Self {
        Self::new(Arc::new(Event::new(name)))
    }

    /// Returns the identity of this context.
    #[must_use]
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    /// Returns the triggering occurrence.
    #[must_use]
    pub fn event(&self) -> &Arc<Event> {
        &self.inner.event
    }

    /// Locks the local variable table.
    pub fn locals(&self) -> MutexGuard<'_, Locals> {
        self.inner.locals.lock()
    }

    /// Creates a weak reference that does not keep the context alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakContext {
        WeakContext {
            id: self.inner.id,
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Context {}

/// A weak reference to a [`Context`].
#[derive(Clone, Debug)]
pub struct WeakContext {
    id: ContextId,
    inner: Weak<ContextInner>,
}

impl WeakContext {
    /// Returns the identity of the referenced context.
    #[must_use]
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Returns true while some strong handle to the context exists.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Upgrades to a strong handle if the context is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Context> {
        self.inner.upgrade().map(|inner| Context { inner })
    }
}
