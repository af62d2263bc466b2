//! Suspension and resumption.
//!
//! A delay statement ends the current trampoline run and hands a
//! [`Continuation`] (the node to resume at plus the context) to the host's
//! [`Scheduler`]. When the scheduler calls [`Continuation::resume`], a fresh
//! trampoline run picks up where the delay left off.
//!
//! Every context that has ever been suspended is remembered in a
//! process-wide set of weak references, so elements that must not act on
//! the original occurrence after a delay can tell.
//!
//! A scheduled continuation cannot be cancelled. It keeps its context alive
//! until the scheduler runs or drops it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::trace;
use trellis_foundation::{Context, ContextId, WeakContext};

use crate::executor::Executor;
use crate::graph::{NodeId, Trigger};

/// Runs continuations after a delay.
pub trait Scheduler: Send + Sync {
    /// Arranges for `continuation` to be resumed once `after` has elapsed.
    fn schedule_after(&self, after: Duration, continuation: Continuation);
}

/// The remainder of a suspended execution.
pub struct Continuation {
    executor: Executor,
    trigger: Arc<Trigger>,
    node: NodeId,
    ctx: Context,
}

impl Continuation {
    pub(crate) fn new(executor: Executor, trigger: Arc<Trigger>, node: NodeId, ctx: Context) -> Self {
        Self {
            executor,
            trigger,
            node,
            ctx,
        }
    }

    /// The suspended context.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The trigger being executed.
    #[must_use]
    pub fn trigger(&self) -> &Arc<Trigger> {
        &self.trigger
    }

    /// The node execution resumes at.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Runs the rest of the execution. Consuming `self` makes this happen at
    /// most once. Returns false if the execution faulted.
    pub fn resume(self) -> bool {
        trace!(
            source = %self.trigger.source(),
            node = %self.node,
            context = self.ctx.id().get(),
            "resuming execution"
        );
        self.executor.run(&self.trigger, Some(self.node), &self.ctx)
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("trigger", &self.trigger.text())
            .field("node", &self.node)
            .field("context", &self.ctx.id())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Suspended contexts
// =============================================================================

static SUSPENDED: Lazy<Mutex<HashMap<ContextId, WeakContext>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

pub(crate) fn mark_suspended(ctx: &Context) {
    let mut set = SUSPENDED.lock();
    set.retain(|_, weak| weak.is_alive());
    set.insert(ctx.id(), ctx.downgrade());
}

/// True if an execution in `ctx` has been suspended by a delay.
#[must_use]
pub fn is_suspended(ctx: &Context) -> bool {
    SUSPENDED
        .lock()
        .get(&ctx.id())
        .is_some_and(WeakContext::is_alive)
}

/// Number of live contexts that have been suspended.
#[must_use]
pub fn suspended_count() -> usize {
    let mut set = SUSPENDED.lock();
    set.retain(|_, weak| weak.is_alive());
    set.len()
}
