//! The trampoline.
//!
//! [`Executor::run`] is the only driver of a trigger graph: it walks one node
//! at a time in a loop, so neither long scripts nor many loop iterations
//! grow the native stack. Faults raised by element code (errors, and panics
//! when [`ExecutorConfig::catch_panics`] is set) end that one execution and
//! are logged against the node's source text.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{error, trace};
use trellis_foundation::{Context, Error, ErrorContext, Result};

use crate::graph::{NodeId, Trigger, Walk};
use crate::scheduler::{Continuation, Scheduler, mark_suspended};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the executor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Maximum nodes walked by one run before it is aborted. `None` means no
    /// limit.
    pub max_steps: Option<u64>,

    /// Catch panics raised by element code and treat them as faults.
    pub catch_panics: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_steps: Some(10_000_000),
            catch_panics: true,
        }
    }
}

impl ExecutorConfig {
    /// Creates a configuration without a step limit.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            max_steps: None,
            ..Self::default()
        }
    }

    /// Builder method to set the step limit.
    #[must_use]
    pub fn with_max_steps(mut self, max: u64) -> Self {
        self.max_steps = Some(max);
        self
    }

    /// Builder method to enable/disable panic catching.
    #[must_use]
    pub fn with_catch_panics(mut self, catch: bool) -> Self {
        self.catch_panics = catch;
        self
    }
}

// =============================================================================
// Executor
// =============================================================================

/// Runs triggers.
#[derive(Clone)]
pub struct Executor {
    config: ExecutorConfig,
    scheduler: Arc<dyn Scheduler>,
}

impl Executor {
    /// Creates an executor with the default configuration.
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_config(scheduler, ExecutorConfig::default())
    }

    /// Creates an executor with an explicit configuration.
    pub fn with_config(scheduler: Arc<dyn Scheduler>, config: ExecutorConfig) -> Self {
        Self { config, scheduler }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Runs `trigger` from its first statement. Returns false if the
    /// execution faulted; the fault has already been logged.
    ///
    /// The event guard is not consulted; that is the dispatcher's job.
    pub fn execute(&self, trigger: &Arc<Trigger>, ctx: &Context) -> bool {
        self.run(trigger, trigger.first(), ctx)
    }

    /// Walks from `start` until the chain ends, a delay suspends it, or a
    /// node faults.
    pub fn run(&self, trigger: &Arc<Trigger>, start: Option<NodeId>, ctx: &Context) -> bool {
        let mut current = start;
        let mut steps: u64 = 0;
        while let Some(id) = current {
            steps += 1;
            if let Some(max) = self.config.max_steps {
                if steps > max {
                    self.fault(trigger, id, ctx, Error::step_limit(max));
                    return false;
                }
            }
            match self.step(trigger, id, ctx) {
                Ok(Walk::Next(next)) => current = next,
                Ok(Walk::Suspend { after, resume }) => {
                    mark_suspended(ctx);
                    if let Some(resume) = resume {
                        trace!(
                            source = %trigger.source(),
                            node = %resume,
                            context = ctx.id().get(),
                            delay = ?after,
                            "suspending execution"
                        );
                        let continuation =
                            Continuation::new(self.clone(), Arc::clone(trigger), resume, ctx.clone());
                        self.scheduler.schedule_after(after, continuation);
                    }
                    return true;
                }
                Err(e) => {
                    self.fault(trigger, id, ctx, e);
                    return false;
                }
            }
        }
        // A guard or an empty delay can end the run inside a loop.
        trigger.cursors().clear_context(ctx.id());
        true
    }

    fn step(&self, trigger: &Trigger, id: NodeId, ctx: &Context) -> Result<Walk> {
        if !self.config.catch_panics {
            return trigger.walk(id, ctx);
        }
        catch_unwind(AssertUnwindSafe(|| trigger.walk(id, ctx)))
            .unwrap_or_else(|payload| Err(Error::panicked(panic_message(&*payload))))
    }

    fn fault(&self, trigger: &Trigger, id: NodeId, ctx: &Context, e: Error) {
        trigger.cursors().clear_context(ctx.id());
        let (line, text) = trigger
            .node(id)
            .map_or((trigger.line(), trigger.text()), |n| (n.line(), n.text()));
        let e = e.with_context(
            ErrorContext::new()
                .with_source(trigger.source())
                .with_line(line)
                .with_node(text),
        );
        error!(
            source = %trigger.source(),
            line = line,
            node = %text,
            error = %e,
            "execution aborted"
        );
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
