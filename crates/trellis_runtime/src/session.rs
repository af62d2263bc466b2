//! A running set of scripts.
//!
//! A [`Session`] owns everything needed to load scripts and react to
//! occurrences: the registry (standard elements plus anything the host adds),
//! the variable store, the executor and a virtual clock. Each trigger that
//! accepts an occurrence runs in its own fresh context.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};
use trellis_engine::{Executor, ExecutorConfig, Script, ScriptLoader, Trigger};
use trellis_foundation::{Context, Event};
use trellis_parser::{ParserConfig, RegistryBuilder, RegistryError, SyntaxParser};
use trellis_stdlib::Outbox;
use trellis_storage::MemoryStore;

use crate::clock::ManualScheduler;

// =============================================================================
// Errors
// =============================================================================

/// Failures of the session itself. Script problems are not errors here; they
/// are reported per line on the loaded [`Script`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// A syntax could not be registered.
    #[error("registration failed: {0}")]
    Registry(#[from] RegistryError),
    /// A script file could not be read.
    #[error("can't read '{path}': {source}")]
    Io {
        /// The file.
        path: PathBuf,
        /// Why.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for a [`Session`].
#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    /// List parsing behavior.
    pub parser: ParserConfig,
    /// Step budget and panic handling.
    pub executor: ExecutorConfig,
    /// Virtual time the clock starts at.
    pub start: Duration,
}

impl SessionConfig {
    /// No step budget and no list warnings.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            parser: ParserConfig::quiet(),
            executor: ExecutorConfig::unbounded(),
            start: Duration::ZERO,
        }
    }

    /// Sets the parser configuration.
    #[must_use]
    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }

    /// Sets the executor configuration.
    #[must_use]
    pub fn with_executor(mut self, executor: ExecutorConfig) -> Self {
        self.executor = executor;
        self
    }

    /// Sets the start time of the virtual clock.
    #[must_use]
    pub fn with_start(mut self, start: Duration) -> Self {
        self.start = start;
        self
    }
}

// =============================================================================
// Session
// =============================================================================

/// What happened when an occurrence was dispatched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// Triggers that accepted the occurrence.
    pub fired: usize,
    /// Of those, how many ran to the end or to a delay without faulting.
    pub completed: usize,
    /// Whether the occurrence was cancelled once every trigger had run or
    /// suspended.
    pub cancelled: bool,
}

/// Loaded scripts plus the machinery to run them.
pub struct Session {
    loader: ScriptLoader,
    executor: Executor,
    scheduler: Arc<ManualScheduler>,
    store: Arc<MemoryStore>,
    outbox: Outbox,
    scripts: Vec<Script>,
}

impl Session {
    /// Creates a session with the standard elements.
    ///
    /// # Errors
    ///
    /// Returns an error if a standard element fails to register.
    pub fn new() -> Result<Self> {
        Self::with_config(SessionConfig::default())
    }

    /// Creates a session with the standard elements and `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a standard element fails to register.
    pub fn with_config(config: SessionConfig) -> Result<Self> {
        Self::with_registrations(config, |_| Ok(()))
    }

    /// Creates a session whose registry holds the standard elements and
    /// whatever `extra` adds after them.
    ///
    /// # Errors
    ///
    /// Returns the first rejected registration.
    pub fn with_registrations(
        config: SessionConfig,
        extra: impl FnOnce(&mut RegistryBuilder) -> std::result::Result<(), RegistryError>,
    ) -> Result<Self> {
        let outbox = Outbox::new();
        let mut builder = RegistryBuilder::new();
        trellis_stdlib::register(&mut builder, &outbox)?;
        extra(&mut builder)?;

        let store = Arc::new(MemoryStore::new());
        let parser =
            SyntaxParser::with_config(Arc::new(builder.build()), store.clone(), config.parser);
        let scheduler = Arc::new(ManualScheduler::starting_at(config.start));
        Ok(Self {
            loader: ScriptLoader::new(parser)?,
            executor: Executor::with_config(scheduler.clone(), config.executor),
            scheduler,
            store,
            outbox,
            scripts: Vec::new(),
        })
    }

    /// Loads script text. Per-line problems are on the returned script.
    pub fn load(&mut self, source: &str, text: &str) -> &Script {
        let index = self.scripts.len();
        self.scripts.push(self.loader.load(source, text));
        &self.scripts[index]
    }

    /// Loads a script file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn load_file(&mut self, path: &Path) -> Result<&Script> {
        let text = std::fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.load(&path.display().to_string(), &text))
    }

    /// Runs every trigger that accepts `event`, each in a fresh context.
    pub fn dispatch(&self, event: Event) -> Dispatch {
        let event = Arc::new(event);
        let mut dispatch = Dispatch::default();
        for trigger in self.triggers().filter(|t| t.accepts(&event)) {
            dispatch.fired += 1;
            if self.executor.execute(trigger, &Context::new(Arc::clone(&event))) {
                dispatch.completed += 1;
            }
        }
        dispatch.cancelled = event.is_cancelled();
        debug!(
            event = %event.name(),
            fired = dispatch.fired,
            completed = dispatch.completed,
            cancelled = dispatch.cancelled,
            "event dispatched"
        );
        dispatch
    }

    /// Moves the virtual clock forward, resuming delayed executions that come
    /// due. Returns how many were resumed.
    pub fn advance(&self, by: Duration) -> usize {
        let resumed = self.scheduler.advance(by);
        if resumed > 0 {
            info!(resumed = resumed, now = ?self.scheduler.now(), "clock advanced");
        }
        resumed
    }

    /// Every loaded trigger, in load order.
    pub fn triggers(&self) -> impl Iterator<Item = &Arc<Trigger>> {
        self.scripts.iter().flat_map(|s| s.triggers())
    }

    /// The loaded scripts.
    #[must_use]
    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    /// Broadcast output.
    #[must_use]
    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Global and local variables.
    #[must_use]
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// The virtual clock.
    #[must_use]
    pub fn clock(&self) -> &ManualScheduler {
        &self.scheduler
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("scripts", &self.scripts.len())
            .field("clock", &self.scheduler)
            .finish_non_exhaustive()
    }
}
