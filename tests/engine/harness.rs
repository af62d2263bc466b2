//! A loader and executor over the standard elements, with a scheduler that
//! holds continuations until a test resumes them.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use trellis_engine::{Continuation, Executor, ExecutorConfig, Scheduler, Script, ScriptLoader};
use trellis_foundation::{Context, Event, Result};
use trellis_parser::{Effect, RegistryBuilder, SyntaxParser};
use trellis_stdlib::Outbox;
use trellis_storage::MemoryStore;

// =============================================================================
// Scheduler
// =============================================================================

#[derive(Default)]
pub struct Held(pub Mutex<VecDeque<(Duration, Continuation)>>);

impl Scheduler for Held {
    fn schedule_after(&self, after: Duration, continuation: Continuation) {
        self.0.lock().push_back((after, continuation));
    }
}

// =============================================================================
// Elements
// =============================================================================

#[derive(Debug)]
struct Explode;

impl Effect for Explode {
    fn execute(&self, _ctx: &Context) -> Result<()> {
        panic!("exploded on purpose")
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub loader: ScriptLoader,
    pub executor: Executor,
    pub held: Arc<Held>,
    pub outbox: Outbox,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ExecutorConfig::default())
    }

    pub fn with_config(config: ExecutorConfig) -> Self {
        let outbox = Outbox::new();
        let store = Arc::new(MemoryStore::new());
        let mut builder = RegistryBuilder::new();
        trellis_stdlib::register(&mut builder, &outbox).unwrap();
        builder
            .register_effect(&["explode"], |_| Ok(Box::new(Explode)))
            .unwrap();
        let parser = SyntaxParser::new(Arc::new(builder.build()), store.clone());
        let held = Arc::new(Held::default());
        Self {
            loader: ScriptLoader::new(parser).unwrap(),
            executor: Executor::with_config(held.clone(), config),
            held,
            outbox,
            store,
        }
    }

    /// Loads a script that must load without errors.
    pub fn load(&self, text: &str) -> Script {
        let script = self.loader.load("test.sk", text);
        assert!(script.is_clean(), "unexpected load errors: {:?}", script.errors());
        script
    }

    /// Runs every trigger that accepts `event`, each in a fresh context.
    pub fn fire(&self, script: &Script, event: Event) -> Vec<bool> {
        let event = Arc::new(event);
        script
            .triggers()
            .iter()
            .filter(|t| t.accepts(&event))
            .map(|t| self.executor.execute(t, &Context::new(Arc::clone(&event))))
            .collect()
    }

    /// Resumes the oldest held continuation.
    pub fn resume_next(&self) -> Option<bool> {
        let next = self.held.0.lock().pop_front();
        next.map(|(_, continuation)| continuation.resume())
    }

    /// Resumes held continuations until none are left.
    pub fn resume_all(&self) {
        while self.resume_next().is_some() {}
    }

    pub fn pending(&self) -> usize {
        self.held.0.lock().len()
    }

    pub fn take(&self) -> Vec<String> {
        self.outbox.take()
    }
}

/// Indents every line of a script body under `on load:`.
pub fn on_load(body: &str) -> String {
    let mut text = String::from("on load:\n");
    for line in body.lines() {
        text.push_str("    ");
        text.push_str(line);
        text.push('\n');
    }
    text
}
