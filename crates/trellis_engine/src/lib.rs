//! Trigger graphs, script loading, and the trampoline executor for Trellis.
//!
//! This crate provides:
//! - [`ScriptLoader`] - Indented script text to [`Trigger`]s, with per-line errors
//! - [`Trigger`] / [`Node`] - The linked, index-addressed trigger graph
//! - [`Executor`] - The trampoline that walks a trigger one node at a time
//! - [`Scheduler`] / [`Continuation`] - Delay suspension and resumption
//! - [`LoopCursors`] - Per-context loop state shared by concurrent executions
//! - [`register_loop_expressions`] - `loop-value`, `loop-iteration`, `loop-<type>`
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use trellis_engine::{Continuation, Executor, Scheduler, ScriptLoader};
//! use trellis_foundation::Context;
//! use trellis_parser::{EventGuard, RegistryBuilder, SyntaxParser};
//! use trellis_storage::MemoryStore;
//!
//! #[derive(Debug)]
//! struct Any;
//! impl EventGuard for Any {}
//!
//! struct Never;
//! impl Scheduler for Never {
//!     fn schedule_after(&self, _after: Duration, _continuation: Continuation) {}
//! }
//!
//! let mut builder = RegistryBuilder::new();
//! builder.register_event("load", &["load"], |_| Ok(Box::new(Any))).unwrap();
//! let parser = SyntaxParser::new(Arc::new(builder.build()), Arc::new(MemoryStore::new()));
//! let loader = ScriptLoader::new(parser).unwrap();
//!
//! let script = loader.load("demo", "on load:\n    stop\n");
//! assert!(script.is_clean());
//!
//! let executor = Executor::new(Arc::new(Never));
//! let trigger = &script.triggers()[0];
//! assert!(executor.execute(trigger, &Context::for_event("load")));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod builder;
pub mod control;
pub mod cursor;
pub mod executor;
pub mod graph;
pub mod loader;
pub mod scheduler;


pub use control::{Control, ControlSyntaxes};
pub use cursor::{LoopCursors, LoopHandle, register_loop_expressions};
pub use executor::{Executor, ExecutorConfig};
pub use graph::{ExitKind, ExitTarget, Node, NodeId, Trigger, Walk};
pub use loader::{Line, LoadError, LoadWarning, Script, ScriptLoader, parse_lines};
pub use scheduler::{Continuation, Scheduler, is_suspended, suspended_count};
