//! Trellis - Natural-language scripting engine
//!
//! This crate re-exports all layers of the Trellis system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: trellis_runtime    - Sessions, virtual clock, CLI
//!          trellis_stdlib     - Standard types, expressions, conditions, effects, events
//! Layer 3: trellis_engine     - Script loading, trigger graphs, trampoline executor
//! Layer 2: trellis_parser     - Patterns, backtracking matcher, expression resolution
//! Layer 1: trellis_storage    - Variable store and change application
//! Layer 0: trellis_foundation - Core types (Value, Context, Error)
//! ```

pub use trellis_engine as engine;
pub use trellis_foundation as foundation;
pub use trellis_parser as parser;
pub use trellis_runtime as runtime;
pub use trellis_stdlib as stdlib;
pub use trellis_storage as storage;
