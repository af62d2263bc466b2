//! Variable storage for Trellis.
//!
//! The interpreter never owns variable data. It talks to a [`VariableStore`],
//! an external associative store addressed by [`VariableName`] in one of three
//! modes: global scalar, local (names starting with `_`), and list (names
//! ending in `::*`, addressing a key range).
//!
//! This crate provides:
//! - [`VariableStore`] - The store contract the interpreter depends on
//! - [`MemoryStore`] - An in-memory reference store with cheap snapshots
//! - [`change`] - `ChangeMode` semantics shared by every store
//!
//! [`VariableName`]: trellis_foundation::VariableName

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod change;
pub mod memory;
pub mod store;

pub use change::apply_change;
pub use memory::MemoryStore;
pub use store::{VariableStore, is_local_name};
