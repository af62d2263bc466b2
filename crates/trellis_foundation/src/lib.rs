//! Core values, type ids, execution contexts, and errors for Trellis.
//!
//! This crate provides:
//! - [`Value`] - The core value type for all script data
//! - [`TypeId`] - Identifiers of registered value types
//! - [`Context`] / [`Event`] - The opaque handle of one execution pass
//! - [`VariableName`] - Normalized, segment-ordered variable names
//! - [`Error`] - Runtime fault types with context
//! - [`Kleenean`], [`Time`], [`ChangeMode`] - Small shared enums

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod context;
pub mod error;
pub mod name;
pub mod stack;
pub mod types;
pub mod value;

pub use context::{Context, ContextId, Event, Locals, WeakContext};
pub use error::{Error, ErrorContext, ErrorKind};
pub use name::{LIST_SUFFIX, SEPARATOR, VariableName};
pub use stack::ensure_sufficient_stack;
pub use types::{ChangeMode, Kleenean, Time, TypeId};
pub use value::{Object, Value, format_timespan};

/// Result type for Trellis runtime operations.
pub type Result<T> = std::result::Result<T, Error>;
