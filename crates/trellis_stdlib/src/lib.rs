//! Standard syntax elements for Trellis scripts.
//!
//! This crate registers the elements most scripts need, organized by kind:
//! - [`types`] - Literal parsers for numbers, booleans and time spans, plus converters
//! - [`events`] - `load`, `message [containing "text"]`, `command /name`
//! - [`conditions`] - `is set`, comparisons, `event is cancelled`
//! - [`effects`] - `set`/`add`/`remove`/`delete`, `broadcast`, `cancel event`
//! - [`expressions`] - Arithmetic, integer ranges, `amount of`, event data
//!
//! Broadcast text is collected in an [`Outbox`] owned by the host.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;
use trellis_engine::register_loop_expressions;
use trellis_parser::{Registry, RegistryBuilder, RegistryError};

pub mod conditions;
pub mod effects;
pub mod events;
pub mod expressions;
pub mod types;

/// Collects broadcast messages. Clones share the same messages.
#[derive(Clone, Debug, Default)]
pub struct Outbox {
    messages: Arc<Mutex<Vec<String>>>,
}

impl Outbox {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    pub fn push(&self, message: String) {
        info!(message = %message, "broadcast");
        self.messages.lock().push(message);
    }

    /// Removes and returns every message so far.
    #[must_use]
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock())
    }

    /// A copy of the messages so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

/// Registers every standard element on `builder`.
///
/// # Errors
///
/// Returns the first rejected registration.
pub fn register(builder: &mut RegistryBuilder, outbox: &Outbox) -> Result<(), RegistryError> {
    types::register(builder)?;
    events::register(builder)?;
    conditions::register(builder)?;
    effects::register(builder, outbox)?;
    expressions::register(builder)?;
    register_loop_expressions(builder)
}

/// A frozen registry holding only the standard elements.
///
/// # Errors
///
/// Returns the first rejected registration.
pub fn standard_registry(outbox: &Outbox) -> Result<Registry, RegistryError> {
    let mut builder = RegistryBuilder::new();
    register(&mut builder, outbox)?;
    Ok(builder.build())
}
