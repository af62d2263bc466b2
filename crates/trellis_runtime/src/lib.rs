//! Sessions, a virtual clock, and the command-line runner for Trellis.
//!
//! This crate provides:
//! - [`Session`] - Loads scripts and dispatches occurrences to their triggers
//! - [`ManualScheduler`] - A scheduler driven by an explicit virtual clock
//! - [`SessionConfig`] / [`SessionError`] - Configuration and failures
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use trellis_foundation::Event;
//! use trellis_runtime::Session;
//!
//! let mut session = Session::new().unwrap();
//! let script = session.load("hello.sk", "on load:\n    wait 1 second\n    say \"hello\"\n");
//! assert!(script.is_clean());
//!
//! session.dispatch(Event::new("load"));
//! session.advance(Duration::from_secs(1));
//! assert_eq!(session.outbox().take(), ["hello"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod session;

pub use clock::ManualScheduler;
pub use session::{Dispatch, Result, Session, SessionConfig, SessionError};
