//! Integration tests for full Trellis sessions
//!
//! Tests that load realistic scripts and drive them through events and the
//! virtual clock.

mod chat;
mod scripts;
mod timers;
