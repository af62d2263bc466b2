//! Integration tests for Layer 2: Parser
//!
//! Tests for pattern matching, expression resolution and statement parsing
//! against the standard registry.

mod patterns;
mod resolution;
mod statements;
