//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Value, Kleenean, VariableName, Context and Error.

mod context;
mod names;
mod values;
