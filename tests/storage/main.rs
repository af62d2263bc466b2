//! Integration tests for Layer 1: Storage
//!
//! Tests for the variable store contract and change semantics.

mod changes;
