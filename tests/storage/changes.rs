//! Integration tests for `apply_change`.

use std::time::Duration;

use trellis_foundation::{ChangeMode, Context, Error, ErrorKind, Result, Value, VariableName};
use trellis_storage::{MemoryStore, VariableStore, apply_change};

// =============================================================================
// Helper Functions
// =============================================================================

fn change(store: &dyn VariableStore, ctx: &Context, name: &str, mode: ChangeMode, delta: &[Value]) {
    apply_change(store, &VariableName::new(name), ctx, false, mode, delta).unwrap();
}

fn list(store: &MemoryStore, ctx: &Context, prefix: &str) -> Vec<Value> {
    store
        .list(prefix, ctx, false)
        .into_iter()
        .map(|(_, v)| v)
        .collect()
}

/// A store that refuses every write.
#[derive(Debug)]
struct ReadOnly;

impl VariableStore for ReadOnly {
    fn get(&self, _: &VariableName, _: &Context, _: bool) -> Option<Value> {
        None
    }

    fn set(&self, name: &VariableName, _: Option<Value>, _: &Context, _: bool) -> Result<()> {
        Err(Error::store(format!("{name} is read-only")))
    }

    fn list(&self, _: &str, _: &Context, _: bool) -> Vec<(VariableName, Value)> {
        Vec::new()
    }
}

// =============================================================================
// Scalars
// =============================================================================

#[test]
fn arithmetic_on_unset_scalars_starts_from_zero() {
    let store = MemoryStore::new();
    let ctx = Context::for_event("load");

    change(&store, &ctx, "n", ChangeMode::Add, &[Value::Float(1.5), Value::Int(2)]);
    assert_eq!(store.global("n"), Some(Value::Float(3.5)));
    change(&store, &ctx, "n", ChangeMode::Remove, &[Value::Int(3)]);
    assert_eq!(store.global("n"), Some(Value::Float(0.5)));

    change(&store, &ctx, "t", ChangeMode::Add, &[Value::Timespan(Duration::from_secs(5))]);
    change(&store, &ctx, "t", ChangeMode::Add, &[Value::Timespan(Duration::from_secs(5))]);
    assert_eq!(store.global("t"), Some(Value::Timespan(Duration::from_secs(10))));
}

#[test]
fn removing_text_from_a_scalar_deletes_it_when_equal() {
    let store = MemoryStore::new();
    let ctx = Context::for_event("load");
    change(&store, &ctx, "s", ChangeMode::Set, &[Value::string("Red")]);

    change(&store, &ctx, "s", ChangeMode::Remove, &[Value::string("blue")]);
    assert_eq!(store.global("s"), Some(Value::string("Red")));

    change(&store, &ctx, "s", ChangeMode::RemoveAll, &[Value::string("red")]);
    assert_eq!(store.global("s"), None);
}

#[test]
fn local_changes_stay_in_their_context() {
    let store = MemoryStore::new();
    let ctx = Context::for_event("load");
    let name = VariableName::new("_n");
    apply_change(&store, &name, &ctx, true, ChangeMode::Add, &[Value::Int(2)]).unwrap();
    assert_eq!(store.get(&name, &ctx, true), Some(Value::Int(2)));
    assert!(store.is_empty());
}

// =============================================================================
// Lists
// =============================================================================

#[test]
fn adding_fills_gaps_before_appending() {
    let store = MemoryStore::new();
    let ctx = Context::for_event("load");
    change(&store, &ctx, "l::*", ChangeMode::Set, &[Value::Int(1), Value::Int(2), Value::Int(3)]);
    change(&store, &ctx, "l::*", ChangeMode::Remove, &[Value::Int(2)]);
    change(&store, &ctx, "l::*", ChangeMode::Add, &[Value::Int(7), Value::Int(8)]);

    assert_eq!(store.global("l::2"), Some(Value::Int(7)));
    assert_eq!(store.global("l::4"), Some(Value::Int(8)));
    assert_eq!(list(&store, &ctx, "l::"), [Value::Int(1), Value::Int(7), Value::Int(3), Value::Int(8)]);
}

#[test]
fn removing_one_versus_every_match() {
    let store = MemoryStore::new();
    let ctx = Context::for_event("load");
    let a = Value::string("a");
    let b = Value::string("b");
    change(&store, &ctx, "l::*", ChangeMode::Set, &[a.clone(), b.clone(), a.clone(), a.clone()]);

    change(&store, &ctx, "l::*", ChangeMode::Remove, &[a.clone()]);
    assert_eq!(list(&store, &ctx, "l::"), [b.clone(), a.clone(), a.clone()]);

    change(&store, &ctx, "l::*", ChangeMode::RemoveAll, &[Value::string("A")]);
    assert_eq!(list(&store, &ctx, "l::"), [b]);

    change(&store, &ctx, "l::*", ChangeMode::Delete, &[]);
    assert!(store.is_empty());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn reset_is_rejected_before_touching_the_store() {
    let ctx = Context::for_event("load");
    let err = apply_change(&ReadOnly, &VariableName::new("x"), &ctx, false, ChangeMode::Reset, &[])
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnsupportedChange { .. }));
}

#[test]
fn store_failures_propagate() {
    let ctx = Context::for_event("load");
    let err = apply_change(
        &ReadOnly,
        &VariableName::new("x"),
        &ctx,
        false,
        ChangeMode::Set,
        &[Value::Int(1)],
    )
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Store(_)));
    assert_eq!(err.to_string(), "variable store: x is read-only");
}

#[test]
fn type_errors_leave_the_variable_unchanged() {
    let store = MemoryStore::new();
    let ctx = Context::for_event("load");
    change(&store, &ctx, "n", ChangeMode::Set, &[Value::Int(4)]);
    let err = apply_change(&store, &VariableName::new("n"), &ctx, false, ChangeMode::Add, &[Value::Bool(true)])
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    assert_eq!(store.global("n"), Some(Value::Int(4)));
}
