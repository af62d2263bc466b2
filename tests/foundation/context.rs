//! Integration tests for contexts, events and errors.

use std::sync::Arc;

use trellis_foundation::{
    ChangeMode, Context, Error, ErrorContext, ErrorKind, Event, Value, VariableName,
};

#[test]
fn contexts_share_the_event_but_not_locals() {
    let event = Arc::new(Event::new("message").with_payload(Value::string("hi")));
    let a = Context::new(Arc::clone(&event));
    let b = Context::new(Arc::clone(&event));
    assert_ne!(a, b);
    assert!(Arc::ptr_eq(a.event(), b.event()));

    a.locals().insert(VariableName::new("_x"), Value::Int(1));
    assert_eq!(a.locals().len(), 1);
    assert!(b.locals().is_empty());
    assert_eq!(a.clone().locals().len(), 1);
}

#[test]
fn cancellation_is_visible_through_every_context() {
    let event = Arc::new(Event::new("message"));
    let a = Context::new(Arc::clone(&event));
    let b = Context::new(Arc::clone(&event));
    a.event().set_cancelled(true);
    assert!(b.event().is_cancelled());
    assert!(event.is_cancelled());
}

#[test]
fn weak_contexts_do_not_keep_contexts_alive() {
    let ctx = Context::for_event("load");
    let weak = ctx.downgrade();
    assert_eq!(weak.id(), ctx.id());
    assert_eq!(weak.upgrade(), Some(ctx.clone()));
    drop(ctx);
    assert!(!weak.is_alive());
    assert!(weak.upgrade().is_none());
}

#[test]
fn errors_carry_their_location() {
    let err = Error::unsupported_change(ChangeMode::Reset, "{x}").with_context(
        ErrorContext::new()
            .with_source("greet.sk")
            .with_line(4)
            .with_node("reset {x}"),
    );
    assert!(matches!(err.kind, ErrorKind::UnsupportedChange { mode: ChangeMode::Reset, .. }));
    let context = err.context.unwrap();
    assert_eq!(context.source.as_deref(), Some("greet.sk"));
    assert_eq!(context.line, Some(4));
}

#[test]
fn step_limits_report_the_budget() {
    assert_eq!(
        Error::step_limit(1_000).to_string(),
        "step limit exceeded: more than 1000 steps in one execution"
    );
}
