//! Integration tests for delays, continuations and concurrent executions.

use std::time::Duration;

use trellis_engine::is_suspended;
use trellis_foundation::{Context, Event, Value};

use crate::harness::{Harness, on_load};

// =============================================================================
// Delays
// =============================================================================

#[test]
fn a_delay_hands_the_rest_to_the_scheduler() {
    let h = Harness::new();
    let script = h.load(&on_load("say 1\nwait 2 seconds\nsay 2"));
    assert_eq!(h.fire(&script, Event::new("load")), [true]);
    assert_eq!(h.take(), ["1"]);
    assert_eq!(h.held.0.lock()[0].0, Duration::from_secs(2));

    assert_eq!(h.resume_next(), Some(true));
    assert_eq!(h.take(), ["2"]);
    assert_eq!(h.pending(), 0);
}

#[test]
fn zero_delays_still_suspend() {
    let h = Harness::new();
    let script = h.load(&on_load("wait 0 seconds\nsay 1"));
    h.fire(&script, Event::new("load"));
    assert!(h.take().is_empty());
    h.resume_all();
    assert_eq!(h.take(), ["1"]);
}

#[test]
fn locals_survive_a_delay() {
    let h = Harness::new();
    let script = h.load(&on_load("set {_n} to 5\nwait 1 second\nadd 1 to {_n}\nsay {_n}"));
    h.fire(&script, Event::new("load"));
    h.resume_all();
    assert_eq!(h.take(), ["6"]);
    assert!(h.store.is_empty());
}

#[test]
fn faults_after_a_delay_are_reported_by_the_resume() {
    let h = Harness::new();
    let script = h.load(&on_load("wait 1 second\nsay 1 / 0"));
    assert_eq!(h.fire(&script, Event::new("load")), [true]);
    assert_eq!(h.resume_next(), Some(false));
}

// =============================================================================
// Reentrancy
// =============================================================================

#[test]
fn executions_of_one_trigger_keep_their_own_loop_state() {
    let h = Harness::new();
    let script = h.load(&on_load(
        "set {_id} to event-payload\nloop 3 times:\n    say \"%{_id}%-%loop-integer%\"\n    wait 1 second",
    ));
    h.fire(&script, Event::new("load").with_payload(Value::string("a")));
    h.fire(&script, Event::new("load").with_payload(Value::string("b")));
    assert_eq!(h.pending(), 2);

    h.resume_all();
    assert_eq!(h.take(), ["a-1", "b-1", "a-2", "b-2", "a-3", "b-3"]);
    assert!(script.triggers()[0].cursors().is_empty());
}

#[test]
fn one_context_can_run_a_trigger_again_after_it_finishes() {
    let h = Harness::new();
    let script = h.load(&on_load("loop 2 times:\n    say loop-integer"));
    let ctx = Context::for_event("load");
    let trigger = &script.triggers()[0];
    assert!(h.executor.execute(trigger, &ctx));
    assert!(h.executor.execute(trigger, &ctx));
    assert_eq!(h.take(), ["1", "2", "1", "2"]);
}

#[test]
fn a_loop_left_by_a_guard_restarts_for_the_same_context() {
    let h = Harness::new();
    let script = h.load(&on_load("loop 3 times:\n    say loop-integer\n    loop-integer is less than 2"));
    let ctx = Context::for_event("load");
    let trigger = &script.triggers()[0];
    assert!(h.executor.execute(trigger, &ctx));
    assert!(trigger.cursors().is_empty());
    assert!(h.executor.execute(trigger, &ctx));
    assert_eq!(h.take(), ["1", "2", "1", "2"]);
}

#[test]
fn a_loop_left_by_an_exit_restarts_for_the_same_context() {
    let h = Harness::new();
    let script = h.load(&on_load(
        "loop 3 times:\n    say loop-integer\n    if loop-integer is 2:\n        stop loop",
    ));
    let ctx = Context::for_event("load");
    let trigger = &script.triggers()[0];
    assert!(h.executor.execute(trigger, &ctx));
    assert!(h.executor.execute(trigger, &ctx));
    assert_eq!(h.take(), ["1", "2", "1", "2"]);
}

// =============================================================================
// Suspended Contexts
// =============================================================================

#[test]
fn suspension_is_remembered_per_context() {
    let h = Harness::new();
    let script = h.load(&on_load("wait 1 second\nsay 1"));
    let trigger = &script.triggers()[0];
    let ctx = Context::for_event("load");
    let fresh = Context::for_event("load");

    assert!(!is_suspended(&ctx));
    h.executor.execute(trigger, &ctx);
    assert!(is_suspended(&ctx));
    assert!(!is_suspended(&fresh));

    h.resume_all();
    assert!(is_suspended(&ctx));
}

#[test]
fn dropped_continuations_release_their_context() {
    let h = Harness::new();
    let script = h.load(&on_load("wait 1 second\nsay 1"));
    let ctx = Context::for_event("load");
    let weak = ctx.downgrade();
    h.executor.execute(&script.triggers()[0], &ctx);
    drop(ctx);
    assert!(weak.is_alive());

    h.held.0.lock().clear();
    assert!(!weak.is_alive());
    assert!(h.take().is_empty());
}
