//! Integration tests for walking trigger graphs.

use trellis_engine::ExecutorConfig;
use trellis_foundation::{Event, Value};

use crate::harness::{Harness, on_load};

// =============================================================================
// Helper Functions
// =============================================================================

/// Loads `body` under `on load:`, fires it once and returns the output.
fn output(body: &str) -> Vec<String> {
    let h = Harness::new();
    let script = h.load(&on_load(body));
    assert!(h.fire(&script, Event::new("load")).iter().all(|ok| *ok));
    h.take()
}

// =============================================================================
// Conditionals
// =============================================================================

#[test]
fn exactly_one_branch_of_a_chain_runs() {
    let chain = "if {x} is 1:\n    say \"one\"\nelse if {x} is 2:\n    say \"two\"\nelse:\n    say \"many\"\nsay \"done\"";
    for (x, expected) in [(1, "one"), (2, "two"), (3, "many")] {
        let body = format!("set {{x}} to {x}\n{chain}");
        assert_eq!(output(&body), [expected, "done"]);
    }
}

#[test]
fn a_false_guard_line_ends_the_execution() {
    assert_eq!(output("say 1\n1 is 2\nsay 2"), ["1"]);
}

// =============================================================================
// Loops
// =============================================================================

#[test]
fn loops_expose_value_and_iteration() {
    assert_eq!(
        output("loop \"a\", \"b\" and \"c\":\n    say \"%loop-iteration%: %loop-value%\""),
        ["1: a", "2: b", "3: c"]
    );
}

#[test]
fn nested_loops_are_addressed_innermost_first() {
    assert_eq!(
        output("loop 2 times:\n    loop 2 times:\n        say \"%loop-integer-2%.%loop-integer%\""),
        ["1.1", "1.2", "2.1", "2.2"]
    );
}

#[test]
fn loops_over_nothing_skip_their_body() {
    assert_eq!(output("loop {nothing::*}:\n    say 1\nsay 2"), ["2"]);
}

#[test]
fn while_loops_recheck_their_condition() {
    assert_eq!(
        output("set {i} to 0\nwhile {i} < 3:\n    add 1 to {i}\n    say {i}\nsay \"end\""),
        ["1", "2", "3", "end"]
    );
}

// =============================================================================
// Exits
// =============================================================================

#[test]
fn exits_leave_the_named_sections() {
    let body = "loop 3 times:\n    loop 3 times:\n        if loop-integer is 2:\n            stop 2 loops\n        say loop-integer\nsay \"after\"";
    assert_eq!(output(body), ["1", "after"]);

    let body = "loop 3 times:\n    if loop-integer is 2:\n        stop conditional\n        say \"skipped\"\n    say loop-integer";
    assert_eq!(output(body), ["1", "2", "3"]);

    let body = "loop 3 times:\n    while 1 is 1:\n        say loop-integer\n        stop 2 sections\nsay \"after\"";
    assert_eq!(output(body), ["1", "after"]);
}

#[test]
fn stopping_the_trigger_ends_everything() {
    assert_eq!(
        output("loop 3 times:\n    say loop-integer\n    if loop-integer is 2:\n        stop trigger\nsay \"after\""),
        ["1", "2"]
    );
}

// =============================================================================
// Faults
// =============================================================================

#[test]
fn runtime_errors_abort_only_their_execution() {
    let h = Harness::new();
    let script = h.load("on load:\n    say 1\n    say 1 / 0\n    say 2\non load:\n    say 3\n");
    assert_eq!(h.fire(&script, Event::new("load")), [false, true]);
    assert_eq!(h.take(), ["1", "3"]);
}

#[test]
fn panics_are_caught_as_faults() {
    let h = Harness::new();
    let script = h.load("on load:\n    say 1\n    explode\n    say 2\n");
    assert_eq!(h.fire(&script, Event::new("load")), [false]);
    assert_eq!(h.take(), ["1"]);
}

#[test]
fn runaway_loops_hit_the_step_limit() {
    let h = Harness::with_config(ExecutorConfig::default().with_max_steps(100));
    let script = h.load("on load:\n    while 1 is 1:\n        add 1 to {n}\n");
    assert_eq!(h.fire(&script, Event::new("load")), [false]);
    let n = h.store.global("n").and_then(|v| v.as_int()).unwrap();
    assert!(n > 0 && n < 100, "{n}");
}

#[test]
fn a_faulted_loop_starts_fresh_next_time() {
    let h = Harness::new();
    let script = h.load("on load:\n    loop 3 times:\n        say loop-integer\n        say 1 / 0\n");
    let trigger = &script.triggers()[0];
    let ctx = trellis_foundation::Context::for_event("load");
    assert!(!h.executor.execute(trigger, &ctx));
    assert!(!h.executor.execute(trigger, &ctx));
    assert_eq!(h.take(), ["1", "1"]);
    assert!(trigger.cursors().is_empty());
}

// =============================================================================
// Stack Safety
// =============================================================================

#[test]
fn long_scripts_do_not_grow_the_stack() {
    let h = Harness::with_config(ExecutorConfig::unbounded());
    let mut body = String::new();
    for _ in 0..5_000 {
        body.push_str("add 1 to {n}\n");
    }
    body.push_str("loop 100000 times:\n    add 1 to {n}\n");
    let script = h.load(&on_load(&body));
    assert_eq!(h.fire(&script, Event::new("load")), [true]);
    assert_eq!(h.store.global("n"), Some(Value::Int(105_000)));
}
