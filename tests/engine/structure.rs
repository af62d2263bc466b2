//! Integration tests for what the loader accepts and rejects.

use trellis_foundation::Event;

use crate::harness::{Harness, on_load};

// =============================================================================
// Helper Functions
// =============================================================================

fn errors(h: &Harness, text: &str) -> Vec<(usize, String)> {
    h.loader
        .load("test.sk", text)
        .errors()
        .iter()
        .map(|e| (e.line, e.message.clone()))
        .collect()
}

// =============================================================================
// Top Level
// =============================================================================

#[test]
fn only_triggers_may_appear_at_the_top_level() {
    let h = Harness::new();
    let found = errors(&h, "say 1\non lunch:\n    say 2\non load:\n    say 3\n");
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].0, 1);
    assert_eq!(found[1], (2, "Can't understand this event: 'lunch'".to_string()));

    let script = h.loader.load("test.sk", "say 1\non load:\n    say 3\n");
    assert_eq!(script.triggers().len(), 1);
}

#[test]
fn empty_triggers_load_with_a_warning() {
    let h = Harness::new();
    let script = h.load("on load:\n");
    assert_eq!(script.triggers().len(), 1);
    assert!(script.triggers()[0].is_empty());
    assert_eq!(script.warnings()[0].message, "'on load' has no statements");
}

// =============================================================================
// Statements
// =============================================================================

#[test]
fn bad_lines_are_dropped_and_the_rest_still_runs() {
    let h = Harness::new();
    let script = h.loader.load("test.sk", &on_load("say 1\ndance wildly\nsay 2"));
    assert_eq!(
        script.errors()[0].message,
        "Can't understand this condition/effect: 'dance wildly'"
    );
    assert_eq!(script.errors()[0].line, 3);

    h.fire(&script, Event::new("load"));
    assert_eq!(h.take(), ["1", "2"]);
}

#[test]
fn statements_are_tried_as_controls_then_effects_then_conditions() {
    let h = Harness::new();
    let script = h.load(&on_load("set {x} to 1\n{x} is 2\nsay \"unreachable\""));
    h.fire(&script, Event::new("load"));
    assert!(h.take().is_empty());
    assert_eq!(h.store.global("x"), Some(trellis_foundation::Value::Int(1)));
}

// =============================================================================
// Sections
// =============================================================================

#[test]
fn unknown_sections_are_errors() {
    let h = Harness::new();
    let found = errors(&h, &on_load("repeat 3 times:\n    say 1"));
    assert_eq!(found, [(2, "Can't understand this section: 'repeat 3 times'".to_string())]);
}

#[test]
fn else_needs_an_if() {
    let h = Harness::new();
    let found = errors(&h, &on_load("say 1\nelse:\n    say 2"));
    assert_eq!(found, [(3, "'else' has no matching 'if'".to_string())]);
}

#[test]
fn a_broken_if_takes_its_else_branches_with_it() {
    let h = Harness::new();
    let script = h.loader.load(
        "test.sk",
        &on_load("if dance wildly:\n    say 1\nelse if 1 is 1:\n    say 2\nelse:\n    say 3\nsay 4"),
    );
    assert_eq!(script.errors().len(), 1);
    assert_eq!(script.errors()[0].line, 2);

    h.fire(&script, Event::new("load"));
    assert_eq!(h.take(), ["4"]);
}

// =============================================================================
// Exits
// =============================================================================

#[test]
fn exits_are_checked_against_the_enclosing_sections() {
    let h = Harness::new();
    let found = errors(
        &h,
        &on_load(
            "stop loop\n\
             loop 2 times:\n    if 1 is 1:\n        stop 2 loops\n        stop 2 sections\n\
             exit 1 conditional",
        ),
    );
    assert_eq!(
        found,
        [
            (2, "there is no loop to stop here".to_string()),
            (5, "can't stop 2 loops: there is only 1 loop here".to_string()),
            (7, "there is no conditional to stop here".to_string()),
        ]
    );
}

#[test]
fn unreachable_code_warns_once_per_exit() {
    let h = Harness::new();
    let script = h.load(&on_load(
        "loop 2 times:\n    stop loop\n    say 1\n    say 2\nstop\nsay 3\nsay 4",
    ));
    let lines: Vec<usize> = script.warnings().iter().map(|w| w.line).collect();
    assert_eq!(lines, [4, 7]);
}

// =============================================================================
// Delays
// =============================================================================

#[test]
fn delays_must_parse_as_timespans() {
    let h = Harness::new();
    let found = errors(&h, &on_load("wait\nwait 3 parsecs\nwait 2 seconds"));
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].0, 2);
    assert_eq!(found[1].0, 3);
}
