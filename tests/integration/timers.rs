//! Delayed executions driven by the virtual clock.

use std::time::Duration;

use proptest::prelude::*;
use trellis_foundation::{Event, Value};
use trellis_runtime::{Session, SessionConfig};

// =============================================================================
// Helper Functions
// =============================================================================

fn session(text: &str) -> Session {
    let mut session = Session::new().unwrap();
    let script = session.load("timers.sk", text);
    assert!(script.is_clean(), "{:?}", script.errors());
    session
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn a_countdown_ticks_once_per_second() {
    let session = session(
        "on load:\n    set {n} to 3\n    while {n} > 0:\n        say \"%{n}%\"\n        remove 1 from {n}\n        wait 1 second\n    say \"liftoff\"\n",
    );
    session.dispatch(Event::new("load"));
    assert_eq!(session.outbox().take(), ["3"]);

    assert_eq!(session.advance(secs(1)), 1);
    assert_eq!(session.outbox().take(), ["2"]);
    assert_eq!(session.advance(secs(5)), 2);
    assert_eq!(session.outbox().take(), ["1", "liftoff"]);
    assert_eq!(session.clock().pending(), 0);
    assert_eq!(session.clock().now(), secs(6));
}

#[test]
fn due_continuations_resume_earliest_first() {
    let session = session(
        "on message containing \"slow\":\n    wait 3 seconds\n    say \"slow\"\n\non message containing \"fast\":\n    wait 1 second\n    say \"fast\"\n",
    );
    session.dispatch(Event::new("message").with_payload(Value::string("slow")));
    session.dispatch(Event::new("message").with_payload(Value::string("fast")));
    assert_eq!(session.clock().pending(), 2);
    assert_eq!(session.clock().next_due(), Some(secs(1)));

    assert_eq!(session.advance(secs(10)), 2);
    assert_eq!(session.outbox().take(), ["fast", "slow"]);
}

#[test]
fn equal_deadlines_keep_scheduling_order() {
    let session = session("on message:\n    wait 2 seconds\n    say event-payload\n");
    for text in ["first", "second", "third"] {
        session.dispatch(Event::new("message").with_payload(Value::string(text)));
    }
    session.advance(secs(2));
    assert_eq!(session.outbox().take(), ["first", "second", "third"]);
}

#[test]
fn locals_belong_to_each_occurrence() {
    let session = session(
        "on message:\n    set {_text} to event-payload\n    wait 1 minute\n    say \"echo %{_text}%\"\n",
    );
    session.dispatch(Event::new("message").with_payload(Value::string("one")));
    session.advance(secs(30));
    session.dispatch(Event::new("message").with_payload(Value::string("two")));

    session.advance(secs(30));
    assert_eq!(session.outbox().take(), ["echo one"]);
    session.advance(secs(30));
    assert_eq!(session.outbox().take(), ["echo two"]);
}

#[test]
fn zero_delays_yield_to_the_host_once_per_advance() {
    let session = session(
        "on load:\n    while 1 is 1:\n        add 1 to {spins}\n        wait 0 seconds\n\non message:\n    wait 5 seconds\n    say \"later\"\n",
    );
    session.dispatch(Event::new("load"));
    session.dispatch(Event::new("message").with_payload(Value::string("hi")));
    assert_eq!(session.clock().pending(), 2);

    // The spinning loop resumes once; it does not hold back the timer.
    assert_eq!(session.advance(secs(10)), 2);
    assert_eq!(session.outbox().take(), ["later"]);
    assert_eq!(session.store().global("spins"), Some(Value::Int(2)));

    for spins in 3..6 {
        assert_eq!(session.advance(Duration::ZERO), 1);
        assert_eq!(session.store().global("spins"), Some(Value::Int(spins)));
    }
    assert_eq!(session.clock().pending(), 1);
    assert_eq!(session.clock().now(), secs(10));
}

#[test]
fn cancelling_after_a_delay_is_rejected_at_load() {
    let mut session = Session::new().unwrap();
    let script = session.load("late.sk", "on message:\n    wait 1 second\n    cancel the event\n");
    assert_eq!(script.errors().len(), 1);
    assert_eq!(script.errors()[0].line, 3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn a_delayed_loop_finishes_after_its_last_wait(n in 1u64..20) {
        let mut session = Session::with_config(SessionConfig::unbounded()).unwrap();
        session.load(
            "loop.sk",
            &format!("on load:\n    loop {n} times:\n        wait 1 second\n        add 1 to {{ticks}}\n    say \"done\"\n"),
        );
        session.dispatch(Event::new("load"));

        session.advance(secs(n - 1));
        prop_assert!(session.outbox().take().is_empty());
        let ticks = session.store().global("ticks").and_then(|v| v.as_int()).unwrap_or(0);
        prop_assert_eq!(ticks, i64::try_from(n - 1).unwrap());

        session.advance(secs(1));
        prop_assert_eq!(session.outbox().take(), vec!["done".to_string()]);
        prop_assert_eq!(session.clock().pending(), 0);
    }
}
