//! A small chat moderation bot.

use std::time::Duration;

use trellis_foundation::{Event, Value};
use trellis_runtime::Session;

const BOT: &str = r#"
# Counts messages and keeps the channel clean.
on load:
    set {banned::*} to "spam", "scam" and "phish"
    set {greeting} to "welcome"

on message:
    add 1 to {messages}

on message containing "spam":
    cancel the event
    add 1 to {strikes}
    if {strikes} >= 3:
        say "too much spam"

on message containing "hello":
    say "%{greeting}%, friend"

on command /stats:
    say "messages: %{messages}%, strikes: %{strikes}%"

on command /remind:
    say "reminder set"
    wait 5 minutes
    say "reminder!"
"#;

// =============================================================================
// Helper Functions
// =============================================================================

fn bot() -> Session {
    let mut session = Session::new().unwrap();
    let script = session.load("bot.sk", BOT);
    assert!(script.is_clean(), "{:?}", script.errors());
    assert_eq!(script.triggers().len(), 6);
    session.dispatch(Event::new("load"));
    session
}

fn message(text: &str) -> Event {
    Event::new("message").with_payload(Value::string(text))
}

fn command(text: &str) -> Event {
    Event::new("command").with_payload(Value::string(text))
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn load_sets_up_globals() {
    let session = bot();
    assert_eq!(session.store().global("greeting"), Some(Value::string("welcome")));
    assert_eq!(session.store().global("banned::3"), Some(Value::string("phish")));
}

#[test]
fn every_message_is_counted_and_filters_pick_their_handlers() {
    let session = bot();
    let plain = session.dispatch(message("just chatting"));
    assert_eq!((plain.fired, plain.completed), (1, 1));

    let hello = session.dispatch(message("Hello there"));
    assert_eq!(hello.fired, 2);
    assert_eq!(session.outbox().take(), ["welcome, friend"]);
    assert_eq!(session.store().global("messages"), Some(Value::Int(2)));
}

#[test]
fn spam_is_cancelled_and_escalates() {
    let session = bot();
    for _ in 0..2 {
        let dispatch = session.dispatch(message("buy SPAM now"));
        assert!(dispatch.cancelled);
    }
    assert!(session.outbox().take().is_empty());

    session.dispatch(message("more spam"));
    assert_eq!(session.outbox().take(), ["too much spam"]);
    assert!(!session.dispatch(message("fine")).cancelled);
}

#[test]
fn commands_read_the_counters() {
    let session = bot();
    session.dispatch(message("spam"));
    session.dispatch(message("hi"));
    let stats = session.dispatch(command("/STATS please"));
    assert_eq!(stats.fired, 1);
    assert_eq!(session.outbox().take(), ["messages: 2, strikes: 1"]);

    assert_eq!(session.dispatch(command("/nothing")).fired, 0);
}

#[test]
fn reminders_wait_for_the_clock() {
    let session = bot();
    session.dispatch(command("/remind"));
    assert_eq!(session.outbox().take(), ["reminder set"]);

    assert_eq!(session.advance(Duration::from_secs(299)), 0);
    assert!(session.outbox().take().is_empty());
    assert_eq!(session.advance(Duration::from_secs(1)), 1);
    assert_eq!(session.outbox().take(), ["reminder!"]);
}
