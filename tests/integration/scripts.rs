//! Loading several scripts into one session, from text and from files.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use trellis_engine::ExecutorConfig;
use trellis_foundation::{Context, Event, Value};
use trellis_parser::Effect;
use trellis_runtime::{Session, SessionConfig, SessionError};

/// Host effect that counts how often it ran.
#[derive(Debug)]
struct Ring(Arc<AtomicUsize>);

impl Effect for Ring {
    fn execute(&self, _ctx: &Context) -> trellis_foundation::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Several Scripts
// =============================================================================

#[test]
fn scripts_share_globals_and_react_in_load_order() {
    let mut session = Session::new().unwrap();
    assert!(session.load("a.sk", "on load:\n    set {owner} to \"a\"\n    say \"a\"\n").is_clean());
    assert!(session.load("b.sk", "on load:\n    say \"b saw %{owner}%\"\n").is_clean());

    let dispatch = session.dispatch(Event::new("load"));
    assert_eq!((dispatch.fired, dispatch.completed), (2, 2));
    assert_eq!(session.outbox().take(), ["a", "b saw a"]);
    assert_eq!(session.scripts().len(), 2);
    assert_eq!(session.triggers().count(), 2);
}

#[test]
fn a_broken_script_keeps_its_good_triggers() {
    let mut session = Session::new().unwrap();
    let script = session.load(
        "broken.sk",
        "on load:\n    frobnicate the widget\n    say \"still here\"\n\non nonsense:\n    say \"x\"\n",
    );
    assert!(!script.is_clean());
    let lines: Vec<usize> = script.errors().iter().map(|e| e.line).collect();
    assert_eq!(lines, [2, 5]);
    assert_eq!(script.source(), "broken.sk");

    session.dispatch(Event::new("load"));
    assert_eq!(session.outbox().take(), ["still here"]);
}

#[test]
fn a_fault_in_one_trigger_does_not_stop_the_next() {
    let mut session = Session::new().unwrap();
    session.load("faulty.sk", "on load:\n    say 1 / 0\n    say \"unreached\"\n");
    session.load("fine.sk", "on load:\n    say \"fine\"\n");

    let dispatch = session.dispatch(Event::new("load"));
    assert_eq!((dispatch.fired, dispatch.completed), (2, 1));
    assert_eq!(session.outbox().take(), ["fine"]);
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn load_file_reads_from_disk() {
    let path = std::env::temp_dir().join(format!("trellis-load-{}.sk", std::process::id()));
    std::fs::write(&path, "on command /ping:\n    say \"pong\"\n").unwrap();

    let mut session = Session::new().unwrap();
    let source = session.load_file(&path).unwrap().source().to_string();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(source, path.display().to_string());

    session.dispatch(Event::new("command").with_payload(Value::string("/ping")));
    assert_eq!(session.outbox().take(), ["pong"]);
}

#[test]
fn missing_files_are_session_errors() {
    let mut session = Session::new().unwrap();
    let err = session
        .load_file(Path::new("/definitely/not/here.sk"))
        .unwrap_err();
    assert!(matches!(err, SessionError::Io { .. }));
    assert!(err.to_string().starts_with("can't read '/definitely/not/here.sk'"));
    assert!(session.scripts().is_empty());
}

// =============================================================================
// Configuration and Host Elements
// =============================================================================

#[test]
fn host_registrations_extend_the_standard_set() {
    let rung = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&rung);
    let mut session = Session::with_registrations(SessionConfig::default(), move |builder| {
        builder.register_effect(&["ring the bell"], move |_| {
            Ok(Box::new(Ring(Arc::clone(&counter))))
        })
    })
    .unwrap();

    let script = session.load("bell.sk", "on load:\n    loop 3 times:\n        ring the bell\n    say \"done\"\n");
    assert!(script.is_clean(), "{:?}", script.errors());
    session.dispatch(Event::new("load"));
    assert_eq!(rung.load(Ordering::SeqCst), 3);
    assert_eq!(session.outbox().take(), ["done"]);
}

#[test]
fn the_step_budget_applies_per_execution() {
    let config = SessionConfig::default().with_executor(ExecutorConfig::default().with_max_steps(50));
    let mut session = Session::with_config(config).unwrap();
    session.load("spin.sk", "on load:\n    while 1 is 1:\n        add 1 to {spins}\n");

    let dispatch = session.dispatch(Event::new("load"));
    assert_eq!((dispatch.fired, dispatch.completed), (1, 0));
    let spins = session.store().global("spins").and_then(|v| v.as_int()).unwrap();
    assert!(spins > 0 && spins < 50);
}

#[test]
fn the_clock_can_start_late() {
    let config = SessionConfig::default().with_start(Duration::from_secs(3600));
    let mut session = Session::with_config(config).unwrap();
    session.load("late.sk", "on load:\n    wait 10 seconds\n    say \"late\"\n");
    session.dispatch(Event::new("load"));

    assert_eq!(session.clock().now(), Duration::from_secs(3600));
    assert_eq!(session.clock().next_due(), Some(Duration::from_secs(3610)));
    session.advance(Duration::from_secs(10));
    assert_eq!(session.outbox().take(), ["late"]);
}
