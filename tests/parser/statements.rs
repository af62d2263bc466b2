//! Integration tests for conditions, effects and events.

use std::sync::Arc;

use trellis_foundation::{Context, Event, Object, Result, TypeId, Value};
use trellis_parser::{
    Condition, Expression, ParseScope, Quality, RegistryBuilder, SyntaxParser, TypeDef,
    check_values,
};
use trellis_stdlib::Outbox;
use trellis_storage::MemoryStore;

// =============================================================================
// Helper Functions
// =============================================================================

const ONLINE: [&str; 2] = ["ann", "bob"];

fn player(text: &str) -> Option<Value> {
    let name = text.strip_prefix('@')?;
    (!name.is_empty() && name.chars().all(char::is_alphanumeric)).then(|| {
        Value::Object(Object::new(TypeId::from_index(TypeId::RESERVED), name, ()))
    })
}

#[derive(Debug)]
struct Online {
    players: Box<dyn Expression>,
    negated: bool,
}

impl Condition for Online {
    fn check(&self, ctx: &Context) -> Result<bool> {
        check_values(self.players.as_ref(), ctx, self.negated, |v| {
            v.as_object().is_some_and(|o| ONLINE.contains(&o.label()))
        })
    }
}

struct Fixture {
    parser: SyntaxParser,
    store: Arc<MemoryStore>,
    outbox: Outbox,
}

/// The standard registry plus a host `player` type.
fn fixture() -> Fixture {
    let outbox = Outbox::new();
    let store = Arc::new(MemoryStore::new());
    let mut builder = RegistryBuilder::new();
    let id = builder
        .register_type(TypeDef::new("player").parser(player))
        .unwrap();
    assert_eq!(id, TypeId::from_index(TypeId::RESERVED));
    trellis_stdlib::register(&mut builder, &outbox).unwrap();
    builder
        .register_condition(&["%players% (is|are) [1¦not] online"], |mut args| {
            Ok(Box::new(Online {
                players: args.required(0)?,
                negated: args.mark() == 1,
            }))
        })
        .unwrap();
    let parser = SyntaxParser::new(Arc::new(builder.build()), store.clone());
    Fixture {
        parser,
        store,
        outbox,
    }
}

impl Fixture {
    fn run(&self, effect: &str, ctx: &Context) {
        let parsed = self
            .parser
            .parse_effect(effect, &ParseScope::new())
            .unwrap_or_else(|d| panic!("'{effect}' failed: {d}"));
        parsed.element.execute(ctx).unwrap();
    }

    fn check(&self, condition: &str, ctx: &Context) -> bool {
        let parsed = self
            .parser
            .parse_condition(condition, &ParseScope::new())
            .unwrap_or_else(|d| panic!("'{condition}' failed: {d}"));
        parsed.element.check(ctx).unwrap()
    }
}

// =============================================================================
// Effects
// =============================================================================

#[test]
fn effects_change_variables() {
    let f = fixture();
    let ctx = Context::for_event("test");
    f.run("set {x} to 5", &ctx);
    f.run("add 2 and 3 to {x}", &ctx);
    assert_eq!(f.store.global("x"), Some(Value::Int(10)));

    f.run("add \"a\", \"b\" and \"c\" to {letters::*}", &ctx);
    f.run("remove \"b\" from {letters::*}", &ctx);
    assert_eq!(f.store.global("letters::3"), Some(Value::string("c")));
    assert_eq!(f.store.global("letters::2"), None);

    f.run("delete {letters::*}", &ctx);
    assert_eq!(f.store.len(), 1);
}

#[test]
fn local_variables_belong_to_the_context() {
    let f = fixture();
    let ctx = Context::for_event("test");
    f.run("set {_n} to 1", &ctx);
    f.run("say \"n=%{_n}%\"", &ctx);
    f.run("say \"n=%{_n}%\"", &Context::for_event("test"));
    assert_eq!(f.outbox.take(), ["n=1", "n="]);
    assert!(f.store.is_empty());
}

#[test]
fn host_values_print_with_their_label() {
    let f = fixture();
    f.run("say @ann and @bob", &Context::for_event("test"));
    assert_eq!(f.outbox.take(), ["ann and bob"]);
}

// =============================================================================
// Conditions
// =============================================================================

#[test]
fn comparisons_respect_and_or_lists() {
    let f = fixture();
    let ctx = Context::for_event("test");
    f.run("set {x} to 4", &ctx);
    assert!(f.check("{x} is greater than 3", &ctx));
    assert!(f.check("{x} >= 4", &ctx));
    assert!(f.check("{x} is 1, 4 or 9", &ctx));
    assert!(!f.check("{x} is 1, 4 and 9", &ctx));
    assert!(f.check("{x} is not 5", &ctx));
    assert!(f.check("{x} is set", &ctx));
    assert!(f.check("{y} is not set", &ctx));
}

#[test]
fn host_conditions_see_host_literals() {
    let f = fixture();
    let ctx = Context::for_event("test");
    assert!(f.check("@ann and @bob are online", &ctx));
    assert!(!f.check("@ann and @eve are online", &ctx));
    assert!(f.check("@ann or @eve is online", &ctx));
    assert!(f.check("@eve is not online", &ctx));
}

// =============================================================================
// Events
// =============================================================================

#[test]
fn events_carry_their_name_and_guard() {
    let f = fixture();
    let parsed = f.parser.parse_event("message containing \"ping\"").unwrap();
    assert_eq!(parsed.element.name, "message");
    let hit = Event::new("message").with_payload(Value::string("a PING!"));
    let miss = Event::new("message").with_payload(Value::string("pong"));
    assert!(parsed.element.guard.check(&hit));
    assert!(!parsed.element.guard.check(&miss));

    let parsed = f.parser.parse_event("command /help").unwrap();
    assert_eq!(parsed.element.name, "command");
    assert!(parsed.element.guard.check(&Event::new("command").with_payload(Value::string("/HELP me"))));
}

// =============================================================================
// Diagnostics
// =============================================================================

#[test]
fn unknown_statements_get_a_generic_message() {
    let f = fixture();
    let err = f.parser.parse_effect("dance wildly", &ParseScope::new()).unwrap_err();
    assert_eq!(err.quality, Quality::Generic);
    assert_eq!(err.message, "Can't understand this effect: 'dance wildly'");

    let err = f.parser.parse_event("lunch").unwrap_err();
    assert_eq!(err.message, "Can't understand this event: 'lunch'");
}

#[test]
fn rejected_matches_explain_themselves() {
    let f = fixture();
    let err = f.parser.parse_effect("reset {x}", &ParseScope::new()).unwrap_err();
    assert_eq!(err.quality, Quality::SemanticError);
    assert_eq!(
        err.message,
        "'reset {x}' is not possible: the target can't be changed that way"
    );

    let err = f
        .parser
        .parse_event("message containing \"%{x}%\"")
        .unwrap_err();
    assert_eq!(err.quality, Quality::SemanticError);
}

#[test]
fn parsing_is_deterministic() {
    let f = fixture();
    let scope = ParseScope::new();
    let text = "{x} is 1, 2 and 3";
    let first = f.parser.parse_condition(text, &scope).map(|p| format!("{:?}", p.element));
    for _ in 0..5 {
        let again = f.parser.parse_condition(text, &scope).map(|p| format!("{:?}", p.element));
        assert_eq!(again, first);
    }
}
