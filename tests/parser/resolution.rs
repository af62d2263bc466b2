//! Integration tests for expression resolution with the standard registry.

use std::sync::Arc;
use std::time::Duration;

use trellis_foundation::{Context, TypeId, Value};
use trellis_parser::{Expression, ParseScope, ParserConfig, Parsed, Quality, SyntaxParser};
use trellis_stdlib::{Outbox, standard_registry};
use trellis_storage::MemoryStore;

// =============================================================================
// Helper Functions
// =============================================================================

fn parser_with(config: ParserConfig) -> SyntaxParser {
    let registry = standard_registry(&Outbox::new()).unwrap();
    SyntaxParser::with_config(Arc::new(registry), Arc::new(MemoryStore::new()), config)
}

fn parse(text: &str, ty: TypeId) -> Parsed<Box<dyn Expression>> {
    parser_with(ParserConfig::default())
        .parse_expression(text, &[ty], &ParseScope::new())
        .unwrap_or_else(|d| panic!("'{text}' failed: {d}"))
}

fn values(expr: &dyn Expression) -> Vec<Value> {
    expr.get_all(&Context::for_event("test")).unwrap()
}

// =============================================================================
// Literals
// =============================================================================

#[test]
fn literals_parse_with_their_type() {
    assert_eq!(values(&*parse("42", TypeId::NUMBER).element), [Value::Int(42)]);
    assert_eq!(values(&*parse("yes", TypeId::BOOLEAN).element), [Value::Bool(true)]);
    assert_eq!(
        values(&*parse("1 minute and 30 seconds", TypeId::TIMESPAN).element),
        [Value::Timespan(Duration::from_secs(90))]
    );
}

#[test]
fn quoted_text_is_a_literal_unless_it_has_expressions() {
    let plain = parse(r#""a, b and c""#, TypeId::STRING).element;
    assert_eq!(plain.literal_values(), Some(&[Value::string("a, b and c")][..]));

    let template = parse(r#""sum: %2 + 3%""#, TypeId::STRING).element;
    assert!(template.literal_values().is_none());
    assert_eq!(values(&*template), [Value::string("sum: 5")]);
}

// =============================================================================
// Registered Expressions
// =============================================================================

#[test]
fn arithmetic_binds_left_to_right_and_by_longest_span() {
    assert_eq!(values(&*parse("2 * 3 + 4", TypeId::NUMBER).element), [Value::Int(10)]);
    assert_eq!(values(&*parse("10 - 2 - 3", TypeId::NUMBER).element), [Value::Int(5)]);
    assert_eq!(values(&*parse("(1 + 2) * 3", TypeId::NUMBER).element), [Value::Int(9)]);
}

#[test]
fn integer_ranges_are_lazy_lists() {
    let range = parse("the integers between 3 and 1", TypeId::INTEGER).element;
    assert!(!range.is_single());
    assert_eq!(values(&*range), [Value::Int(3), Value::Int(2), Value::Int(1)]);
    let counted: Vec<Value> = range.iterate(&Context::for_event("test")).unwrap().collect();
    assert_eq!(counted.len(), 3);
}

#[test]
fn one_conversion_is_applied_where_needed() {
    let number = parse(r#""12""#, TypeId::NUMBER).element;
    assert_eq!(number.return_type(), TypeId::NUMBER);
    assert_eq!(values(&*number), [Value::Int(12)]);

    let text = parse("1 + 2", TypeId::STRING).element;
    assert_eq!(text.return_type(), TypeId::STRING);
    assert_eq!(values(&*text), [Value::string("3")]);
}

// =============================================================================
// Lists
// =============================================================================

#[test]
fn and_or_and_comma_lists() {
    let and = parse("1, 2 and 3", TypeId::NUMBER);
    assert!(and.element.is_and());
    assert!(and.warnings.is_empty());

    let or = parse("1, 2 or 3", TypeId::NUMBER);
    assert!(!or.element.is_and());
    assert_eq!(or.element.get_single(&Context::for_event("test")).unwrap(), Some(Value::Int(1)));

    let commas = parse("1, 2, 3", TypeId::NUMBER);
    assert!(commas.element.is_and());
    assert_eq!(commas.warnings.len(), 1);

    let mixed = parse("1 and 2 or 3", TypeId::NUMBER);
    assert!(mixed.element.is_and());
    assert_eq!(mixed.warnings.len(), 1);
}

#[test]
fn quiet_configuration_raises_no_list_warnings() {
    let parser = parser_with(ParserConfig::quiet());
    let scope = ParseScope::new();
    for text in ["1, 2, 3", "1 and 2 or 3"] {
        let parsed = parser.parse_expression(text, &[TypeId::NUMBER], &scope).unwrap();
        assert!(parsed.warnings.is_empty(), "{text}");
    }
}

#[test]
fn lists_longer_than_the_limit_are_rejected() {
    let parser = parser_with(ParserConfig::default().with_max_list_len(3));
    let scope = ParseScope::new();
    assert!(parser.parse_expression("1, 2 and 3", &[TypeId::NUMBER], &scope).is_ok());
    let err = parser
        .parse_expression("1, 2, 3 and 4", &[TypeId::NUMBER], &scope)
        .unwrap_err();
    assert_eq!(err.quality, Quality::SemanticError);
}

#[test]
fn list_members_may_be_expressions() {
    let list = parse("1 + 1, {unset} and 5", TypeId::NUMBER).element;
    assert!(list.literal_values().is_none());
    assert_eq!(values(&*list), [Value::Int(2), Value::Int(5)]);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn unknown_text_names_the_wanted_type() {
    let parser = parser_with(ParserConfig::default());
    let err = parser
        .parse_expression("banana", &[TypeId::NUMBER], &ParseScope::new())
        .unwrap_err();
    assert_eq!(err.quality, Quality::NotAnExpression);
    assert_eq!(err.message, "'banana' is not a number");
}

#[test]
fn event_dependent_expressions_check_the_scope() {
    let parser = parser_with(ParserConfig::default());
    let err = parser
        .parse_expression("the message", &[TypeId::STRING], &ParseScope::new())
        .unwrap_err();
    assert_eq!(err.quality, Quality::SemanticError);

    let scope = ParseScope::for_events(&["message".to_string()]);
    assert!(parser.parse_expression("the message", &[TypeId::STRING], &scope).is_ok());
}
