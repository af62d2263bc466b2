//! Integration tests for Value and the small logic types.

use std::time::Duration;

use trellis_foundation::{ErrorKind, Kleenean, Time, TypeId, Value, format_timespan};

// =============================================================================
// Display
// =============================================================================

#[test]
fn values_display_the_way_scripts_write_them() {
    assert_eq!(Value::Int(42).to_string(), "42");
    assert_eq!(Value::Float(2.0).to_string(), "2");
    assert_eq!(Value::Float(2.5).to_string(), "2.5");
    assert_eq!(Value::string("plain").to_string(), "plain");
    assert_eq!(Value::Bool(true).to_string(), "true");
    assert_eq!(Value::Timespan(Duration::from_secs(90)).to_string(), "1 minute and 30 seconds");
}

#[test]
fn timespans_format_largest_unit_first() {
    assert_eq!(format_timespan(Duration::ZERO), "0 seconds");
    assert_eq!(format_timespan(Duration::from_secs(1)), "1 second");
    assert_eq!(
        format_timespan(Duration::from_millis(86_400_000 + 3_600_000 + 1_500)),
        "1 day, 1 hour, 1 second and 500 milliseconds"
    );
}

// =============================================================================
// Types
// =============================================================================

#[test]
fn values_know_their_most_specific_type() {
    assert_eq!(Value::Int(1).type_id(), TypeId::INTEGER);
    assert_eq!(Value::Float(1.5).type_id(), TypeId::NUMBER);
    assert_eq!(Value::string("x").type_id(), TypeId::STRING);
    assert_eq!(Value::Timespan(Duration::ZERO).type_id(), TypeId::TIMESPAN);
    assert!(TypeId::STRING.is_reserved());
    assert!(!TypeId::from_index(TypeId::RESERVED).is_reserved());
}

// =============================================================================
// Equality and ordering
// =============================================================================

#[test]
fn loose_equality_crosses_numeric_kinds_and_case() {
    assert!(Value::Int(3).loosely_equals(&Value::Float(3.0)));
    assert!(Value::string("Hello").loosely_equals(&Value::string("hELLO")));
    assert!(!Value::Int(3).loosely_equals(&Value::string("3")));
}

#[test]
fn comparison_only_between_comparable_kinds() {
    use std::cmp::Ordering;
    assert_eq!(Value::Int(1).compare(&Value::Float(1.5)), Some(Ordering::Less));
    assert_eq!(
        Value::Timespan(Duration::from_secs(2)).compare(&Value::Timespan(Duration::from_secs(1))),
        Some(Ordering::Greater)
    );
    assert_eq!(Value::Int(1).compare(&Value::string("1")), None);
}

// =============================================================================
// Arithmetic
// =============================================================================

#[test]
fn integer_arithmetic_stays_integral_when_exact() {
    assert_eq!(Value::Int(6).div(&Value::Int(3)).unwrap(), Value::Int(2));
    assert_eq!(Value::Int(7).div(&Value::Int(2)).unwrap(), Value::Float(3.5));
    assert_eq!(Value::Int(2).mul(&Value::Float(1.5)).unwrap(), Value::Float(3.0));
}

#[test]
fn division_by_zero_is_an_error() {
    let err = Value::Int(1).div(&Value::Int(0)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DivisionByZero));
    let err = Value::Float(1.0).div(&Value::Float(0.0)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DivisionByZero));
}

#[test]
fn mismatched_arithmetic_names_the_offending_type() {
    let err = Value::Int(1).sub(&Value::Bool(true)).unwrap_err();
    assert_eq!(err.to_string(), "type mismatch: expected number, got boolean");
}

#[test]
fn timespans_add_and_saturate() {
    let a = Value::Timespan(Duration::from_secs(1));
    let b = Value::Timespan(Duration::from_secs(2));
    assert_eq!(a.add(&b).unwrap(), Value::Timespan(Duration::from_secs(3)));
    assert_eq!(a.sub(&b).unwrap(), Value::Timespan(Duration::ZERO));
}

// =============================================================================
// Kleenean and Time
// =============================================================================

#[test]
fn kleenean_truth_tables() {
    use Kleenean::{False, True, Unknown};
    assert_eq!(False.or(Unknown), Unknown);
    assert_eq!(True.or(Unknown), True);
    assert_eq!(True.and(Unknown), Unknown);
    assert_eq!(False.and(Unknown), False);
    assert!(Unknown.is_possible());
    assert!(!False.is_possible());
    assert_eq!(Kleenean::from(true), True);
}

#[test]
fn time_markers() {
    for time in [Time::Past, Time::Present, Time::Future] {
        assert_eq!(Time::from_marker(time.marker()), Some(time));
    }
    assert_eq!(Time::from_marker(2), None);
}
