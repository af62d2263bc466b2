//! Literal parsers and converters for the reserved types.

#![allow(clippy::unnecessary_wraps)]

use std::time::Duration;

use trellis_foundation::{TypeId, Value};
use trellis_parser::{RegistryBuilder, RegistryError};

// =============================================================================
// Literal parsers
// =============================================================================

/// Parses `12`, `-3` or `2.5`. Integers stay integers.
#[must_use]
pub fn parse_number(text: &str) -> Option<Value> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let well_formed = !digits.is_empty()
        && !digits.starts_with('.')
        && !digits.ends_with('.')
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.');
    if !well_formed {
        return None;
    }
    text.parse::<i64>()
        .map(Value::Int)
        .ok()
        .or_else(|| text.parse::<f64>().ok().map(Value::Float))
}

/// Parses an integer literal.
#[must_use]
pub fn parse_integer(text: &str) -> Option<Value> {
    match parse_number(text)? {
        v @ Value::Int(_) => Some(v),
        _ => None,
    }
}

/// Parses `true`/`yes`/`on` and `false`/`no`/`off`.
#[must_use]
pub fn parse_boolean(text: &str) -> Option<Value> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(Value::Bool(true)),
        "false" | "no" | "off" => Some(Value::Bool(false)),
        _ => None,
    }
}

const UNITS: [(&str, &str, u64); 6] = [
    ("tick", "ticks", 50),
    ("millisecond", "milliseconds", 1),
    ("second", "seconds", 1_000),
    ("minute", "minutes", 60_000),
    ("hour", "hours", 3_600_000),
    ("day", "days", 86_400_000),
];

/// Parses durations such as `2 seconds`, `an hour`, `1.5 minutes` or
/// `1 minute and 30 seconds`.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_timespan(text: &str) -> Option<Value> {
    let mut total_ms = 0.0_f64;
    for part in text.split(" and ").flat_map(|p| p.split(", ")) {
        let (amount, unit) = part.trim().split_once(char::is_whitespace)?;
        let amount = match amount.to_ascii_lowercase().as_str() {
            "a" | "an" => 1.0,
            n => n.parse::<f64>().ok().filter(|n| n.is_finite() && *n >= 0.0)?,
        };
        let unit = unit.trim().to_ascii_lowercase();
        let &(_, _, ms) = UNITS
            .iter()
            .find(|(singular, plural, _)| unit == *singular || unit == *plural)?;
        total_ms += amount * ms as f64;
    }
    if !total_ms.is_finite() || total_ms > u64::MAX as f64 {
        return None;
    }
    Some(Value::Timespan(Duration::from_millis(total_ms.round() as u64)))
}

// =============================================================================
// Converters
// =============================================================================

fn to_text(value: &Value) -> Option<Value> {
    Some(Value::string(value.to_string()))
}

fn text_to_number(value: &Value) -> Option<Value> {
    parse_number(value.as_str()?.trim())
}

#[allow(clippy::cast_possible_truncation)]
fn number_to_integer(value: &Value) -> Option<Value> {
    match value {
        Value::Int(_) => Some(value.clone()),
        Value::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Some(Value::Int(*f as i64)),
        _ => None,
    }
}

/// Installs the literal parsers and converters.
pub(crate) fn register(builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
    builder.set_literal_parser(TypeId::NUMBER, parse_number)?;
    builder.set_literal_parser(TypeId::INTEGER, parse_integer)?;
    builder.set_literal_parser(TypeId::BOOLEAN, parse_boolean)?;
    builder.set_literal_parser(TypeId::TIMESPAN, parse_timespan)?;

    for from in [TypeId::NUMBER, TypeId::INTEGER, TypeId::BOOLEAN, TypeId::TIMESPAN] {
        builder.register_converter(from, TypeId::STRING, to_text)?;
    }
    builder.register_converter(TypeId::STRING, TypeId::NUMBER, text_to_number)?;
    builder.register_converter(TypeId::NUMBER, TypeId::INTEGER, number_to_integer)?;
    Ok(())
}
