//! Core value type for all Trellis data.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, ErrorKind};
use crate::types::TypeId;
use crate::Result;

/// Core value type for all Trellis data.
///
/// Values are immutable and cheaply cloneable.
#[derive(Clone)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    String(Arc<str>),
    /// A duration.
    Timespan(Duration),
    /// A host value of a registered type.
    Object(Object),
}

/// A host value the core never looks inside.
///
/// Objects carry the [`TypeId`] they were registered under and a display
/// label; two objects are equal when they share the same payload allocation.
#[derive(Clone)]
pub struct Object {
    type_id: TypeId,
    label: Arc<str>,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Object {
    /// Wraps a host payload.
    pub fn new<T: Any + Send + Sync>(type_id: TypeId, label: impl Into<Arc<str>>, payload: T) -> Self {
        Self {
            type_id,
            label: label.into(),
            payload: Arc::new(payload),
        }
    }

    /// Returns the registered type of this object.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Downcasts the payload.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl Value {
    /// Creates a string value.
    #[must_use]
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Self::String(s.into())
    }

    /// Returns the most specific type of this value.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        match self {
            Self::Bool(_) => TypeId::BOOLEAN,
            Self::Int(_) => TypeId::INTEGER,
            Self::Float(_) => TypeId::NUMBER,
            Self::String(_) => TypeId::STRING,
            Self::Timespan(_) => TypeId::TIMESPAN,
            Self::Object(o) => o.type_id,
        }
    }

    /// Attempts to extract a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a number as f64 (converts int to float).
    ///
    /// Note: Converting large i64 values to f64 may lose precision.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a duration.
    #[must_use]
    pub const fn as_timespan(&self) -> Option<Duration> {
        match self {
            Self::Timespan(d) => Some(*d),
            _ => None,
        }
    }

    /// Attempts to extract a host object.
    #[must_use]
    pub const fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Equality as scripts see it: numbers compare by value across
    /// integer/float, strings compare case-insensitively.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn loosely_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => {
                (*a as f64 - b).abs() < f64::EPSILON
            }
            (Self::String(a), Self::String(b)) => a.eq_ignore_ascii_case(b),
            _ => self == other,
        }
    }

    /// Adds two values.
    pub fn add(&self, other: &Self) -> Result<Value> {
        match (self, other) {
            (Self::Int(x), Self::Int(y)) => Ok(Self::Int(x.wrapping_add(*y))),
            (Self::Timespan(x), Self::Timespan(y)) => Ok(Self::Timespan(x.saturating_add(*y))),
            (Self::String(x), Self::String(y)) => Ok(Self::String(format!("{x}{y}").into())),
            _ => Self::float_op(self, other, |x, y| x + y),
        }
    }

    /// Subtracts two values.
    pub fn sub(&self, other: &Self) -> Result<Value> {
        match (self, other) {
            (Self::Int(x), Self::Int(y)) => Ok(Self::Int(x.wrapping_sub(*y))),
            (Self::Timespan(x), Self::Timespan(y)) => Ok(Self::Timespan(x.saturating_sub(*y))),
            _ => Self::float_op(self, other, |x, y| x - y),
        }
    }

    /// Multiplies two values.
    pub fn mul(&self, other: &Self) -> Result<Value> {
        match (self, other) {
            (Self::Int(x), Self::Int(y)) => Ok(Self::Int(x.wrapping_mul(*y))),
            _ => Self::float_op(self, other, |x, y| x * y),
        }
    }

    /// Divides two values.
    ///
    /// Integer division that does not divide evenly produces a float.
    #[allow(clippy::cast_precision_loss)]
    pub fn div(&self, other: &Self) -> Result<Value> {
        match (self, other) {
            (Self::Int(_) | Self::Float(_), Self::Int(0)) => {
                Err(Error::new(ErrorKind::DivisionByZero))
            }
            (_, Self::Float(y)) if *y == 0.0 => Err(Error::new(ErrorKind::DivisionByZero)),
            (Self::Int(x), Self::Int(y)) => match x.checked_rem(*y) {
                Some(0) => x
                    .checked_div(*y)
                    .map(Self::Int)
                    .ok_or_else(|| Error::new(ErrorKind::Overflow)),
                Some(_) => Self::float_op(self, other, |x, y| x / y),
                None => Err(Error::new(ErrorKind::Overflow)),
            },
            _ => Self::float_op(self, other, |x, y| x / y),
        }
    }

    fn float_op(a: &Self, b: &Self, op: impl FnOnce(f64, f64) -> f64) -> Result<Value> {
        match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => Ok(Self::Float(op(x, y))),
            (None, _) => Err(Error::type_mismatch("number", a.type_name())),
            (_, None) => Err(Error::type_mismatch("number", b.type_name())),
        }
    }

    /// Compares two values, if they are comparable.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        self.partial_cmp(other)
    }

    /// Returns a human name of this value's built-in kind.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "number",
            Self::String(_) => "text",
            Self::Timespan(_) => "timespan",
            Self::Object(_) => "object",
        }
    }
}

// Implement PartialEq manually to handle float comparison
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Timespan(a), Self::Timespan(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Bool(b) => b.hash(state),
            Self::Int(n) => n.hash(state),
            Self::Float(n) => n.to_bits().hash(state),
            Self::String(s) => s.hash(state),
            Self::Timespan(d) => d.hash(state),
            Self::Object(o) => o.hash(state),
        }
    }
}

impl PartialOrd for Value {
    #[allow(clippy::cast_precision_loss)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Int(b)) => a.partial_cmp(b),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            // Cross-type numeric comparison intentionally loses precision for large i64
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::String(a), Self::String(b)) => a.partial_cmp(b),
            (Self::Timespan(a), Self::Timespan(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        std::ptr::hash(Arc::as_ptr(&self.payload).cast::<u8>(), state);
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{:?} {}>", self.type_id, self.label)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Timespan(d) => write!(f, "{d:?}"),
            Self::Object(o) => write!(f, "{o:?}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{n:.0}")
                } else {
                    write!(f, "{n}")
                }
            }
            Self::String(s) => write!(f, "{s}"),
            Self::Timespan(d) => write!(f, "{}", format_timespan(*d)),
            Self::Object(o) => write!(f, "{}", o.label),
        }
    }
}

/// Formats a duration the way scripts write them (`1 minute and 30 seconds`).
#[must_use]
pub fn format_timespan(d: Duration) -> String {
    const UNITS: [(&str, u128); 4] = [
        ("day", 86_400_000),
        ("hour", 3_600_000),
        ("minute", 60_000),
        ("second", 1_000),
    ];

    let mut millis = d.as_millis();
    if millis == 0 {
        return "0 seconds".to_string();
    }

    let mut parts = Vec::new();
    for (name, size) in UNITS {
        let count = millis / size;
        if count > 0 {
            millis -= count * size;
            let plural = if count == 1 { "" } else { "s" };
            parts.push(format!("{count} {name}{plural}"));
        }
    }
    if millis > 0 {
        parts.push(format!("{millis} milliseconds"));
    }

    match parts.len() {
        1 => parts.remove(0),
        _ => {
            let last = parts.pop().unwrap_or_default();
            format!("{} and {last}", parts.join(", "))
        }
    }
}

// Convenience From implementations

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Self::Timespan(d)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Self::Object(o)
    }
}
