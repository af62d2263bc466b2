//! Expressions: arithmetic, ranges, counting, and event data.

use trellis_foundation::{Context, Result, TypeId, Value};
use trellis_parser::{Diagnostic, Expression, RegistryBuilder, RegistryError};

// =============================================================================
// Arithmetic
// =============================================================================

/// The binary operators, in pattern order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
}

impl Operator {
    const ALL: [Self; 4] = [Self::Add, Self::Subtract, Self::Multiply, Self::Divide];

    fn apply(self, left: &Value, right: &Value) -> Result<Value> {
        match self {
            Self::Add => left.add(right),
            Self::Subtract => left.sub(right),
            Self::Multiply => left.mul(right),
            Self::Divide => left.div(right),
        }
    }
}

/// `a + b`, `a - b`, `a * b`, `a / b`. Empty if either side is.
#[derive(Debug)]
pub struct Arithmetic {
    left: Box<dyn Expression>,
    right: Box<dyn Expression>,
    op: Operator,
}

impl Expression for Arithmetic {
    fn return_type(&self) -> TypeId {
        TypeId::NUMBER
    }

    fn is_single(&self) -> bool {
        true
    }

    fn get_all(&self, ctx: &Context) -> Result<Vec<Value>> {
        let (Some(left), Some(right)) = (self.left.get_single(ctx)?, self.right.get_single(ctx)?)
        else {
            return Ok(Vec::new());
        };
        Ok(vec![self.op.apply(&left, &right)?])
    }
}

// =============================================================================
// Ranges
// =============================================================================

/// Integers from one bound to another, inclusive, counting down if the
/// first bound is larger. Produced lazily.
#[derive(Debug)]
pub struct IntegerRange {
    from: Option<Box<dyn Expression>>,
    to: Box<dyn Expression>,
}

#[allow(clippy::cast_possible_truncation)]
fn bound(expr: &dyn Expression, ctx: &Context, round: fn(f64) -> f64) -> Result<Option<i64>> {
    Ok(expr.get_single(ctx)?.and_then(|v| match v {
        Value::Int(n) => Some(n),
        other => other.as_number().filter(|n| n.is_finite()).map(|n| round(n) as i64),
    }))
}

impl Expression for IntegerRange {
    fn return_type(&self) -> TypeId {
        TypeId::INTEGER
    }

    fn is_single(&self) -> bool {
        false
    }

    fn get_all(&self, ctx: &Context) -> Result<Vec<Value>> {
        Ok(self.iterate(ctx)?.collect())
    }

    fn iterate(&self, ctx: &Context) -> Result<Box<dyn Iterator<Item = Value> + Send>> {
        let from = match &self.from {
            Some(from) => bound(from.as_ref(), ctx, f64::ceil)?,
            None => Some(1),
        };
        let to = bound(self.to.as_ref(), ctx, f64::floor)?;
        Ok(match (from, to) {
            (Some(from), Some(to)) if from <= to => Box::new((from..=to).map(Value::Int)),
            (Some(from), Some(to)) if self.from.is_some() => {
                Box::new((to..=from).rev().map(Value::Int))
            }
            _ => Box::new(std::iter::empty()),
        })
    }
}

// =============================================================================
// Counting
// =============================================================================

/// The number of values an expression yields.
#[derive(Debug)]
pub struct Amount(Box<dyn Expression>);

impl Expression for Amount {
    fn return_type(&self) -> TypeId {
        TypeId::INTEGER
    }

    fn is_single(&self) -> bool {
        true
    }

    fn get_all(&self, ctx: &Context) -> Result<Vec<Value>> {
        let n = self.0.get_all(ctx)?.len();
        Ok(vec![Value::Int(i64::try_from(n).unwrap_or(i64::MAX))])
    }
}

// =============================================================================
// Event data
// =============================================================================

/// A piece of the current occurrence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventData {
    /// The payload, whatever its type.
    Payload,
    /// The payload of a `message` occurrence, as text.
    Message,
    /// The occurrence's name.
    Name,
}

impl Expression for EventData {
    fn return_type(&self) -> TypeId {
        match self {
            Self::Payload => TypeId::OBJECT,
            Self::Message | Self::Name => TypeId::STRING,
        }
    }

    fn is_single(&self) -> bool {
        true
    }

    fn get_all(&self, ctx: &Context) -> Result<Vec<Value>> {
        let event = ctx.event();
        Ok(match self {
            Self::Payload => event.payload().cloned().into_iter().collect(),
            Self::Message => event
                .payload()
                .filter(|v| v.as_str().is_some())
                .cloned()
                .into_iter()
                .collect(),
            Self::Name => vec![Value::string(event.name())],
        })
    }
}

pub(crate) fn register(builder: &mut RegistryBuilder) -> std::result::Result<(), RegistryError> {
    builder.register_expression(
        TypeId::NUMBER,
        &[
            "%number% + %number%",
            "%number% - %number%",
            "%number% \\* %number%",
            "%number% / %number%",
        ],
        |mut args| {
            let op = Operator::ALL
                .get(args.pattern())
                .copied()
                .ok_or_else(|| Diagnostic::semantic("unknown operator"))?;
            Ok(Box::new(Arithmetic {
                left: args.required(0)?,
                right: args.required(1)?,
                op,
            }))
        },
    )?;

    builder.register_expression(
        TypeId::INTEGER,
        &[
            "[the] integers (between|from) %number% (and|to) %number%",
            "%number% times",
        ],
        |mut args| {
            let range = if args.pattern() == 0 {
                IntegerRange {
                    from: Some(args.required(0)?),
                    to: args.required(1)?,
                }
            } else {
                IntegerRange {
                    from: None,
                    to: args.required(0)?,
                }
            };
            Ok(Box::new(range))
        },
    )?;

    builder.register_expression(
        TypeId::INTEGER,
        &["[the] (amount|number|size) of %objects%"],
        |mut args| Ok(Box::new(Amount(args.required(0)?))),
    )?;

    builder.register_expression(TypeId::OBJECT, &["[the] event-payload"], |_| {
        Ok(Box::new(EventData::Payload))
    })?;
    builder.register_expression(TypeId::STRING, &["[the] event-name"], |_| {
        Ok(Box::new(EventData::Name))
    })?;
    builder.register_expression(TypeId::STRING, &["[the] message"], |args| {
        if !args.scope().has_event("message") {
            return Err(Diagnostic::semantic(
                "'the message' can only be used in a message trigger",
            ));
        }
        Ok(Box::new(EventData::Message))
    })?;
    Ok(())
}
