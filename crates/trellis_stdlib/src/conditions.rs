//! Conditions: `is set`, comparisons, equality and event cancellation.

use std::cmp::Ordering;

use trellis_foundation::{Context, Result, Value};
use trellis_parser::{Condition, Expression, RegistryBuilder, RegistryError, check_values};

const NOT: i32 = 1;
const LESS: i32 = 2;
const GREATER: i32 = 4;
const OR_EQUAL: i32 = 8;

/// `x is set`: true if the expression yields any value.
#[derive(Debug)]
pub struct IsSet {
    expr: Box<dyn Expression>,
    negated: bool,
}

impl Condition for IsSet {
    fn check(&self, ctx: &Context) -> Result<bool> {
        let set = !self.expr.get_array(ctx)?.is_empty();
        Ok(set != self.negated)
    }
}

/// The relation a [`Compare`] tests for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    /// Loose equality.
    Equal,
    /// Strictly less, or less-or-equal.
    Less {
        /// Accept equal values.
        or_equal: bool,
    },
    /// Strictly greater, or greater-or-equal.
    Greater {
        /// Accept equal values.
        or_equal: bool,
    },
}

impl Relation {
    fn from_mark(mark: i32) -> Self {
        let or_equal = mark & OR_EQUAL != 0;
        if mark & LESS != 0 {
            Self::Less { or_equal }
        } else if mark & GREATER != 0 {
            Self::Greater { or_equal }
        } else {
            Self::Equal
        }
    }

    fn holds(self, left: &Value, right: &Value) -> bool {
        match self {
            Self::Equal => left.loosely_equals(right),
            Self::Less { or_equal } => match left.compare(right) {
                Some(Ordering::Less) => true,
                Some(Ordering::Equal) => or_equal,
                _ => false,
            },
            Self::Greater { or_equal } => match left.compare(right) {
                Some(Ordering::Greater) => true,
                Some(Ordering::Equal) => or_equal,
                _ => false,
            },
        }
    }
}

/// Compares two lists, each with its own and/or semantics:
/// `a and b is c or d` holds if every left value matches some right value.
#[derive(Debug)]
pub struct Compare {
    left: Box<dyn Expression>,
    right: Box<dyn Expression>,
    relation: Relation,
    negated: bool,
}

impl Condition for Compare {
    fn check(&self, ctx: &Context) -> Result<bool> {
        let right = self.right.get_all(ctx)?;
        if right.is_empty() {
            return Ok(false);
        }
        let all = self.right.is_and();
        check_values(self.left.as_ref(), ctx, self.negated, |l| {
            let matches = |r: &Value| self.relation.holds(l, r);
            if all {
                right.iter().all(matches)
            } else {
                right.iter().any(matches)
            }
        })
    }
}

/// `[the] event is [not] cancelled`.
#[derive(Debug)]
pub struct IsCancelled {
    negated: bool,
}

impl Condition for IsCancelled {
    fn check(&self, ctx: &Context) -> Result<bool> {
        Ok(ctx.event().is_cancelled() != self.negated)
    }
}

pub(crate) fn register(builder: &mut RegistryBuilder) -> std::result::Result<(), RegistryError> {
    builder.register_condition(&["%objects% (is|are) [1¦not] set"], |mut args| {
        Ok(Box::new(IsSet {
            negated: args.mark() & NOT != 0,
            expr: args.required(0)?,
        }))
    })?;

    builder.register_condition(&["[the] event (is|was) [1¦not] cancel[l]ed"], |args| {
        Ok(Box::new(IsCancelled {
            negated: args.mark() & NOT != 0,
        }))
    })?;

    builder.register_condition(
        &[
            "%objects% (is|are) [1¦not] (2¦less|4¦greater) than [8¦or equal to] %objects%",
            "%objects% (is|are) [1¦not] [equal to] %objects%",
            "%objects% (10¦\\<=|12¦\\>=|2¦\\<|4¦\\>|=|1¦!=) %objects%",
        ],
        |mut args| {
            let mark = args.mark();
            Ok(Box::new(Compare {
                left: args.required(0)?,
                right: args.required(1)?,
                relation: Relation::from_mark(mark),
                negated: mark & NOT != 0,
            }))
        },
    )?;
    Ok(())
}
