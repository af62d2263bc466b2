//! Syntax elements and their construction.
//!
//! A successful pattern match hands its bound sub-expressions, the pattern
//! index, the delay hint and the match metadata to the registered factory as
//! [`InitArgs`]. The factory either builds the element or rejects the match
//! with a [`Diagnostic`], in which case matching continues with the next
//! pattern.

use std::fmt;
use std::sync::Arc;

use trellis_foundation::{
    ChangeMode, Context, Error, Event, Kleenean, Result, Time, TypeId, Value,
};

use crate::diagnostic::Diagnostic;
use crate::scope::ParseScope;
use crate::types::TypeSystem;

// =============================================================================
// Element traits
// =============================================================================

/// A boolean test evaluated against a context.
pub trait Condition: Send + Sync + fmt::Debug {
    /// Evaluates the condition.
    fn check(&self, ctx: &Context) -> Result<bool>;
}

/// A side-effecting statement.
pub trait Effect: Send + Sync + fmt::Debug {
    /// Runs the effect.
    fn execute(&self, ctx: &Context) -> Result<()>;
}

/// Filters the occurrences a trigger reacts to.
pub trait EventGuard: Send + Sync + fmt::Debug {
    /// Returns true if the trigger should run for this occurrence.
    fn check(&self, event: &Event) -> bool {
        let _ = event;
        true
    }
}

/// A producer of zero or more values of one type.
///
/// Single access ([`get_single`](Self::get_single)) is only valid when
/// [`is_single`](Self::is_single) is true; the resolver rejects multi-valued
/// expressions in single-valued places at parse time.
pub trait Expression: Send + Sync + fmt::Debug {
    /// The type every produced value belongs to.
    fn return_type(&self) -> TypeId;

    /// True if this expression never yields more than one value.
    fn is_single(&self) -> bool;

    /// Every value this expression stands for.
    fn get_all(&self, ctx: &Context) -> Result<Vec<Value>>;

    /// The values a consumer should act on. For "or" lists this is a single
    /// member's values; otherwise the same as [`get_all`](Self::get_all).
    fn get_array(&self, ctx: &Context) -> Result<Vec<Value>> {
        self.get_all(ctx)
    }

    /// The single value, if any.
    fn get_single(&self, ctx: &Context) -> Result<Option<Value>> {
        let mut values = self.get_array(ctx)?;
        match values.len() {
            0 | 1 => Ok(values.pop()),
            n => Err(Error::new(trellis_foundation::ErrorKind::NotSingle(n))),
        }
    }

    /// Iterates the values lazily where the expression can.
    fn iterate(&self, ctx: &Context) -> Result<Box<dyn Iterator<Item = Value> + Send>> {
        Ok(Box::new(self.get_all(ctx)?.into_iter()))
    }

    /// True for "and" semantics, false for "or" semantics.
    fn is_and(&self) -> bool {
        true
    }

    /// The temporal state this expression reads.
    fn time(&self) -> Time {
        Time::Present
    }

    /// Binds the expression to a temporal state. Returns false if it has no
    /// such state.
    fn set_time(&mut self, time: Time) -> bool {
        time == Time::Present
    }

    /// The fixed values, if this is a literal.
    fn literal_values(&self) -> Option<&[Value]> {
        None
    }

    /// The delta types accepted for a change, or `None` if the change is not
    /// supported.
    fn accept_change(&self, mode: ChangeMode) -> Option<Vec<TypeId>> {
        let _ = mode;
        None
    }

    /// Applies a change.
    fn change(&self, ctx: &Context, delta: &[Value], mode: ChangeMode) -> Result<()> {
        let _ = (ctx, delta);
        Err(Error::unsupported_change(mode, format!("{self:?}")))
    }
}

/// Tests a predicate over an expression's values with its and/or semantics.
///
/// "and" requires every value to pass, "or" requires one. `negated` flips
/// each individual test, so `a and b is not x` means neither is `x`. An
/// expression without values never passes.
pub fn check_values(
    expr: &dyn Expression,
    ctx: &Context,
    negated: bool,
    mut predicate: impl FnMut(&Value) -> bool,
) -> Result<bool> {
    let values = expr.get_all(ctx)?;
    if values.is_empty() {
        return Ok(false);
    }
    let mut test = |v: &Value| predicate(v) != negated;
    Ok(if expr.is_and() {
        values.iter().all(&mut test)
    } else {
        values.iter().any(&mut test)
    })
}

// =============================================================================
// Construction
// =============================================================================

/// The text captured by an inline regex, with its groups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegexMatch {
    groups: Vec<Option<String>>,
}

impl RegexMatch {
    pub(crate) fn from_captures(captures: &regex::Captures<'_>) -> Self {
        Self {
            groups: captures
                .iter()
                .map(|g| g.map(|m| m.as_str().to_string()))
                .collect(),
        }
    }

    /// The whole matched text.
    #[must_use]
    pub fn text(&self) -> &str {
        self.group(0).unwrap_or_default()
    }

    /// A capture group; 0 is the whole match.
    #[must_use]
    pub fn group(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|g| g.as_deref())
    }
}

/// Metadata of a successful match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchInfo {
    /// XOR of the marks of every taken alternative.
    pub mark: i32,
    /// Inline regex results, left to right.
    pub regexes: Vec<RegexMatch>,
    /// The matched text.
    pub text: String,
}

/// Everything a factory gets to build an element from a match.
pub struct InitArgs<'a> {
    exprs: Vec<Option<Box<dyn Expression>>>,
    pattern: usize,
    info: MatchInfo,
    scope: &'a ParseScope,
    types: &'a Arc<TypeSystem>,
}

impl<'a> InitArgs<'a> {
    pub(crate) fn new(
        exprs: Vec<Option<Box<dyn Expression>>>,
        pattern: usize,
        info: MatchInfo,
        scope: &'a ParseScope,
        types: &'a Arc<TypeSystem>,
    ) -> Self {
        Self {
            exprs,
            pattern,
            info,
            scope,
            types,
        }
    }

    /// Number of placeholders in the matched pattern.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    /// True if the matched pattern has no placeholders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Index of the matched pattern within its syntax.
    #[must_use]
    pub fn pattern(&self) -> usize {
        self.pattern
    }

    /// The combined mark.
    #[must_use]
    pub fn mark(&self) -> i32 {
        self.info.mark
    }

    /// Whether a delay may already have happened before this element runs.
    #[must_use]
    pub fn delayed(&self) -> Kleenean {
        self.scope.delayed
    }

    /// The match metadata.
    #[must_use]
    pub fn info(&self) -> &MatchInfo {
        &self.info
    }

    /// The inline regex result at `index`.
    #[must_use]
    pub fn regex(&self, index: usize) -> Option<&RegexMatch> {
        self.info.regexes.get(index)
    }

    /// The enclosing parse scope.
    #[must_use]
    pub fn scope(&self) -> &'a ParseScope {
        self.scope
    }

    /// The frozen type system, for elements that convert at run time.
    #[must_use]
    pub fn types(&self) -> &'a Arc<TypeSystem> {
        self.types
    }

    /// True if slot `index` is bound.
    #[must_use]
    pub fn has(&self, index: usize) -> bool {
        self.exprs.get(index).is_some_and(Option::is_some)
    }

    /// Takes the expression bound to slot `index`, if any.
    pub fn take(&mut self, index: usize) -> Option<Box<dyn Expression>> {
        self.exprs.get_mut(index).and_then(Option::take)
    }

    /// Takes the expression bound to slot `index`, failing if it is unbound.
    pub fn required(&mut self, index: usize) -> std::result::Result<Box<dyn Expression>, Diagnostic> {
        self.take(index).ok_or_else(|| {
            Diagnostic::semantic(format!(
                "'{}' is missing a required value",
                self.info.text
            ))
        })
    }
}

impl fmt::Debug for InitArgs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitArgs")
            .field("exprs", &self.exprs)
            .field("pattern", &self.pattern)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Result type of factories.
pub type InitResult<T> = std::result::Result<T, Diagnostic>;

/// Builds a condition from a match.
pub type ConditionFactory =
    Box<dyn Fn(InitArgs<'_>) -> InitResult<Box<dyn Condition>> + Send + Sync>;

/// Builds an effect from a match.
pub type EffectFactory = Box<dyn Fn(InitArgs<'_>) -> InitResult<Box<dyn Effect>> + Send + Sync>;

/// Builds an expression from a match.
pub type ExpressionFactory =
    Box<dyn Fn(InitArgs<'_>) -> InitResult<Box<dyn Expression>> + Send + Sync>;

/// Builds an event guard from a match.
pub type EventFactory =
    Box<dyn Fn(InitArgs<'_>) -> InitResult<Box<dyn EventGuard>> + Send + Sync>;
