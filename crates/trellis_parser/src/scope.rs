//! Parse scope: what encloses the text being parsed.
//!
//! The loader pushes a frame for every section it enters, so that elements
//! can check where they are at parse time (`loop-value` outside a loop, or
//! `stop 3 loops` inside two, are parse errors), and tracks the delay hint.

use std::fmt;
use std::sync::Arc;

use trellis_foundation::{Context, Kleenean, TypeId, Value};

/// Kind of an enclosing section.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// `if` / `else if` / `else`.
    Conditional,
    /// `loop <expression>`.
    Loop,
    /// `while <condition>`.
    While,
}

impl SectionKind {
    /// True for sections that repeat.
    #[must_use]
    pub fn is_loop(self) -> bool {
        matches!(self, Self::Loop | Self::While)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Conditional => "conditional",
            Self::Loop => "loop",
            Self::While => "while",
        })
    }
}

/// Per-context state of a loop, readable by the expressions in its body.
pub trait LoopValueSource: Send + Sync + fmt::Debug {
    /// The value of the current iteration.
    fn current(&self, ctx: &Context) -> Option<Value>;

    /// The 1-based number of the current iteration.
    fn iteration(&self, ctx: &Context) -> Option<u64>;

    /// Type of the looped values.
    fn value_type(&self) -> TypeId;
}

/// One enclosing section.
#[derive(Clone, Debug)]
pub struct SectionFrame {
    /// What kind of section this is.
    pub kind: SectionKind,
    /// The loop state, for `loop` sections.
    pub source: Option<Arc<dyn LoopValueSource>>,
}

/// The scope a piece of text is parsed in.
#[derive(Clone, Debug, Default)]
pub struct ParseScope {
    /// Whether a delay may already have happened.
    pub delayed: Kleenean,
    sections: Vec<SectionFrame>,
    events: Vec<String>,
}

impl ParseScope {
    /// Creates an empty top-level scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scope for the body of a trigger on the given events.
    #[must_use]
    pub fn for_events(events: &[String]) -> Self {
        Self {
            events: events.to_vec(),
            ..Self::default()
        }
    }

    /// The names of the events the enclosing trigger reacts to.
    #[must_use]
    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// True if the enclosing trigger reacts to `name`.
    #[must_use]
    pub fn has_event(&self, name: &str) -> bool {
        self.events.iter().any(|e| e.eq_ignore_ascii_case(name))
    }

    /// Enters a section.
    pub fn push(&mut self, frame: SectionFrame) {
        self.sections.push(frame);
    }

    /// Leaves the innermost section.
    pub fn pop(&mut self) -> Option<SectionFrame> {
        self.sections.pop()
    }

    /// Enclosing sections, innermost first.
    pub fn sections(&self) -> impl Iterator<Item = &SectionFrame> {
        self.sections.iter().rev()
    }

    /// Nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.sections.len()
    }

    /// Number of enclosing sections matching `filter`.
    #[must_use]
    pub fn count(&self, filter: impl Fn(SectionKind) -> bool) -> usize {
        self.sections.iter().filter(|s| filter(s.kind)).count()
    }

    /// The `n`-th enclosing `loop` section (1 = innermost) with a value
    /// source, optionally restricted to loops over a type.
    #[must_use]
    pub fn loop_source(&self, n: usize, ty: Option<TypeId>) -> Option<&Arc<dyn LoopValueSource>> {
        self.sections()
            .filter_map(|s| s.source.as_ref())
            .filter(|s| ty.is_none_or(|t| s.value_type() == t))
            .nth(n.checked_sub(1)?)
    }
}
