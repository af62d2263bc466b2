//! Control statements the engine implements itself: delays and exits.
//!
//! These are matched with the same pattern notation as registered syntax but
//! build graph nodes rather than elements, so they live in their own table.

use std::fmt;

use trellis_parser::{Diagnostic, Expression, InitArgs, InitResult, RegistryError, SyntaxInfo, TypeSystem};

use crate::graph::{ExitKind, ExitTarget};

/// A parsed control statement.
pub enum Control {
    /// Suspend for the duration the expression yields.
    Delay(Box<dyn Expression>),
    /// Leave sections or the whole trigger.
    Exit(ExitTarget),
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delay(d) => f.debug_tuple("Delay").field(d).finish(),
            Self::Exit(t) => f.debug_tuple("Exit").field(t).finish(),
        }
    }
}

/// Builds a [`Control`] from a match.
pub type ControlFactory = Box<dyn Fn(InitArgs<'_>) -> InitResult<Control> + Send + Sync>;

/// The control statement syntaxes.
#[derive(Debug)]
pub struct ControlSyntaxes {
    syntaxes: Vec<SyntaxInfo<ControlFactory>>,
}

impl ControlSyntaxes {
    /// Compiles the control syntaxes against a type system.
    ///
    /// # Errors
    ///
    /// Returns an error if the type system lacks the reserved types.
    pub fn new(types: &TypeSystem) -> Result<Self, RegistryError> {
        let delay: ControlFactory = Box::new(|mut args| Ok(Control::Delay(args.required(0)?)));
        let exit: ControlFactory = Box::new(exit);
        Ok(Self {
            syntaxes: vec![
                SyntaxInfo::new(&["(wait|halt) [for] %timespan%"], types, delay)?,
                SyntaxInfo::new(
                    &[
                        "(stop|exit) [[the] trigger]",
                        "(stop|exit) [(the|this)] (1¦loop|2¦section|3¦conditional)",
                        "(stop|exit) <\\d+> (1¦loop[s]|2¦section[s]|3¦conditional[s])",
                    ],
                    types,
                    exit,
                )?,
            ],
        })
    }

    /// The syntaxes, in matching order.
    #[must_use]
    pub fn syntaxes(&self) -> &[SyntaxInfo<ControlFactory>] {
        &self.syntaxes
    }
}

fn exit(args: InitArgs<'_>) -> InitResult<Control> {
    if args.pattern() == 0 {
        return Ok(Control::Exit(ExitTarget::Trigger));
    }
    let kind = match args.mark() {
        1 => ExitKind::Loop,
        2 => ExitKind::Section,
        _ => ExitKind::Conditional,
    };
    let count = match args.regex(0) {
        None => 1,
        Some(m) => m
            .text()
            .parse::<usize>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| Diagnostic::semantic(format!("can't stop {} {}s", m.text(), kind.noun())))?,
    };

    // Exits are checked against the nesting here so they can never fail
    // when walked.
    let available = args.scope().count(|k| kind.matches(k));
    if available == 0 {
        return Err(Diagnostic::semantic(format!(
            "there is no {} to stop here",
            kind.noun()
        )));
    }
    if count > available {
        let (verb, noun) = if available == 1 {
            ("is", kind.noun().to_string())
        } else {
            ("are", format!("{}s", kind.noun()))
        };
        return Err(Diagnostic::semantic(format!(
            "can't stop {count} {}s: there {verb} only {available} {noun} here",
            kind.noun()
        )));
    }
    Ok(Control::Exit(ExitTarget::Sections { kind, count }))
}
