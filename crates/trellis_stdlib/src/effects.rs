//! Effects: variable changes, broadcasting, and event cancellation.

use tracing::warn;
use trellis_engine::is_suspended;
use trellis_foundation::{ChangeMode, Context, Result, TypeId};
use trellis_parser::expr::join_values;
use trellis_parser::{
    Diagnostic, Effect, Expression, InitArgs, InitResult, RegistryBuilder, RegistryError,
    TypeSystem,
};

use crate::Outbox;

// =============================================================================
// Changes
// =============================================================================

/// `set`, `add`, `remove`, `remove all`, `delete` and `reset`.
#[derive(Debug)]
pub struct Change {
    target: Box<dyn Expression>,
    delta: Option<Box<dyn Expression>>,
    mode: ChangeMode,
}

impl Effect for Change {
    fn execute(&self, ctx: &Context) -> Result<()> {
        let delta = match &self.delta {
            Some(delta) => delta.get_array(ctx)?,
            None => Vec::new(),
        };
        // Adding or removing nothing is a no-op; setting to nothing is not.
        let additive = matches!(
            self.mode,
            ChangeMode::Add | ChangeMode::Remove | ChangeMode::RemoveAll
        );
        if delta.is_empty() && additive {
            return Ok(());
        }
        self.target.change(ctx, &delta, self.mode)
    }
}

/// Pattern index to change mode, in registration order.
const CHANGE_MODES: [ChangeMode; 6] = [
    ChangeMode::Set,
    ChangeMode::Add,
    ChangeMode::RemoveAll,
    ChangeMode::Remove,
    ChangeMode::Delete,
    ChangeMode::Reset,
];

fn change(mut args: InitArgs<'_>) -> InitResult<Box<dyn Effect>> {
    let mode = CHANGE_MODES
        .get(args.pattern())
        .copied()
        .ok_or_else(|| Diagnostic::semantic("unknown change"))?;
    let text = args.info().text.clone();
    let (target, delta) = match mode {
        ChangeMode::Set => (args.required(0)?, Some(args.required(1)?)),
        ChangeMode::Add | ChangeMode::Remove | ChangeMode::RemoveAll => {
            (args.required(1)?, Some(args.required(0)?))
        }
        ChangeMode::Delete | ChangeMode::Reset => (args.required(0)?, None),
    };

    let Some(accepted) = target.accept_change(mode) else {
        return Err(Diagnostic::semantic(format!(
            "'{text}' is not possible: the target can't be changed that way"
        )));
    };
    if let Some(delta) = &delta {
        if !accepts(args.types(), &accepted, delta.return_type()) {
            return Err(Diagnostic::semantic(format!(
                "'{text}' is not possible: {} can't be used here",
                args.types().name(delta.return_type())
            )));
        }
    }
    Ok(Box::new(Change {
        target,
        delta,
        mode,
    }))
}

/// True if a delta of type `ty` fits one of `accepted`. Object-typed deltas
/// are only known at run time and always pass.
fn accepts(types: &TypeSystem, accepted: &[TypeId], ty: TypeId) -> bool {
    accepted.is_empty()
        || ty == TypeId::OBJECT
        || accepted.iter().any(|&a| types.is_subtype(ty, a))
}

// =============================================================================
// Broadcast
// =============================================================================

/// Sends text to the [`Outbox`].
#[derive(Debug)]
pub struct Broadcast {
    message: Box<dyn Expression>,
    outbox: Outbox,
}

impl Effect for Broadcast {
    fn execute(&self, ctx: &Context) -> Result<()> {
        let values = self.message.get_array(ctx)?;
        if !values.is_empty() {
            self.outbox.push(join_values(&values, self.message.is_and()));
        }
        Ok(())
    }
}

// =============================================================================
// Cancellation
// =============================================================================

/// Cancels or uncancels the current occurrence.
///
/// Cancelling only means something before the occurrence has been handed
/// back to its producer, so it is a no-op once the execution has been
/// suspended by a delay.
#[derive(Debug)]
pub struct Cancel {
    cancel: bool,
}

impl Effect for Cancel {
    fn execute(&self, ctx: &Context) -> Result<()> {
        if is_suspended(ctx) {
            warn!(event = %ctx.event().name(), "event cancellation after a delay has no effect");
            return Ok(());
        }
        ctx.event().set_cancelled(self.cancel);
        Ok(())
    }
}

pub(crate) fn register(
    builder: &mut RegistryBuilder,
    outbox: &Outbox,
) -> std::result::Result<(), RegistryError> {
    builder.register_effect(
        &[
            "set %~objects% to %objects%",
            "add %objects% to %~objects%",
            "remove (all|every) %objects% from %~objects%",
            "remove %objects% from %~objects%",
            "(delete|clear) %~objects%",
            "reset %~objects%",
        ],
        change,
    )?;

    let outbox = outbox.clone();
    builder.register_effect(&["(broadcast|send|say) %objects%"], move |mut args| {
        Ok(Box::new(Broadcast {
            message: args.required(0)?,
            outbox: outbox.clone(),
        }))
    })?;

    builder.register_effect(&["[1¦un]cancel [the] event"], |args| {
        if args.delayed().is_true() {
            return Err(Diagnostic::semantic(
                "an event can't be cancelled after it has already passed",
            ));
        }
        Ok(Box::new(Cancel {
            cancel: args.mark() & 1 == 0,
        }))
    })?;
    Ok(())
}
