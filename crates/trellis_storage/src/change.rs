//! `ChangeMode` semantics for variables.
//!
//! Every store shares these rules, so they live next to the contract rather
//! than inside one implementation.

use trellis_foundation::{ChangeMode, Context, Error, Result, Value, VariableName};

use crate::store::VariableStore;

/// Applies a change to a scalar or list variable.
///
/// Scalars: `Set` replaces, `Add`/`Remove` do arithmetic on numbers and
/// timespans, `RemoveAll` deletes the variable if it equals a delta value,
/// `Delete` clears. Lists: `Set` replaces all elements (indices `1..=n`),
/// `Add` fills the first free integer indices, `Remove` deletes the first
/// equal element per delta value, `RemoveAll` every equal element, `Delete`
/// clears. `Reset` is not supported on variables.
pub fn apply_change(
    store: &dyn VariableStore,
    name: &VariableName,
    ctx: &Context,
    local: bool,
    mode: ChangeMode,
    delta: &[Value],
) -> Result<()> {
    if mode == ChangeMode::Reset {
        return Err(Error::unsupported_change(mode, format!("{{{name}}}")));
    }
    match name.list_prefix() {
        Some(prefix) => change_list(store, name, prefix, ctx, local, mode, delta),
        None => change_scalar(store, name, ctx, local, mode, delta),
    }
}

fn change_scalar(
    store: &dyn VariableStore,
    name: &VariableName,
    ctx: &Context,
    local: bool,
    mode: ChangeMode,
    delta: &[Value],
) -> Result<()> {
    let current = store.get(name, ctx, local);
    let arithmetic = current
        .as_ref()
        .is_some_and(|c| c.as_number().is_some() || c.as_timespan().is_some());
    let equal = current
        .as_ref()
        .is_some_and(|c| delta.iter().any(|d| d.loosely_equals(c)));
    let value = match mode {
        ChangeMode::Set => delta.first().cloned(),
        ChangeMode::Delete => None,
        ChangeMode::Add => Some(fold(current, delta, Value::add)?),
        ChangeMode::Remove if arithmetic => Some(fold(current, delta, Value::sub)?),
        ChangeMode::Remove | ChangeMode::RemoveAll if equal => None,
        ChangeMode::Remove | ChangeMode::RemoveAll => current,
        ChangeMode::Reset => unreachable_reset()?,
    };
    store.set(name, value, ctx, local)
}

/// Folds the deltas into the current value, treating an unset variable as
/// the additive identity of the first delta.
fn fold(
    current: Option<Value>,
    delta: &[Value],
    op: fn(&Value, &Value) -> Result<Value>,
) -> Result<Value> {
    let mut acc = match current {
        Some(v) => v,
        None => match delta.first() {
            Some(Value::Timespan(_)) => Value::Timespan(std::time::Duration::ZERO),
            Some(Value::Float(_)) => Value::Float(0.0),
            _ => Value::Int(0),
        },
    };
    for d in delta {
        acc = op(&acc, d)?;
    }
    Ok(acc)
}

fn unreachable_reset<T>() -> Result<T> {
    Err(Error::internal("reset reached variable change"))
}

fn change_list(
    store: &dyn VariableStore,
    name: &VariableName,
    prefix: &str,
    ctx: &Context,
    local: bool,
    mode: ChangeMode,
    delta: &[Value],
) -> Result<()> {
    match mode {
        ChangeMode::Set => {
            store.clear_list(prefix, ctx, local)?;
            for (i, value) in delta.iter().enumerate() {
                if let Some(child) = name.child(&(i + 1).to_string()) {
                    store.set(&child, Some(value.clone()), ctx, local)?;
                }
            }
            Ok(())
        }
        ChangeMode::Add => {
            let mut next = 1_u64;
            for value in delta {
                loop {
                    let Some(child) = name.child(&next.to_string()) else {
                        return Err(Error::internal("list name without prefix"));
                    };
                    next += 1;
                    if store.get(&child, ctx, local).is_none() {
                        store.set(&child, Some(value.clone()), ctx, local)?;
                        break;
                    }
                }
            }
            Ok(())
        }
        ChangeMode::Remove => {
            for value in delta {
                let found = store
                    .list(prefix, ctx, local)
                    .into_iter()
                    .find(|(_, v)| v.loosely_equals(value));
                if let Some((child, _)) = found {
                    store.set(&child, None, ctx, local)?;
                }
            }
            Ok(())
        }
        ChangeMode::RemoveAll => {
            for (child, v) in store.list(prefix, ctx, local) {
                if delta.iter().any(|d| d.loosely_equals(&v)) {
                    store.set(&child, None, ctx, local)?;
                }
            }
            Ok(())
        }
        ChangeMode::Delete => store.clear_list(prefix, ctx, local),
        ChangeMode::Reset => unreachable_reset(),
    }
}
