//! The variable store contract.

use std::fmt;

use trellis_foundation::{Context, Result, Value, VariableName};

/// Prefix that marks a variable as local to one execution.
pub const LOCAL_PREFIX: char = '_';

/// Returns true if a raw variable name denotes a local variable.
#[must_use]
pub fn is_local_name(name: &str) -> bool {
    name.trim_start().starts_with(LOCAL_PREFIX)
}

/// An associative store of variables.
///
/// Implementations decide how local variables are scoped to a context; the
/// interpreter only passes the context through. All methods take `&self`:
/// the store does its own synchronization.
pub trait VariableStore: Send + Sync + fmt::Debug {
    /// Reads a single variable.
    fn get(&self, name: &VariableName, ctx: &Context, local: bool) -> Option<Value>;

    /// Writes (or, with `None`, deletes) a single variable.
    fn set(
        &self,
        name: &VariableName,
        value: Option<Value>,
        ctx: &Context,
        local: bool,
    ) -> Result<()>;

    /// Returns the direct children of a list prefix (`scores::`) in key order.
    fn list(&self, prefix: &str, ctx: &Context, local: bool) -> Vec<(VariableName, Value)>;

    /// Deletes every direct child of a list prefix.
    fn clear_list(&self, prefix: &str, ctx: &Context, local: bool) -> Result<()> {
        for (name, _) in self.list(prefix, ctx, local) {
            self.set(&name, None, ctx, local)?;
        }
        Ok(())
    }
}
