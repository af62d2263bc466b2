//! In-memory variable storage with immutable snapshots.
//!
//! Globals live in a persistent ordered map, so [`MemoryStore::snapshot`] is
//! O(1) and list ranges are a contiguous key range. Locals live in the
//! context's own table and disappear with it.

use std::ops::Bound;

use im::OrdMap;
use parking_lot::RwLock;
use trellis_foundation::{Context, Result, Value, VariableName};

use crate::store::VariableStore;

/// A process-local variable store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    globals: RwLock<OrdMap<VariableName, Value>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all global variables.
    #[must_use]
    pub fn snapshot(&self) -> OrdMap<VariableName, Value> {
        self.globals.read().clone()
    }

    /// Returns the number of global variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.globals.read().len()
    }

    /// Returns true if no global variable is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.globals.read().is_empty()
    }

    /// Reads a global variable by raw name, outside of any execution.
    #[must_use]
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.read().get(&VariableName::new(name)).cloned()
    }

    /// Removes every global variable.
    pub fn clear(&self) {
        self.globals.write().clear();
    }
}

fn children(map: &OrdMap<VariableName, Value>, prefix: &str) -> Vec<(VariableName, Value)> {
    let start = VariableName::new(prefix);
    map.range((Bound::Included(start), Bound::Unbounded))
        .take_while(|(name, _)| name.as_str().starts_with(prefix))
        .filter(|(name, _)| name.is_child_of(prefix))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

impl VariableStore for MemoryStore {
    fn get(&self, name: &VariableName, ctx: &Context, local: bool) -> Option<Value> {
        if local {
            ctx.locals().get(name).cloned()
        } else {
            self.globals.read().get(name).cloned()
        }
    }

    fn set(
        &self,
        name: &VariableName,
        value: Option<Value>,
        ctx: &Context,
        local: bool,
    ) -> Result<()> {
        if local {
            let mut locals = ctx.locals();
            match value {
                Some(v) => locals.insert(name.clone(), v),
                None => locals.remove(name),
            };
        } else {
            let mut globals = self.globals.write();
            match value {
                Some(v) => globals.insert(name.clone(), v),
                None => globals.remove(name),
            };
        }
        Ok(())
    }

    fn list(&self, prefix: &str, ctx: &Context, local: bool) -> Vec<(VariableName, Value)> {
        if local {
            children(&ctx.locals(), prefix)
        } else {
            children(&self.globals.read(), prefix)
        }
    }
}
