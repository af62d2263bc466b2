//! Variable references: `{name}`, `{_local}`, `{list::*}`.

use std::fmt;
use std::sync::Arc;

use trellis_foundation::{ChangeMode, Context, Result, TypeId, Value, VariableName};
use trellis_storage::{VariableStore, apply_change};

use crate::element::Expression;
use crate::expr::Template;

/// A reference into the variable store, resolved per execution.
pub struct Variable {
    name: Template,
    local: bool,
    list: bool,
    store: Arc<dyn VariableStore>,
}

impl Variable {
    /// Creates a variable reference. `local` and `list` are decided from the
    /// raw name at parse time.
    #[must_use]
    pub fn new(name: Template, local: bool, list: bool, store: Arc<dyn VariableStore>) -> Self {
        Self {
            name,
            local,
            list,
            store,
        }
    }

    /// True for `{_local}` variables.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.local
    }

    /// True for `{list::*}` variables.
    #[must_use]
    pub fn is_list(&self) -> bool {
        self.list
    }

    /// The concrete name for one execution.
    pub fn name(&self, ctx: &Context) -> Result<VariableName> {
        Ok(VariableName::new(&self.name.render(ctx)?))
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_plain() {
            Some(name) => write!(f, "{{{name}}}"),
            None => f.debug_struct("Variable").field("name", &self.name).finish_non_exhaustive(),
        }
    }
}

impl Expression for Variable {
    fn return_type(&self) -> TypeId {
        TypeId::OBJECT
    }

    fn is_single(&self) -> bool {
        !self.list
    }

    fn get_all(&self, ctx: &Context) -> Result<Vec<Value>> {
        let name = self.name(ctx)?;
        Ok(match name.list_prefix() {
            Some(prefix) => self
                .store
                .list(prefix, ctx, self.local)
                .into_iter()
                .map(|(_, value)| value)
                .collect(),
            None => self.store.get(&name, ctx, self.local).into_iter().collect(),
        })
    }

    fn accept_change(&self, mode: ChangeMode) -> Option<Vec<TypeId>> {
        (mode != ChangeMode::Reset).then(|| vec![TypeId::OBJECT])
    }

    fn change(&self, ctx: &Context, delta: &[Value], mode: ChangeMode) -> Result<()> {
        let name = self.name(ctx)?;
        apply_change(self.store.as_ref(), &name, ctx, self.local, mode, delta)
    }
}
