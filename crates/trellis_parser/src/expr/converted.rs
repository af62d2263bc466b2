//! Values converted to a placeholder's types.

use std::sync::Arc;

use trellis_foundation::{ChangeMode, Context, Result, Time, TypeId, Value, ensure_sufficient_stack};

use crate::element::Expression;
use crate::types::TypeSystem;

/// Wraps an expression whose values must be converted at run time.
///
/// Values that already belong to a target type pass through; others go
/// through one registered converter or are dropped. Changes are forwarded
/// to the source untouched.
#[derive(Debug)]
pub struct ConvertedExpression {
    source: Box<dyn Expression>,
    targets: Vec<TypeId>,
    types: Arc<TypeSystem>,
}

impl ConvertedExpression {
    /// Wraps `source`.
    #[must_use]
    pub fn new(source: Box<dyn Expression>, targets: Vec<TypeId>, types: Arc<TypeSystem>) -> Self {
        Self {
            source,
            targets,
            types,
        }
    }

    /// The unconverted expression.
    #[must_use]
    pub fn source(&self) -> &dyn Expression {
        self.source.as_ref()
    }

    fn convert(&self, values: Vec<Value>) -> Vec<Value> {
        values
            .iter()
            .filter_map(|v| self.types.convert(v, &self.targets))
            .collect()
    }
}

impl Expression for ConvertedExpression {
    fn return_type(&self) -> TypeId {
        match self.targets.as_slice() {
            [only] => *only,
            _ => TypeId::OBJECT,
        }
    }

    fn is_single(&self) -> bool {
        self.source.is_single()
    }

    fn get_all(&self, ctx: &Context) -> Result<Vec<Value>> {
        ensure_sufficient_stack(|| Ok(self.convert(self.source.get_all(ctx)?)))
    }

    fn get_array(&self, ctx: &Context) -> Result<Vec<Value>> {
        ensure_sufficient_stack(|| Ok(self.convert(self.source.get_array(ctx)?)))
    }

    fn is_and(&self) -> bool {
        self.source.is_and()
    }

    fn time(&self) -> Time {
        self.source.time()
    }

    fn set_time(&mut self, time: Time) -> bool {
        self.source.set_time(time)
    }

    fn accept_change(&self, mode: ChangeMode) -> Option<Vec<TypeId>> {
        self.source.accept_change(mode)
    }

    fn change(&self, ctx: &Context, delta: &[Value], mode: ChangeMode) -> Result<()> {
        self.source.change(ctx, delta, mode)
    }
}
