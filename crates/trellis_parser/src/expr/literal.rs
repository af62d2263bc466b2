//! Fixed values.

use trellis_foundation::{Context, Result, TypeId, Value};

use crate::element::Expression;

/// One or more fixed values of one type.
#[derive(Clone, Debug, PartialEq)]
pub struct Literal {
    values: Vec<Value>,
    ty: TypeId,
    and: bool,
}

impl Literal {
    /// A single value.
    #[must_use]
    pub fn single(value: Value, ty: TypeId) -> Self {
        Self {
            values: vec![value],
            ty,
            and: true,
        }
    }

    /// A literal list with "and" or "or" semantics.
    #[must_use]
    pub fn list(values: Vec<Value>, ty: TypeId, and: bool) -> Self {
        Self { values, ty, and }
    }

    /// The values.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl Expression for Literal {
    fn return_type(&self) -> TypeId {
        self.ty
    }

    fn is_single(&self) -> bool {
        self.values.len() <= 1 || !self.and
    }

    fn get_all(&self, _ctx: &Context) -> Result<Vec<Value>> {
        Ok(self.values.clone())
    }

    fn get_array(&self, _ctx: &Context) -> Result<Vec<Value>> {
        if self.and {
            Ok(self.values.clone())
        } else {
            Ok(self.values.first().cloned().into_iter().collect())
        }
    }

    fn is_and(&self) -> bool {
        self.and
    }

    fn literal_values(&self) -> Option<&[Value]> {
        Some(&self.values)
    }
}
