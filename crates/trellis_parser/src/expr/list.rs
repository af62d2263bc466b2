//! "and"/"or" lists of expressions.

use trellis_foundation::{Context, Result, Time, TypeId, Value, ensure_sufficient_stack};

use crate::element::Expression;

/// A flat list of member expressions.
///
/// An "and" list stands for all its members' values. An "or" list stands
/// for one member: single access takes the first member that yields a
/// value, so evaluation is deterministic.
#[derive(Debug)]
pub struct ExpressionList {
    members: Vec<Box<dyn Expression>>,
    ty: TypeId,
    and: bool,
}

impl ExpressionList {
    /// Creates a list.
    #[must_use]
    pub fn new(members: Vec<Box<dyn Expression>>, ty: TypeId, and: bool) -> Self {
        Self { members, ty, and }
    }

    /// The members.
    #[must_use]
    pub fn members(&self) -> &[Box<dyn Expression>] {
        &self.members
    }
}

impl Expression for ExpressionList {
    fn return_type(&self) -> TypeId {
        self.ty
    }

    fn is_single(&self) -> bool {
        match self.members.as_slice() {
            [only] => only.is_single(),
            members => !self.and && members.iter().all(|m| m.is_single()),
        }
    }

    fn get_all(&self, ctx: &Context) -> Result<Vec<Value>> {
        ensure_sufficient_stack(|| {
            let mut values = Vec::new();
            for member in &self.members {
                values.extend(member.get_all(ctx)?);
            }
            Ok(values)
        })
    }

    fn get_array(&self, ctx: &Context) -> Result<Vec<Value>> {
        if self.and {
            return self.get_all(ctx);
        }
        ensure_sufficient_stack(|| {
            for member in &self.members {
                let values = member.get_array(ctx)?;
                if !values.is_empty() {
                    return Ok(values);
                }
            }
            Ok(Vec::new())
        })
    }

    fn is_and(&self) -> bool {
        self.and
    }

    fn time(&self) -> Time {
        self.members.first().map_or(Time::Present, |m| m.time())
    }

    fn set_time(&mut self, time: Time) -> bool {
        self.members.iter_mut().all(|m| m.set_time(time))
    }
}
