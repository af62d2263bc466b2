//! Expressions the parser builds itself, independent of the registry.

mod converted;
mod list;
mod literal;
mod template;
mod variable;

pub use converted::ConvertedExpression;
pub use list::ExpressionList;
pub use literal::Literal;
pub use template::{Part, Template, TextTemplate, join_values};
pub use variable::Variable;
