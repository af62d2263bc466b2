//! Text with embedded `%expression%` parts.
//!
//! Used for quoted strings and for variable names.

use trellis_foundation::{Context, Result, TypeId, Value};

use crate::element::Expression;

/// A piece of a template.
#[derive(Debug)]
pub enum Part {
    /// Literal text.
    Text(String),
    /// An embedded expression, rendered with [`join_values`].
    Expr(Box<dyn Expression>),
}

/// Text interleaved with expressions.
#[derive(Debug, Default)]
pub struct Template {
    parts: Vec<Part>,
}

impl Template {
    /// Creates a template from its parts.
    #[must_use]
    pub fn new(parts: Vec<Part>) -> Self {
        Self { parts }
    }

    /// A template without expressions.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::Text(text.into())],
        }
    }

    /// The text, if the template has no expressions.
    #[must_use]
    pub fn as_plain(&self) -> Option<String> {
        self.parts
            .iter()
            .map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::Expr(_) => None,
            })
            .collect()
    }

    /// Renders the template for one execution.
    pub fn render(&self, ctx: &Context) -> Result<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Expr(expr) => {
                    let values = expr.get_all(ctx)?;
                    out.push_str(&join_values(&values, expr.is_and()));
                }
            }
        }
        Ok(out)
    }
}

/// Joins values the way scripts print lists: `1, 2 and 3`.
#[must_use]
pub fn join_values(values: &[Value], and: bool) -> String {
    let strings: Vec<String> = values.iter().map(ToString::to_string).collect();
    match strings.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => {
            let conjunction = if and { "and" } else { "or" };
            format!("{} {conjunction} {last}", rest.join(", "))
        }
    }
}

/// A quoted string with interpolation.
#[derive(Debug)]
pub struct TextTemplate {
    template: Template,
}

impl TextTemplate {
    /// Wraps a template.
    #[must_use]
    pub fn new(template: Template) -> Self {
        Self { template }
    }
}

impl Expression for TextTemplate {
    fn return_type(&self) -> TypeId {
        TypeId::STRING
    }

    fn is_single(&self) -> bool {
        true
    }

    fn get_all(&self, ctx: &Context) -> Result<Vec<Value>> {
        Ok(vec![Value::string(self.template.render(ctx)?)])
    }
}
