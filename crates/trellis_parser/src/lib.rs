//! Pattern registry, backtracking matcher, and expression resolver for Trellis.
//!
//! This crate provides:
//! - [`RegistryBuilder`] / [`Registry`] - Syntax registration with an explicit freeze
//! - [`Pattern`] - Compiled pattern notation (`[optional]`, `(a|b)`, `%type%`, `<regex>`)
//! - [`match_pattern`] - The backtracking matcher
//! - [`SyntaxParser`] - Parse entry points for conditions, effects, events and expressions
//! - [`Condition`], [`Effect`], [`Expression`], [`EventGuard`] - Element contracts
//! - [`Diagnostic`] - Parse errors ranked by [`Quality`]
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis_foundation::{TypeId, Value};
//! use trellis_parser::{ParseScope, RegistryBuilder, SyntaxParser};
//! use trellis_storage::MemoryStore;
//!
//! let mut builder = RegistryBuilder::new();
//! builder
//!     .set_literal_parser(TypeId::NUMBER, |t| t.parse::<i64>().ok().map(Value::Int))
//!     .unwrap();
//! let parser = SyntaxParser::new(Arc::new(builder.build()), Arc::new(MemoryStore::new()));
//!
//! let parsed = parser
//!     .parse_expression("1, 2 and 3", &[TypeId::NUMBER], &ParseScope::new())
//!     .unwrap();
//! assert!(parsed.element.is_and());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod diagnostic;
pub mod element;
pub mod expr;
pub mod matcher;
pub mod parser;
pub mod pattern;
pub mod registry;
mod resolver;
pub mod scope;
pub mod slot;
mod split;
pub mod types;

pub use config::ParserConfig;
pub use diagnostic::{BestDiagnostic, Diagnostic, Quality, Warning};
pub use element::{
    Condition, ConditionFactory, Effect, EffectFactory, EventFactory, EventGuard, Expression,
    ExpressionFactory, InitArgs, InitResult, MatchInfo, RegexMatch, check_values,
};
pub use matcher::{PatternMatch, Resolved, SlotResolver, match_pattern};
pub use parser::{EventMatch, Parsed, SyntaxParser};
pub use pattern::{Pattern, PatternError};
pub use registry::{EventInfo, ExpressionInfo, Registry, RegistryBuilder, RegistryError, SyntaxInfo};
pub use scope::{LoopValueSource, ParseScope, SectionFrame, SectionKind};
pub use slot::{Restriction, SlotInfo};
pub use types::{Converter, DefaultExpression, LiteralParser, TypeDef, TypeInfo, TypeSystem};
