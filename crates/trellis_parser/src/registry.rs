//! The syntax registry.
//!
//! Types, converters and syntaxes are registered on a [`RegistryBuilder`]
//! during startup; [`RegistryBuilder::build`] freezes everything into an
//! immutable [`Registry`] that parsing only ever reads. Registration order is
//! significant: it is the order in which syntaxes and patterns are tried.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;
use trellis_foundation::TypeId;

use crate::element::{
    Condition, ConditionFactory, Effect, EffectFactory, EventFactory, EventGuard, Expression,
    ExpressionFactory, InitArgs, InitResult,
};
use crate::pattern::{Pattern, PatternError};
use crate::types::{Converter, LiteralParser, TypeDef, TypeSystem};

/// A rejected registration. Other registrations are unaffected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// One of the patterns is malformed.
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        /// The pattern as written.
        pattern: String,
        /// What is wrong with it.
        #[source]
        source: PatternError,
    },
    /// A syntax with no patterns.
    #[error("a syntax needs at least one pattern")]
    NoPatterns,
    /// A type name that is already taken.
    #[error("type name '{0}' is already registered")]
    DuplicateType(String),
    /// A type id that was never registered.
    #[error("unknown type {0:?}")]
    UnknownType(TypeId),
}

// =============================================================================
// SyntaxInfo
// =============================================================================

/// Compiled patterns and the factory they build with.
pub struct SyntaxInfo<F> {
    patterns: Vec<Pattern>,
    factory: F,
}

impl<F> SyntaxInfo<F> {
    /// Compiles `patterns`. Any malformed pattern rejects the whole syntax.
    pub fn new(patterns: &[&str], types: &TypeSystem, factory: F) -> Result<Self, RegistryError> {
        if patterns.is_empty() {
            return Err(RegistryError::NoPatterns);
        }
        let patterns = patterns
            .iter()
            .map(|&p| {
                Pattern::compile(p, types).map_err(|source| RegistryError::Pattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns, factory })
    }

    /// The compiled patterns in registration order.
    #[must_use]
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// The factory.
    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }
}

impl<F> fmt::Debug for SyntaxInfo<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.patterns.iter().map(Pattern::source))
            .finish()
    }
}

/// A registered expression syntax.
#[derive(Debug)]
pub struct ExpressionInfo {
    /// Type of the values the built expressions produce.
    pub return_type: TypeId,
    /// Patterns and factory.
    pub syntax: SyntaxInfo<ExpressionFactory>,
}

/// A registered event syntax.
#[derive(Debug)]
pub struct EventInfo {
    /// Name of the occurrences triggers built from this syntax react to.
    pub name: String,
    /// Patterns and factory.
    pub syntax: SyntaxInfo<EventFactory>,
}

// =============================================================================
// RegistryBuilder
// =============================================================================

/// Collects registrations until [`build`](Self::build).
pub struct RegistryBuilder {
    types: TypeSystem,
    conditions: Vec<SyntaxInfo<ConditionFactory>>,
    effects: Vec<SyntaxInfo<EffectFactory>>,
    expressions: Vec<ExpressionInfo>,
    events: Vec<EventInfo>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn logged<T>(kind: &str, result: Result<T, RegistryError>) -> Result<T, RegistryError> {
    if let Err(e) = &result {
        warn!(kind = kind, error = %e, "registration rejected");
    }
    result
}

impl RegistryBuilder {
    /// Creates a builder holding only the reserved types.
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: TypeSystem::with_reserved(),
            conditions: Vec::new(),
            effects: Vec::new(),
            expressions: Vec::new(),
            events: Vec::new(),
        }
    }

    /// The types registered so far.
    #[must_use]
    pub fn types(&self) -> &TypeSystem {
        &self.types
    }

    /// Registers a type.
    pub fn register_type(&mut self, def: TypeDef) -> Result<TypeId, RegistryError> {
        let result = self.types.define(def).map_err(RegistryError::DuplicateType);
        logged("type", result)
    }

    /// Sets the literal parser of a type, reserved types included.
    pub fn set_literal_parser(
        &mut self,
        id: TypeId,
        parser: LiteralParser,
    ) -> Result<(), RegistryError> {
        let result = if self.types.set_parser(id, parser) {
            Ok(())
        } else {
            Err(RegistryError::UnknownType(id))
        };
        logged("literal parser", result)
    }

    /// Sets the default expression of a type, reserved types included.
    pub fn set_default_expression(
        &mut self,
        id: TypeId,
        f: impl Fn() -> Box<dyn Expression> + Send + Sync + 'static,
    ) -> Result<(), RegistryError> {
        let result = if self.types.set_default(id, Arc::new(f)) {
            Ok(())
        } else {
            Err(RegistryError::UnknownType(id))
        };
        logged("default expression", result)
    }

    /// Registers a converter. A later converter for the same pair replaces
    /// the earlier one.
    pub fn register_converter(
        &mut self,
        from: TypeId,
        to: TypeId,
        converter: Converter,
    ) -> Result<(), RegistryError> {
        let result = match (self.types.info(from), self.types.info(to)) {
            (None, _) => Err(RegistryError::UnknownType(from)),
            (_, None) => Err(RegistryError::UnknownType(to)),
            _ => {
                self.types.add_converter(from, to, converter);
                Ok(())
            }
        };
        logged("converter", result)
    }

    /// Registers a condition syntax.
    pub fn register_condition(
        &mut self,
        patterns: &[&str],
        factory: impl Fn(InitArgs<'_>) -> InitResult<Box<dyn Condition>> + Send + Sync + 'static,
    ) -> Result<(), RegistryError> {
        let factory: ConditionFactory = Box::new(factory);
        let info = logged("condition", SyntaxInfo::new(patterns, &self.types, factory))?;
        self.conditions.push(info);
        Ok(())
    }

    /// Registers an effect syntax.
    pub fn register_effect(
        &mut self,
        patterns: &[&str],
        factory: impl Fn(InitArgs<'_>) -> InitResult<Box<dyn Effect>> + Send + Sync + 'static,
    ) -> Result<(), RegistryError> {
        let factory: EffectFactory = Box::new(factory);
        let info = logged("effect", SyntaxInfo::new(patterns, &self.types, factory))?;
        self.effects.push(info);
        Ok(())
    }

    /// Registers an expression syntax producing values of `return_type`.
    pub fn register_expression(
        &mut self,
        return_type: TypeId,
        patterns: &[&str],
        factory: impl Fn(InitArgs<'_>) -> InitResult<Box<dyn Expression>> + Send + Sync + 'static,
    ) -> Result<(), RegistryError> {
        if self.types.info(return_type).is_none() {
            return logged("expression", Err(RegistryError::UnknownType(return_type)));
        }
        let factory: ExpressionFactory = Box::new(factory);
        let syntax = logged("expression", SyntaxInfo::new(patterns, &self.types, factory))?;
        self.expressions.push(ExpressionInfo {
            return_type,
            syntax,
        });
        Ok(())
    }

    /// Registers an event syntax for occurrences named `name`.
    pub fn register_event(
        &mut self,
        name: &str,
        patterns: &[&str],
        factory: impl Fn(InitArgs<'_>) -> InitResult<Box<dyn EventGuard>> + Send + Sync + 'static,
    ) -> Result<(), RegistryError> {
        let factory: EventFactory = Box::new(factory);
        let syntax = logged("event", SyntaxInfo::new(patterns, &self.types, factory))?;
        self.events.push(EventInfo {
            name: name.to_lowercase(),
            syntax,
        });
        Ok(())
    }

    /// Freezes the registrations.
    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            types: Arc::new(self.types),
            conditions: self.conditions,
            effects: self.effects,
            expressions: self.expressions,
            events: self.events,
        }
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("conditions", &self.conditions.len())
            .field("effects", &self.effects.len())
            .field("expressions", &self.expressions.len())
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Registry
// =============================================================================

/// The frozen registry.
pub struct Registry {
    types: Arc<TypeSystem>,
    conditions: Vec<SyntaxInfo<ConditionFactory>>,
    effects: Vec<SyntaxInfo<EffectFactory>>,
    expressions: Vec<ExpressionInfo>,
    events: Vec<EventInfo>,
}

impl Registry {
    /// The type system.
    #[must_use]
    pub fn types(&self) -> &Arc<TypeSystem> {
        &self.types
    }

    /// Condition syntaxes in registration order.
    #[must_use]
    pub fn conditions(&self) -> &[SyntaxInfo<ConditionFactory>] {
        &self.conditions
    }

    /// Effect syntaxes in registration order.
    #[must_use]
    pub fn effects(&self) -> &[SyntaxInfo<EffectFactory>] {
        &self.effects
    }

    /// Expression syntaxes in registration order.
    #[must_use]
    pub fn expressions(&self) -> &[ExpressionInfo] {
        &self.expressions
    }

    /// Event syntaxes in registration order.
    #[must_use]
    pub fn events(&self) -> &[EventInfo] {
        &self.events
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.types.iter().count())
            .field("conditions", &self.conditions.len())
            .field("effects", &self.effects.len())
            .field("expressions", &self.expressions.len())
            .field("events", &self.events.len())
            .finish()
    }
}
