//! Parse entry points.
//!
//! [`SyntaxParser`] pairs a frozen [`Registry`] with the variable store that
//! parsed variables bind to. Every entry point is synchronous and has no side
//! effects beyond the returned element: the same registry and text always
//! produce the same result.

use std::sync::Arc;

use trellis_foundation::TypeId;
use trellis_storage::VariableStore;

use crate::config::ParserConfig;
use crate::diagnostic::{BestDiagnostic, Diagnostic, Warning};
use crate::element::{Condition, Effect, EventGuard, Expression, InitArgs, InitResult};
use crate::registry::{Registry, SyntaxInfo};
use crate::resolver::Resolver;
use crate::scope::ParseScope;
use crate::slot::SlotInfo;

/// A parsed element with the warnings raised while parsing it.
#[derive(Debug)]
pub struct Parsed<T> {
    /// The element.
    pub element: T,
    /// Non-fatal remarks, in the order they were raised.
    pub warnings: Vec<Warning>,
}

impl<T> Parsed<T> {
    /// Maps the element, keeping the warnings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Parsed<U> {
        Parsed {
            element: f(self.element),
            warnings: self.warnings,
        }
    }
}

/// An event guard together with the event it listens for.
#[derive(Debug)]
pub struct EventMatch {
    /// Lowercased name of the event.
    pub name: String,
    /// Filters occurrences of the event.
    pub guard: Box<dyn EventGuard>,
}

/// Parses text against a frozen registry.
#[derive(Clone)]
pub struct SyntaxParser {
    registry: Arc<Registry>,
    store: Arc<dyn VariableStore>,
    config: ParserConfig,
}

impl SyntaxParser {
    /// Creates a parser with the default configuration.
    pub fn new(registry: Arc<Registry>, store: Arc<dyn VariableStore>) -> Self {
        Self::with_config(registry, store, ParserConfig::default())
    }

    /// Creates a parser with an explicit configuration.
    pub fn with_config(
        registry: Arc<Registry>,
        store: Arc<dyn VariableStore>,
        config: ParserConfig,
    ) -> Self {
        Self {
            registry,
            store,
            config,
        }
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Returns the variable store parsed variables bind to.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn VariableStore> {
        &self.store
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    fn resolver<'a>(&'a self, scope: &'a ParseScope) -> Resolver<'a> {
        Resolver {
            registry: &self.registry,
            store: &self.store,
            config: &self.config,
            scope,
        }
    }

    /// Matches `text` against `syntaxes` in order; the first pattern that
    /// consumes the whole text and whose factory accepts the match wins.
    ///
    /// `what` names the kind of statement in the fallback message used when
    /// no pattern got far enough to say anything more specific.
    pub fn parse_with<F, T>(
        &self,
        text: &str,
        syntaxes: &[SyntaxInfo<F>],
        scope: &ParseScope,
        what: &str,
        build: impl Fn(&F, InitArgs<'_>) -> InitResult<T>,
    ) -> Result<Parsed<T>, Diagnostic> {
        self.resolver(scope)
            .match_syntaxes(text, syntaxes, build)
            .map(|(element, warnings)| Parsed { element, warnings })
            .map_err(|best| best.finish(|| cant_understand(what, text)))
    }

    /// Parses a condition.
    pub fn parse_condition(
        &self,
        text: &str,
        scope: &ParseScope,
    ) -> Result<Parsed<Box<dyn Condition>>, Diagnostic> {
        self.parse_with(text, self.registry.conditions(), scope, "condition", |f, args| {
            f(args)
        })
    }

    /// Parses an effect.
    pub fn parse_effect(
        &self,
        text: &str,
        scope: &ParseScope,
    ) -> Result<Parsed<Box<dyn Effect>>, Diagnostic> {
        self.parse_with(text, self.registry.effects(), scope, "effect", |f, args| f(args))
    }

    /// Parses an event guard. `text` excludes the leading `on`.
    ///
    /// Each registered event is tried in registration order with a scope
    /// naming that event, so event-dependent expressions inside the guard
    /// can check which event they belong to.
    pub fn parse_event(&self, text: &str) -> Result<Parsed<EventMatch>, Diagnostic> {
        let mut best = BestDiagnostic::new();
        for info in self.registry.events() {
            let scope = ParseScope::for_events(std::slice::from_ref(&info.name));
            let result = self
                .resolver(&scope)
                .match_syntaxes(text, std::iter::once(&info.syntax), |f, args| f(args));
            match result {
                Ok((guard, warnings)) => {
                    return Ok(Parsed {
                        element: EventMatch {
                            name: info.name.clone(),
                            guard,
                        },
                        warnings,
                    });
                }
                Err(b) => best.merge(b),
            }
        }
        Err(best.finish(|| cant_understand("event", text)))
    }

    /// Parses an expression producing values of one of `types` (tried in
    /// order). Lists are accepted.
    pub fn parse_expression(
        &self,
        text: &str,
        types: &[TypeId],
        scope: &ParseScope,
    ) -> Result<Parsed<Box<dyn Expression>>, Diagnostic> {
        let slot = SlotInfo::plural_of(types);
        self.resolver(scope)
            .resolve_slot(text, &slot)
            .map(|resolved| Parsed {
                element: resolved.expr,
                warnings: resolved.warnings,
            })
    }
}

fn cant_understand(what: &str, text: &str) -> Diagnostic {
    Diagnostic::generic(format!("Can't understand this {what}: '{}'", text.trim()))
}
