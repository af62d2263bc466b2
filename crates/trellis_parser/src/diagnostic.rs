//! Parse-time diagnostics.
//!
//! Matching explores many branches, and most of them fail. Each failure may
//! produce a [`Diagnostic`], but only one is ever surfaced: the most specific
//! one from the attempt that got furthest. [`BestDiagnostic`] keeps that
//! winner while the matcher backtracks; everything else is discarded with the
//! branch that produced it.

use std::fmt;

use thiserror::Error;

/// How specific a diagnostic is. Higher tiers win.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quality {
    /// The text did not look like anything known.
    Generic,
    /// The text is not a valid expression of the wanted type.
    NotAnExpression,
    /// The text matched a syntax, which then rejected it.
    SemanticError,
}

/// A parse-time error message.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Diagnostic {
    /// Human-readable message.
    pub message: String,
    /// Specificity tier.
    pub quality: Quality,
    /// How far into the input the producing attempt got.
    pub reached: usize,
}

impl Diagnostic {
    /// Creates a diagnostic.
    #[must_use]
    pub fn new(quality: Quality, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            quality,
            reached: 0,
        }
    }

    /// Creates a [`Quality::Generic`] diagnostic.
    #[must_use]
    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(Quality::Generic, message)
    }

    /// Creates a [`Quality::NotAnExpression`] diagnostic.
    #[must_use]
    pub fn not_an_expression(message: impl Into<String>) -> Self {
        Self::new(Quality::NotAnExpression, message)
    }

    /// Creates a [`Quality::SemanticError`] diagnostic.
    #[must_use]
    pub fn semantic(message: impl Into<String>) -> Self {
        Self::new(Quality::SemanticError, message)
    }

    /// Sets how far the producing attempt got.
    #[must_use]
    pub fn at(mut self, reached: usize) -> Self {
        self.reached = reached;
        self
    }

    /// Returns true if `self` should replace `other` as the surfaced error.
    #[must_use]
    pub fn beats(&self, other: &Self) -> bool {
        (self.quality, self.reached) > (other.quality, other.reached)
    }
}

/// A parse-time warning. Only warnings of the winning parse are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Warning {
    /// Human-readable message.
    pub message: String,
}

impl Warning {
    /// Creates a warning.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Keeps the best diagnostic offered so far.
#[derive(Clone, Debug, Default)]
pub struct BestDiagnostic {
    best: Option<Diagnostic>,
}

impl BestDiagnostic {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers a diagnostic; it is kept only if it beats the current best.
    /// Ties keep the earlier one.
    pub fn offer(&mut self, diagnostic: Diagnostic) {
        match &self.best {
            Some(best) if !diagnostic.beats(best) => {}
            _ => self.best = Some(diagnostic),
        }
    }

    /// Merges another collector into this one.
    pub fn merge(&mut self, other: BestDiagnostic) {
        if let Some(d) = other.best {
            self.offer(d);
        }
    }

    /// Returns the current best without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<&Diagnostic> {
        self.best.as_ref()
    }

    /// Takes the best diagnostic, or builds the fallback if none was offered.
    pub fn finish(self, fallback: impl FnOnce() -> Diagnostic) -> Diagnostic {
        self.best.unwrap_or_else(fallback)
    }

    /// Takes the best diagnostic, if any.
    #[must_use]
    pub fn into_inner(self) -> Option<Diagnostic> {
        self.best
    }
}
