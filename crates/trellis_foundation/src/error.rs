//! Error types for Trellis runtime faults.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Parse-time problems are not errors in this sense; they are reported as
//! diagnostics by the parser crate.

use std::fmt;

use thiserror::Error;

use crate::types::ChangeMode;

/// The main error type for Trellis runtime operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        })
    }

    /// Creates an unsupported change error.
    #[must_use]
    pub fn unsupported_change(mode: ChangeMode, target: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedChange {
            mode,
            target: target.into(),
        })
    }

    /// Creates a variable store error.
    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Store(message.into()))
    }

    /// Creates a step limit error.
    #[must_use]
    pub fn step_limit(limit: u64) -> Self {
        Self::new(ErrorKind::StepLimit(limit))
    }

    /// Creates an error from a caught panic message.
    #[must_use]
    pub fn panicked(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Panicked(message.into()))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Categorized runtime error kinds.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A value had the wrong type at run time.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: String,
        /// The actual type encountered.
        actual: String,
    },

    /// An expression was asked for a change it does not support.
    #[error("{target} cannot be changed with '{mode}'")]
    UnsupportedChange {
        /// The requested mode.
        mode: ChangeMode,
        /// Textual form of the target expression.
        target: String,
    },

    /// A single value was required but several were produced.
    #[error("expected a single value, got {0}")]
    NotSingle(usize),

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Integer arithmetic whose result does not fit.
    #[error("integer overflow")]
    Overflow,

    /// The variable store rejected an operation.
    #[error("variable store: {0}")]
    Store(String),

    /// An execution walked more nodes than its budget allows.
    #[error("step limit exceeded: more than {0} steps in one execution")]
    StepLimit(u64),

    /// Element code panicked during an execution.
    #[error("panic during execution: {0}")]
    Panicked(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Script or trigger name.
    pub source: Option<String>,
    /// Line number in source.
    pub line: Option<usize>,
    /// Textual form of the offending statement.
    pub node: Option<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source name.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line number.
    #[must_use]
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Sets the offending statement text.
    #[must_use]
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
            if let Some(line) = self.line {
                write!(f, ":{line}")?;
            }
        }
        if let Some(node) = &self.node {
            if self.source.is_some() {
                write!(f, " ")?;
            }
            write!(f, "in '{node}'")?;
        }
        Ok(())
    }
}
