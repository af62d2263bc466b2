//! Configuration for the parser.

/// Configuration for the parser.
///
/// Controls list handling limits and which warnings are raised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum number of members in one list before parsing gives up.
    pub max_list_len: usize,

    /// Warn about lists that use only commas (`a, b, c`).
    pub warn_missing_conjunction: bool,

    /// Warn about lists that mix "and" with "or".
    pub warn_mixed_conjunctions: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_list_len: 64,
            warn_missing_conjunction: true,
            warn_mixed_conjunctions: true,
        }
    }
}

impl ParserConfig {
    /// Creates a configuration that raises no list warnings.
    #[must_use]
    pub fn quiet() -> Self {
        Self {
            warn_missing_conjunction: false,
            warn_mixed_conjunctions: false,
            ..Self::default()
        }
    }

    /// Builder method to set the maximum list length.
    #[must_use]
    pub fn with_max_list_len(mut self, len: usize) -> Self {
        self.max_list_len = len;
        self
    }

    /// Builder method to enable/disable the comma-only list warning.
    #[must_use]
    pub fn with_warn_missing_conjunction(mut self, warn: bool) -> Self {
        self.warn_missing_conjunction = warn;
        self
    }

    /// Builder method to enable/disable the mixed and/or warning.
    #[must_use]
    pub fn with_warn_mixed_conjunctions(mut self, warn: bool) -> Self {
        self.warn_mixed_conjunctions = warn;
        self
    }
}
