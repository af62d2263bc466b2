//! Variable names and their ordering.
//!
//! Names are `::`-separated paths such as `scores::3`. A name ending in the
//! list suffix `::*` addresses every direct child of its prefix. Ordering is
//! segment-wise with numeric segments ordered numerically, so the children of
//! a list iterate `1, 2, ..., 10` rather than `1, 10, 2`.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Separator between the segments of a variable name.
pub const SEPARATOR: &str = "::";

/// Suffix marking a list variable.
pub const LIST_SUFFIX: &str = "::*";

/// A normalized (lowercase) variable name.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VariableName(Arc<str>);

impl VariableName {
    /// Creates a name, normalizing it to lowercase.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase().into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this name addresses a list (ends with `::*`).
    #[must_use]
    pub fn is_list(&self) -> bool {
        self.0.ends_with(LIST_SUFFIX)
    }

    /// For a list name, returns the prefix every child starts with
    /// (`scores::*` gives `scores::`).
    #[must_use]
    pub fn list_prefix(&self) -> Option<&str> {
        self.0
            .strip_suffix('*')
            .filter(|prefix| prefix.ends_with(SEPARATOR))
    }

    /// Creates the name of a list element (`scores::*` + `3` gives `scores::3`).
    #[must_use]
    pub fn child(&self, index: &str) -> Option<Self> {
        self.list_prefix()
            .map(|prefix| Self::new(&format!("{prefix}{index}")))
    }

    /// Returns the last segment of this name (the list index of a child).
    #[must_use]
    pub fn last_segment(&self) -> &str {
        self.0.rsplit(SEPARATOR).next().unwrap_or(&self.0)
    }

    /// Returns true if this name is a direct child of the given list prefix.
    #[must_use]
    pub fn is_child_of(&self, prefix: &str) -> bool {
        self.0
            .strip_prefix(prefix)
            .is_some_and(|rest| !rest.is_empty() && !rest.contains(SEPARATOR))
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }
}

/// Orders one segment: empty first, then numbers by value, then text.
fn compare_segments(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

impl Ord for VariableName {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut left = self.segments();
        let mut right = other.segments();
        loop {
            match (left.next(), right.next()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(a), Some(b)) => match compare_segments(a, b) {
                    Ordering::Equal => {}
                    ord => return ord,
                },
            }
        }
    }
}

impl PartialOrd for VariableName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for VariableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0)
    }
}

impl fmt::Display for VariableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VariableName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
