//! Type identifiers and the small enums shared by every layer.
//!
//! Value types are open-ended: the parser's registry allocates a [`TypeId`]
//! for every type a collaborator registers. The handful of types the core
//! itself needs have fixed, reserved ids.

use std::fmt;

/// Identifier of a registered value type.
///
/// Ids are dense indices into the type table of a frozen registry.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    // =========================================================================
    // Reserved Types
    // =========================================================================
    // These are always registered first with fixed indices.

    /// The top type; every value is an object.
    pub const OBJECT: TypeId = TypeId(0);

    /// Booleans.
    pub const BOOLEAN: TypeId = TypeId(1);

    /// Numbers (integers and floats).
    pub const NUMBER: TypeId = TypeId(2);

    /// Integers (a subtype of [`TypeId::NUMBER`]).
    pub const INTEGER: TypeId = TypeId(3);

    /// Text.
    pub const STRING: TypeId = TypeId(4);

    /// Durations.
    pub const TIMESPAN: TypeId = TypeId(5);

    /// Number of reserved type ids.
    pub const RESERVED: u32 = 6;

    /// Creates a type id from a raw index.
    #[must_use]
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index of this type id.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Returns true for one of the reserved type ids.
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        self.0 < Self::RESERVED
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::OBJECT => write!(f, "TypeId(object)"),
            Self::BOOLEAN => write!(f, "TypeId(boolean)"),
            Self::NUMBER => write!(f, "TypeId(number)"),
            Self::INTEGER => write!(f, "TypeId(integer)"),
            Self::STRING => write!(f, "TypeId(string)"),
            Self::TIMESPAN => write!(f, "TypeId(timespan)"),
            Self(n) => write!(f, "TypeId({n})"),
        }
    }
}

// =============================================================================
// Kleenean
// =============================================================================

/// Three-valued logic.
///
/// Used for facts that are only partially known at parse time, most notably
/// whether a delay may already have happened before a statement.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Kleenean {
    /// Definitely not.
    #[default]
    False,
    /// Maybe.
    Unknown,
    /// Definitely.
    True,
}

impl Kleenean {
    /// Returns true only for [`Kleenean::True`].
    #[must_use]
    pub const fn is_true(self) -> bool {
        matches!(self, Self::True)
    }

    /// Returns true only for [`Kleenean::False`].
    #[must_use]
    pub const fn is_false(self) -> bool {
        matches!(self, Self::False)
    }

    /// Returns true unless the value is [`Kleenean::False`].
    #[must_use]
    pub const fn is_possible(self) -> bool {
        !self.is_false()
    }

    /// Logical or.
    #[must_use]
    pub const fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::True, _) | (_, Self::True) => Self::True,
            (Self::Unknown, _) | (_, Self::Unknown) => Self::Unknown,
            _ => Self::False,
        }
    }

    /// Logical and.
    #[must_use]
    pub const fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::False, _) | (_, Self::False) => Self::False,
            (Self::Unknown, _) | (_, Self::Unknown) => Self::Unknown,
            _ => Self::True,
        }
    }
}

impl From<bool> for Kleenean {
    fn from(b: bool) -> Self {
        if b { Self::True } else { Self::False }
    }
}

// =============================================================================
// Time
// =============================================================================

/// Temporal state an expression is evaluated in, relative to the occurrence
/// that triggered the execution.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Time {
    /// The state before the occurrence (`@-1`).
    Past,
    /// The current state.
    #[default]
    Present,
    /// The state after the occurrence (`@1`).
    Future,
}

impl Time {
    /// Maps the numeric placeholder marker (`-1`, `0`, `1`) to a time.
    #[must_use]
    pub const fn from_marker(marker: i8) -> Option<Self> {
        match marker {
            -1 => Some(Self::Past),
            0 => Some(Self::Present),
            1 => Some(Self::Future),
            _ => None,
        }
    }

    /// Returns the numeric marker of this time.
    #[must_use]
    pub const fn marker(self) -> i8 {
        match self {
            Self::Past => -1,
            Self::Present => 0,
            Self::Future => 1,
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Past => write!(f, "past"),
            Self::Present => write!(f, "present"),
            Self::Future => write!(f, "future"),
        }
    }
}

// =============================================================================
// ChangeMode
// =============================================================================

/// The mutation verb requested on an expression.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChangeMode {
    /// Replace the current value(s).
    Set,
    /// Add to the current value(s).
    Add,
    /// Remove one occurrence of each given value.
    Remove,
    /// Remove every occurrence of each given value.
    RemoveAll,
    /// Clear the value(s).
    Delete,
    /// Restore the default value(s).
    Reset,
}

impl ChangeMode {
    /// All modes, in declaration order.
    pub const ALL: [ChangeMode; 6] = [
        Self::Set,
        Self::Add,
        Self::Remove,
        Self::RemoveAll,
        Self::Delete,
        Self::Reset,
    ];

    /// Returns true if this mode takes a delta (the values to set/add/remove).
    #[must_use]
    pub const fn takes_delta(self) -> bool {
        matches!(self, Self::Set | Self::Add | Self::Remove | Self::RemoveAll)
    }
}

impl fmt::Display for ChangeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Set => "set",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::RemoveAll => "remove all",
            Self::Delete => "delete",
            Self::Reset => "reset",
        };
        f.write_str(name)
    }
}
