//! Typed placeholders (`%type%`).
//!
//! The text between the percent signs reads
//! `[flags]type[/type2...][@time]`, where flags are any of `-` (optional),
//! `*` (literals only) and `~` (expressions only), each type name may be
//! singular or plural, and the time marker is `-1`, `0` or `1`.

use trellis_foundation::{Time, TypeId};

use crate::pattern::PatternError;
use crate::types::TypeSystem;

/// What a slot may be filled with.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Restriction {
    /// Expressions and literals.
    #[default]
    Any,
    /// Only literals (`*`).
    LiteralOnly,
    /// Only expressions (`~`).
    ExpressionOnly,
}

/// A parsed placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotInfo {
    /// Candidate types in priority order.
    pub types: Vec<TypeId>,
    /// Per candidate: whether multiple values are accepted.
    pub plural: Vec<bool>,
    /// True if the slot may be left unbound without a default.
    pub optional: bool,
    /// Literal/expression restriction.
    pub restriction: Restriction,
    /// Temporal state to bind the expression to.
    pub time: Time,
}

impl SlotInfo {
    /// Parses the content of a `%...%` placeholder.
    pub fn parse(content: &str, types: &TypeSystem) -> Result<Self, PatternError> {
        let invalid = |reason: &str| PatternError::InvalidSlot {
            slot: content.to_string(),
            reason: reason.to_string(),
        };

        let mut optional = false;
        let mut restriction = Restriction::Any;
        let mut rest = content.trim();
        while let Some(flag) = rest.chars().next() {
            let next = match flag {
                '-' => {
                    optional = true;
                    Restriction::Any
                }
                '*' => Restriction::LiteralOnly,
                '~' => Restriction::ExpressionOnly,
                _ => break,
            };
            if next != Restriction::Any {
                if restriction != Restriction::Any && restriction != next {
                    return Err(invalid("a slot cannot be both literal-only and expression-only"));
                }
                restriction = next;
            }
            rest = &rest[flag.len_utf8()..];
        }

        let (names, time) = match rest.split_once('@') {
            Some((names, marker)) => {
                let time = marker
                    .trim()
                    .parse::<i8>()
                    .ok()
                    .and_then(Time::from_marker)
                    .ok_or_else(|| invalid("time marker must be -1, 0 or 1"))?;
                (names, time)
            }
            None => (rest, Time::Present),
        };

        let mut ids = Vec::new();
        let mut plural = Vec::new();
        for name in names.split('/') {
            let name = name.trim();
            if name.is_empty() {
                return Err(invalid("empty type name"));
            }
            let (id, is_plural) = types.lookup(name).ok_or_else(|| PatternError::UnknownType {
                name: name.to_string(),
            })?;
            ids.push(id);
            plural.push(is_plural);
        }

        Ok(Self {
            types: ids,
            plural,
            optional,
            restriction,
            time,
        })
    }

    /// Marks every candidate as plural (the `%...%s` form).
    pub fn make_plural(&mut self) {
        self.plural.iter_mut().for_each(|p| *p = true);
    }

    /// Whether the given candidate accepts multiple values.
    #[must_use]
    pub fn is_plural_for(&self, ty: TypeId) -> bool {
        self.types
            .iter()
            .position(|&t| t == ty)
            .and_then(|i| self.plural.get(i).copied())
            .unwrap_or(false)
    }

    /// True if any candidate accepts multiple values.
    #[must_use]
    pub fn any_plural(&self) -> bool {
        self.plural.iter().any(|&p| p)
    }

    /// True if literals are not allowed.
    #[must_use]
    pub fn expressions_only(&self) -> bool {
        self.restriction == Restriction::ExpressionOnly
    }

    /// True if expressions are not allowed.
    #[must_use]
    pub fn literals_only(&self) -> bool {
        self.restriction == Restriction::LiteralOnly
    }

    /// A slot accepting any number of values of the given types.
    #[must_use]
    pub fn plural_of(types: &[TypeId]) -> Self {
        Self {
            types: types.to_vec(),
            plural: vec![true; types.len()],
            optional: false,
            restriction: Restriction::Any,
            time: Time::Present,
        }
    }

    /// A slot accepting one value of the given types.
    #[must_use]
    pub fn single_of(types: &[TypeId]) -> Self {
        Self {
            plural: vec![false; types.len()],
            ..Self::plural_of(types)
        }
    }
}
