//! The type table: names, literal parsers, default expressions, subtyping
//! and the single-hop converter table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use trellis_foundation::{TypeId, Value};

use crate::element::Expression;

/// Parses a literal of one type from source text.
pub type LiteralParser = fn(&str) -> Option<Value>;

/// Converts a value of one type into another. `None` means the particular
/// value has no counterpart.
pub type Converter = fn(&Value) -> Option<Value>;

/// Builds the expression an omitted placeholder of a type stands for.
pub type DefaultExpression = Arc<dyn Fn() -> Box<dyn Expression> + Send + Sync>;

// =============================================================================
// TypeDef
// =============================================================================

/// Definition of a type to register.
#[derive(Clone)]
pub struct TypeDef {
    name: String,
    plural: String,
    aliases: Vec<(String, String)>,
    supertype: Option<TypeId>,
    parser: Option<LiteralParser>,
    default_expression: Option<DefaultExpression>,
}

impl TypeDef {
    /// Creates a definition; the plural defaults to `name` + `s`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            plural: format!("{}s", name.to_lowercase()),
            aliases: Vec::new(),
            supertype: None,
            parser: None,
            default_expression: None,
        }
    }

    /// Sets the plural name.
    #[must_use]
    pub fn plural(mut self, plural: &str) -> Self {
        self.plural = plural.to_lowercase();
        self
    }

    /// Adds another singular/plural name pair.
    #[must_use]
    pub fn alias(mut self, singular: &str, plural: &str) -> Self {
        self.aliases
            .push((singular.to_lowercase(), plural.to_lowercase()));
        self
    }

    /// Declares this type a subtype of another.
    #[must_use]
    pub fn supertype(mut self, supertype: TypeId) -> Self {
        self.supertype = Some(supertype);
        self
    }

    /// Sets the literal parser.
    #[must_use]
    pub fn parser(mut self, parser: LiteralParser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Sets the default expression.
    #[must_use]
    pub fn default_expression(
        mut self,
        f: impl Fn() -> Box<dyn Expression> + Send + Sync + 'static,
    ) -> Self {
        self.default_expression = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("plural", &self.plural)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TypeInfo
// =============================================================================

/// A registered type.
#[derive(Clone)]
pub struct TypeInfo {
    id: TypeId,
    name: String,
    plural: String,
    supertype: Option<TypeId>,
    parser: Option<LiteralParser>,
    default_expression: Option<DefaultExpression>,
}

impl TypeInfo {
    /// The type id.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The singular name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The plural name.
    #[must_use]
    pub fn plural(&self) -> &str {
        &self.plural
    }

    /// The direct supertype.
    #[must_use]
    pub fn supertype(&self) -> Option<TypeId> {
        self.supertype
    }

    /// Parses a literal of this type.
    #[must_use]
    pub fn parse_literal(&self, text: &str) -> Option<Value> {
        self.parser.and_then(|p| p(text))
    }

    /// True if this type has a literal parser.
    #[must_use]
    pub fn has_parser(&self) -> bool {
        self.parser.is_some()
    }

    /// Builds this type's default expression, if it has one.
    #[must_use]
    pub fn default_expression(&self) -> Option<Box<dyn Expression>> {
        self.default_expression.as_ref().map(|f| f())
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("supertype", &self.supertype)
            .field("parser", &self.parser.is_some())
            .field("default_expression", &self.default_expression.is_some())
            .finish()
    }
}

// =============================================================================
// TypeSystem
// =============================================================================

/// All registered types and converters.
#[derive(Debug)]
pub struct TypeSystem {
    types: Vec<TypeInfo>,
    names: HashMap<String, (TypeId, bool)>,
    converters: HashMap<(TypeId, TypeId), Converter>,
}

impl TypeSystem {
    /// Creates a table holding the reserved types.
    pub(crate) fn with_reserved() -> Self {
        let mut system = Self {
            types: Vec::new(),
            names: HashMap::new(),
            converters: HashMap::new(),
        };
        let reserved = [
            TypeDef::new("object"),
            TypeDef::new("boolean"),
            TypeDef::new("number"),
            TypeDef::new("integer").supertype(TypeId::NUMBER),
            TypeDef::new("string").alias("text", "texts"),
            TypeDef::new("timespan").alias("time span", "time spans"),
        ];
        for def in reserved {
            system.push(def);
        }
        system
    }

    fn push(&mut self, def: TypeDef) -> TypeId {
        let index = u32::try_from(self.types.len()).unwrap_or(u32::MAX);
        let id = TypeId::from_index(index);
        self.names.insert(def.name.clone(), (id, false));
        self.names.insert(def.plural.clone(), (id, true));
        for (singular, plural) in &def.aliases {
            self.names.insert(singular.clone(), (id, false));
            self.names.insert(plural.clone(), (id, true));
        }
        self.types.push(TypeInfo {
            id,
            name: def.name,
            plural: def.plural,
            supertype: def.supertype,
            parser: def.parser,
            default_expression: def.default_expression,
        });
        id
    }

    /// Registers a new type. Returns the clashing name if any of its names is
    /// already taken.
    pub(crate) fn define(&mut self, def: TypeDef) -> Result<TypeId, String> {
        let names = std::iter::once((&def.name, &def.plural))
            .chain(def.aliases.iter().map(|(s, p)| (s, p)));
        for (singular, plural) in names {
            for name in [singular, plural] {
                if self.names.contains_key(name) {
                    return Err(name.clone());
                }
            }
        }
        Ok(self.push(def))
    }

    pub(crate) fn info_mut(&mut self, id: TypeId) -> Option<&mut TypeInfo> {
        self.types.get_mut(id.index() as usize)
    }

    pub(crate) fn set_parser(&mut self, id: TypeId, parser: LiteralParser) -> bool {
        self.info_mut(id).map(|info| info.parser = Some(parser)).is_some()
    }

    pub(crate) fn set_default(&mut self, id: TypeId, default: DefaultExpression) -> bool {
        self.info_mut(id)
            .map(|info| info.default_expression = Some(default))
            .is_some()
    }

    pub(crate) fn add_converter(&mut self, from: TypeId, to: TypeId, converter: Converter) {
        self.converters.insert((from, to), converter);
    }

    /// Looks up a type by singular or plural name. The flag is true for the
    /// plural form.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<(TypeId, bool)> {
        self.names.get(&name.trim().to_lowercase()).copied()
    }

    /// Returns a registered type.
    #[must_use]
    pub fn info(&self, id: TypeId) -> Option<&TypeInfo> {
        self.types.get(id.index() as usize)
    }

    /// All registered types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeInfo> {
        self.types.iter()
    }

    /// The singular name of a type.
    #[must_use]
    pub fn name(&self, id: TypeId) -> &str {
        self.info(id).map_or("object", TypeInfo::name)
    }

    /// Human-readable list of type names: "number or text".
    #[must_use]
    pub fn describe(&self, ids: &[TypeId]) -> String {
        let names: Vec<&str> = ids.iter().map(|&id| self.name(id)).collect();
        match names.split_last() {
            None => "object".to_string(),
            Some((last, [])) => (*last).to_string(),
            Some((last, rest)) => format!("{} or {last}", rest.join(", ")),
        }
    }

    /// True if `sub` is `sup`, `sup` is `OBJECT`, or `sup` is reachable
    /// through the supertype chain.
    #[must_use]
    pub fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        if sup == TypeId::OBJECT {
            return true;
        }
        let mut current = Some(sub);
        let mut steps = 0;
        while let Some(id) = current {
            if id == sup {
                return true;
            }
            steps += 1;
            if steps > self.types.len() {
                return false;
            }
            current = self.info(id).and_then(TypeInfo::supertype);
        }
        false
    }

    /// The registered converter from one type to another. Only direct
    /// entries are returned; chains are never composed.
    #[must_use]
    pub fn converter(&self, from: TypeId, to: TypeId) -> Option<Converter> {
        self.converters.get(&(from, to)).copied()
    }

    /// Converts a value to the first target type it can reach: as-is if it is
    /// already a subtype, otherwise through one registered converter.
    #[must_use]
    pub fn convert(&self, value: &Value, targets: &[TypeId]) -> Option<Value> {
        let actual = value.type_id();
        if targets.iter().any(|&t| self.is_subtype(actual, t)) {
            return Some(value.clone());
        }
        targets
            .iter()
            .filter_map(|&t| self.converter(actual, t))
            .find_map(|convert| convert(value))
    }
}
