//! Expression resolution.
//!
//! Turns the text captured by a placeholder into an expression of one of the
//! placeholder's candidate types. In order:
//!
//! 1. parenthesised groups, quoted strings and `{variables}`;
//! 2. registered expressions returning a candidate type (or a subtype);
//! 3. registered expressions whose type converts to a candidate in one hop;
//! 4. literals, via each candidate type's parser.
//!
//! Text with top-level `,`/`and`/`or`/`nor` that does not parse as one
//! expression is parsed as a list. The surfaced error on failure is the best
//! diagnostic collected, or "'x' is not a <type>".

use std::sync::Arc;

use trellis_foundation::{LIST_SUFFIX, Time, TypeId, Value, ensure_sufficient_stack};
use trellis_storage::{VariableStore, is_local_name};

use crate::config::ParserConfig;
use crate::diagnostic::{BestDiagnostic, Diagnostic, Warning};
use crate::element::{Expression, InitArgs, InitResult, MatchInfo};
use crate::expr::{ConvertedExpression, Part, ExpressionList, Literal, Template, TextTemplate, Variable};
use crate::matcher::{Resolved, match_pattern};
use crate::registry::{Registry, SyntaxInfo};
use crate::scope::ParseScope;
use crate::slot::SlotInfo;
use crate::split::{
    ListSplit, Segment, Separator, enclosed, quoted, split_list, template_segments,
    unescape_quotes,
};

/// An expression accepted for a slot, with the candidate it was accepted as.
struct Accepted {
    resolved: Resolved,
    ty: TypeId,
    plural: bool,
}

/// Resolution state for one parse call.
pub(crate) struct Resolver<'a> {
    pub(crate) registry: &'a Registry,
    pub(crate) store: &'a Arc<dyn VariableStore>,
    pub(crate) config: &'a ParserConfig,
    pub(crate) scope: &'a ParseScope,
}

fn with_article(noun: &str) -> String {
    let article = if noun.starts_with(['a', 'e', 'i', 'o', 'u']) {
        "an"
    } else {
        "a"
    };
    format!("{article} {noun}")
}

impl<'a> Resolver<'a> {
    // =========================================================================
    // Syntax matching
    // =========================================================================

    /// Matches `text` against every pattern of `syntaxes` in order and builds
    /// the first full match the factory accepts.
    pub(crate) fn match_syntaxes<'s, F: 's, T>(
        &self,
        text: &str,
        syntaxes: impl IntoIterator<Item = &'s SyntaxInfo<F>>,
        build: impl Fn(&F, InitArgs<'_>) -> InitResult<T>,
    ) -> Result<(T, Vec<Warning>), BestDiagnostic> {
        let text = text.trim();
        let reached = text.chars().count();
        let mut best = BestDiagnostic::new();
        for syntax in syntaxes {
            'patterns: for (index, pattern) in syntax.patterns().iter().enumerate() {
                let slots = pattern.slots();
                let mut resolve = |slot: usize, span: &str| match slots.get(slot) {
                    Some(info) => self.resolve_slot(span, info),
                    None => Err(Diagnostic::generic("placeholder out of range")),
                };
                let found = match match_pattern(pattern, text, &mut resolve) {
                    Ok(found) => found,
                    Err(diagnostic) => {
                        if let Some(d) = diagnostic {
                            best.offer(d);
                        }
                        continue;
                    }
                };

                let mut warnings = Vec::new();
                let mut exprs = Vec::with_capacity(found.exprs.len());
                for (slot, resolved) in slots.iter().zip(found.exprs) {
                    match resolved {
                        Some(r) => {
                            warnings.extend(r.warnings);
                            exprs.push(Some(r.expr));
                        }
                        None if slot.optional => exprs.push(None),
                        None => match self.default_for(slot) {
                            Some(expr) => exprs.push(Some(expr)),
                            None => {
                                best.offer(
                                    Diagnostic::semantic(format!(
                                        "'{text}' is missing {}",
                                        with_article(
                                            &self.registry.types().describe(&slot.types)
                                        )
                                    ))
                                    .at(reached),
                                );
                                continue 'patterns;
                            }
                        },
                    }
                }

                let info = MatchInfo {
                    mark: found.mark,
                    regexes: found.regexes,
                    text: text.to_string(),
                };
                let args = InitArgs::new(exprs, index, info, self.scope, self.registry.types());
                match build(syntax.factory(), args) {
                    Ok(element) => return Ok((element, warnings)),
                    Err(d) => best.offer(d.at(reached)),
                }
            }
        }
        Err(best)
    }

    fn default_for(&self, slot: &SlotInfo) -> Option<Box<dyn Expression>> {
        let types = self.registry.types();
        slot.types
            .iter()
            .find_map(|&t| types.info(t).and_then(|info| info.default_expression()))
    }

    // =========================================================================
    // Slots
    // =========================================================================

    /// Resolves placeholder text, enforcing cardinality and time binding.
    pub(crate) fn resolve_slot(&self, text: &str, slot: &SlotInfo) -> Result<Resolved, Diagnostic> {
        ensure_sufficient_stack(|| {
            let text = text.trim();
            let Accepted {
                mut resolved,
                ty,
                plural,
            } = self.parse_value(text, slot)?;
            if !plural && !resolved.expr.is_single() {
                return Err(Diagnostic::semantic(format!(
                    "'{text}' can be more than one {}, but only one is allowed here",
                    self.registry.types().name(ty)
                )));
            }
            if slot.time != Time::Present && !resolved.expr.set_time(slot.time) {
                return Err(Diagnostic::semantic(format!(
                    "'{text}' has no {} state",
                    slot.time
                )));
            }
            Ok(resolved)
        })
    }

    fn parse_value(&self, text: &str, slot: &SlotInfo) -> Result<Accepted, Diagnostic> {
        let single = match self.parse_single(text, slot) {
            Ok(accepted) => return Ok(accepted),
            Err(d) => d,
        };
        if let Some(split) = split_list(text) {
            match self.parse_list(text, &split, slot) {
                Ok(accepted) => return Ok(accepted),
                Err(d) if d.quality >= single.quality => return Err(d),
                Err(_) => {}
            }
        }
        Err(single)
    }

    fn parse_single(&self, text: &str, slot: &SlotInfo) -> Result<Accepted, Diagnostic> {
        if text.is_empty() {
            return Err(Diagnostic::not_an_expression("an expression is missing"));
        }
        if let Some(inner) = enclosed(text, '(', ')') {
            return self.parse_value(inner.trim(), slot);
        }
        if let Some(raw) = quoted(text) {
            let (expr, warnings) = self.text(raw)?;
            let is_literal = expr.literal_values().is_some();
            self.check_restriction(text, slot, is_literal)?;
            return self.accept(text, expr, warnings, slot);
        }
        if let Some(inner) = enclosed(text, '{', '}') {
            self.check_restriction(text, slot, false)?;
            let (variable, warnings) = self.variable(inner)?;
            return self.accept(text, Box::new(variable), warnings, slot);
        }

        let mut best = BestDiagnostic::new();
        if !slot.literals_only() {
            match self.parse_registered(text, slot) {
                Ok(accepted) => return Ok(accepted),
                Err(b) => best.merge(b),
            }
        }
        if !slot.expressions_only() {
            if let Some(accepted) = self.parse_literal(text, slot) {
                return Ok(accepted);
            }
        }
        Err(best.finish(|| {
            Diagnostic::not_an_expression(format!(
                "'{text}' is not {}",
                with_article(&self.registry.types().describe(&slot.types))
            ))
        }))
    }

    fn check_restriction(&self, text: &str, slot: &SlotInfo, literal: bool) -> Result<(), Diagnostic> {
        if slot.literals_only() && !literal {
            return Err(Diagnostic::semantic(format!(
                "only literals are allowed here, but '{text}' is an expression"
            )));
        }
        if slot.expressions_only() && literal {
            return Err(Diagnostic::not_an_expression(format!(
                "'{text}' is a literal, but an expression is needed here"
            )));
        }
        Ok(())
    }

    /// Fits an expression to the slot: as-is for a candidate type or subtype,
    /// with a run-time filter for untyped (`object`) expressions, or through
    /// one converter.
    fn accept(
        &self,
        text: &str,
        expr: Box<dyn Expression>,
        warnings: Vec<Warning>,
        slot: &SlotInfo,
    ) -> Result<Accepted, Diagnostic> {
        let types = self.registry.types();
        let ret = expr.return_type();
        let candidates = slot.types.iter().copied().zip(slot.plural.iter().copied());

        let (expr, ty, plural): (Box<dyn Expression>, TypeId, bool) =
            if let Some((ty, plural)) = candidates.clone().find(|&(t, _)| types.is_subtype(ret, t)) {
                (expr, ty, plural)
            } else if ret == TypeId::OBJECT {
                let ty = slot.types.first().copied().unwrap_or(TypeId::OBJECT);
                let converted =
                    ConvertedExpression::new(expr, slot.types.clone(), Arc::clone(types));
                (Box::new(converted), ty, slot.any_plural())
            } else if let Some((ty, plural)) =
                candidates.clone().find(|&(t, _)| types.converter(ret, t).is_some())
            {
                let converted = ConvertedExpression::new(expr, vec![ty], Arc::clone(types));
                (Box::new(converted), ty, plural)
            } else {
                return Err(Diagnostic::not_an_expression(format!(
                    "'{text}' is not {}",
                    with_article(&types.describe(&slot.types))
                )));
            };
        Ok(Accepted {
            resolved: Resolved { expr, warnings },
            ty,
            plural,
        })
    }

    fn parse_registered(&self, text: &str, slot: &SlotInfo) -> Result<Accepted, BestDiagnostic> {
        let types = self.registry.types();
        let exact = |ret: TypeId| slot.types.iter().any(|&t| types.is_subtype(ret, t));
        let convertible = |ret: TypeId| {
            ret == TypeId::OBJECT || slot.types.iter().any(|&t| types.converter(ret, t).is_some())
        };

        let mut best = BestDiagnostic::new();
        for exact_pass in [true, false] {
            let syntaxes = self
                .registry
                .expressions()
                .iter()
                .filter(|info| {
                    let ret = info.return_type;
                    if exact_pass {
                        exact(ret)
                    } else {
                        !exact(ret) && convertible(ret)
                    }
                })
                .map(|info| &info.syntax);
            let result = self.match_syntaxes(text, syntaxes, |factory, args| {
                let expr = factory(args)?;
                self.accept(text, expr, Vec::new(), slot)
            });
            match result {
                Ok((mut accepted, warnings)) => {
                    accepted.resolved.warnings.extend(warnings);
                    return Ok(accepted);
                }
                Err(b) => best.merge(b),
            }
        }
        Err(best)
    }

    fn parse_literal(&self, text: &str, slot: &SlotInfo) -> Option<Accepted> {
        let types = self.registry.types();
        for (&ty, &plural) in slot.types.iter().zip(&slot.plural) {
            let value = if ty == TypeId::OBJECT {
                types.iter().find_map(|info| info.parse_literal(text))
            } else {
                types.info(ty).and_then(|info| info.parse_literal(text))
            };
            if let Some(value) = value {
                let literal_type = if ty == TypeId::OBJECT { value.type_id() } else { ty };
                return Some(Accepted {
                    resolved: Resolved::new(Box::new(Literal::single(value, literal_type))),
                    ty,
                    plural,
                });
            }
        }
        None
    }

    // =========================================================================
    // Lists
    // =========================================================================

    fn parse_list(&self, text: &str, split: &ListSplit, slot: &SlotInfo) -> Result<Accepted, Diagnostic> {
        let pieces = &split.pieces;
        let n = pieces.len();
        if n > self.config.max_list_len {
            return Err(Diagnostic::semantic(format!(
                "'{text}' has {n} items, more than the allowed {}",
                self.config.max_list_len
            )));
        }

        let mut members: Vec<Accepted> = Vec::new();
        let mut separators: Vec<Separator> = Vec::new();
        let mut start = 0;
        while start < n {
            let mut found = None;
            let mut piece_error = None;
            for end in (start..n).rev() {
                if start == 0 && end == n - 1 {
                    continue;
                }
                let member = &text[pieces[start].0..pieces[end].1];
                match self.parse_single(member, slot) {
                    Ok(accepted) => {
                        found = Some((end, accepted));
                        break;
                    }
                    Err(d) if end == start => piece_error = Some(d),
                    Err(_) => {}
                }
            }
            let Some((end, accepted)) = found else {
                return Err(piece_error.unwrap_or_else(|| {
                    Diagnostic::not_an_expression(format!("'{text}' is not a valid list"))
                }));
            };
            if start > 0 {
                separators.push(split.separators[start - 1]);
            }
            members.push(accepted);
            start = end + 1;
        }

        let has_and = separators.contains(&Separator::And);
        let has_or = separators
            .iter()
            .any(|s| matches!(s, Separator::Or | Separator::Nor));
        let mut warnings: Vec<Warning> = Vec::new();
        let and = match (has_and, has_or) {
            (true, true) => {
                if self.config.warn_mixed_conjunctions {
                    warnings.push(Warning::new(format!(
                        "list '{text}' mixes 'and' and 'or'; it is treated as an 'and' list"
                    )));
                }
                true
            }
            (false, true) => false,
            (true, false) => true,
            (false, false) => {
                if self.config.warn_missing_conjunction {
                    warnings.push(Warning::new(format!(
                        "list '{text}' has no 'and' or 'or'; it is treated as an 'and' list"
                    )));
                }
                true
            }
        };
        Ok(self.build_list(members, warnings, and, slot))
    }

    fn build_list(
        &self,
        members: Vec<Accepted>,
        mut warnings: Vec<Warning>,
        and: bool,
        slot: &SlotInfo,
    ) -> Accepted {
        let types = self.registry.types();
        let first_ty = members.first().map_or(TypeId::OBJECT, |m| m.ty);
        let (ty, plural) = if members.iter().all(|m| m.ty == first_ty) {
            (first_ty, slot.is_plural_for(first_ty))
        } else {
            let common = slot
                .types
                .iter()
                .copied()
                .find(|&t| {
                    members
                        .iter()
                        .all(|m| types.is_subtype(m.resolved.expr.return_type(), t))
                })
                .unwrap_or(TypeId::OBJECT);
            (common, slot.any_plural())
        };

        // The list reports the most specific type its members share.
        let first_ret = members
            .first()
            .map_or(ty, |m| m.resolved.expr.return_type());
        let list_ty = if members
            .iter()
            .all(|m| m.resolved.expr.return_type() == first_ret)
        {
            first_ret
        } else {
            ty
        };

        let all_literal = members
            .iter()
            .all(|m| m.resolved.expr.literal_values().is_some());
        let expr: Box<dyn Expression> = if all_literal {
            let values: Vec<Value> = members
                .iter()
                .filter_map(|m| m.resolved.expr.literal_values())
                .flat_map(|v| v.iter().cloned())
                .collect();
            for m in members {
                warnings.extend(m.resolved.warnings);
            }
            Box::new(Literal::list(values, list_ty, and))
        } else {
            let mut exprs = Vec::with_capacity(members.len());
            for m in members {
                warnings.extend(m.resolved.warnings);
                exprs.push(m.resolved.expr);
            }
            Box::new(ExpressionList::new(exprs, list_ty, and))
        };
        Accepted {
            resolved: Resolved { expr, warnings },
            ty,
            plural,
        }
    }

    // =========================================================================
    // Built-in forms
    // =========================================================================

    /// Parses `%expr%` parts of a template.
    fn template(&self, content: &str, unescape: bool) -> Result<(Template, Vec<Warning>), Diagnostic> {
        let segments = template_segments(content).map_err(Diagnostic::semantic)?;
        let mut parts = Vec::with_capacity(segments.len());
        let mut warnings = Vec::new();
        let any = SlotInfo::plural_of(&[TypeId::OBJECT]);
        for segment in segments {
            match segment {
                Segment::Text(t) if unescape => parts.push(Part::Text(unescape_quotes(&t))),
                Segment::Text(t) => parts.push(Part::Text(t)),
                Segment::Expr(src) => {
                    let src = if unescape {
                        unescape_quotes(src)
                    } else {
                        src.to_string()
                    };
                    let resolved = self.resolve_slot(&src, &any)?;
                    warnings.extend(resolved.warnings);
                    parts.push(Part::Expr(resolved.expr));
                }
            }
        }
        Ok((Template::new(parts), warnings))
    }

    /// Builds the expression for the content of a quoted string.
    fn text(&self, raw: &str) -> Result<(Box<dyn Expression>, Vec<Warning>), Diagnostic> {
        let (template, warnings) = self.template(raw, true)?;
        let expr: Box<dyn Expression> = match template.as_plain() {
            Some(plain) => Box::new(Literal::single(Value::string(plain), TypeId::STRING)),
            None => Box::new(TextTemplate::new(template)),
        };
        Ok((expr, warnings))
    }

    /// Builds a variable from the content of `{...}`.
    fn variable(&self, inner: &str) -> Result<(Variable, Vec<Warning>), Diagnostic> {
        let raw = inner.trim();
        if raw.is_empty() {
            return Err(Diagnostic::semantic("a variable name cannot be empty"));
        }
        let list = raw.ends_with(LIST_SUFFIX);
        let body = raw.strip_suffix(LIST_SUFFIX).unwrap_or(raw);
        if body.contains('*') {
            return Err(Diagnostic::semantic(format!(
                "'{{{raw}}}': '*' may only appear as the list suffix '::*'"
            )));
        }
        let (name, warnings) = self.template(raw, false)?;
        let variable = Variable::new(name, is_local_name(raw), list, Arc::clone(self.store));
        Ok((variable, warnings))
    }
}
