//! The backtracking pattern matcher.
//!
//! Matching walks the compiled pattern recursively. What is left to match
//! after the current group is passed down as a chain of [`Frame`]s, so every
//! choice point can retry the whole remainder of the pattern. Placeholders
//! try their candidate spans longest first and only resolve their text once
//! the rest of the pattern has matched; resolutions are cached per span so
//! backtracking never parses the same text twice.
//!
//! Only the outcome of the winning path is kept. Diagnostics from resolution
//! failures compete in a [`BestDiagnostic`]; warnings travel with the
//! resolved expression and are dropped with it if its branch is abandoned.

use std::collections::HashMap;

use trellis_foundation::ensure_sufficient_stack;

use crate::diagnostic::{BestDiagnostic, Diagnostic, Warning};
use crate::element::{Expression, RegexMatch};
use crate::pattern::{Node, Pattern};
use crate::split::slot_ends;

/// A resolved placeholder.
#[derive(Debug)]
pub struct Resolved {
    /// The bound expression.
    pub expr: Box<dyn Expression>,
    /// Warnings produced while resolving it.
    pub warnings: Vec<Warning>,
}

impl Resolved {
    /// Wraps an expression without warnings.
    #[must_use]
    pub fn new(expr: Box<dyn Expression>) -> Self {
        Self {
            expr,
            warnings: Vec::new(),
        }
    }
}

/// The outcome of matching one pattern against a whole input.
#[derive(Debug)]
pub struct PatternMatch {
    /// One entry per placeholder; `None` where the placeholder was inside an
    /// excluded optional group.
    pub exprs: Vec<Option<Resolved>>,
    /// Inline regex results, left to right.
    pub regexes: Vec<RegexMatch>,
    /// XOR of the marks of the taken alternatives.
    pub mark: i32,
}

/// Resolves the text captured by placeholder `slot`.
pub type SlotResolver<'r> = dyn FnMut(usize, &str) -> Result<Resolved, Diagnostic> + 'r;

/// What remains to be matched after the current node list.
struct Frame<'a> {
    nodes: &'a [Node],
    next: Option<&'a Frame<'a>>,
}

struct Matcher<'p, 'r, 'f> {
    pattern: &'p Pattern,
    chars: Vec<char>,
    lower: Vec<char>,
    resolve: &'f mut SlotResolver<'r>,
    bindings: Vec<Option<usize>>,
    resolved: Vec<Option<Resolved>>,
    cache: HashMap<(usize, usize, usize), Option<usize>>,
    regexes: Vec<RegexMatch>,
    mark: i32,
    best: BestDiagnostic,
}

/// Matches `input` against `pattern`.
///
/// On failure returns the best diagnostic any placeholder produced, or
/// `None` if the pattern simply did not fit.
pub fn match_pattern(
    pattern: &Pattern,
    input: &str,
    resolve: &mut SlotResolver<'_>,
) -> Result<PatternMatch, Option<Diagnostic>> {
    let chars: Vec<char> = input.trim().chars().collect();
    let lower = chars
        .iter()
        .map(|c| c.to_lowercase().next().unwrap_or(*c))
        .collect();
    let mut matcher = Matcher {
        pattern,
        chars,
        lower,
        resolve,
        bindings: vec![None; pattern.slot_count()],
        resolved: Vec::new(),
        cache: HashMap::new(),
        regexes: Vec::new(),
        mark: 0,
        best: BestDiagnostic::new(),
    };
    if !matcher.go(pattern.nodes(), None, 0, 0) {
        return Err(matcher.best.into_inner());
    }
    let Matcher {
        bindings,
        mut resolved,
        regexes,
        mark,
        ..
    } = matcher;
    let exprs = bindings
        .into_iter()
        .map(|b| b.and_then(|i| resolved.get_mut(i).and_then(Option::take)))
        .collect();
    Ok(PatternMatch {
        exprs,
        regexes,
        mark,
    })
}

impl<'p> Matcher<'p, '_, '_> {
    fn go<'a>(
        &mut self,
        nodes: &'a [Node],
        next: Option<&'a Frame<'a>>,
        at: usize,
        mark: i32,
    ) -> bool {
        ensure_sufficient_stack(|| self.step(nodes, next, at, mark))
    }

    fn step<'a>(
        &mut self,
        nodes: &'a [Node],
        next: Option<&'a Frame<'a>>,
        at: usize,
        mark: i32,
    ) -> bool {
        let Some((node, rest)) = nodes.split_first() else {
            return match next {
                Some(frame) => self.go(frame.nodes, frame.next, at, mark),
                None if at == self.chars.len() => {
                    self.mark = mark;
                    true
                }
                None => false,
            };
        };
        let pattern: &'p Pattern = self.pattern;
        match node {
            Node::Text(text) => {
                let end = at + text.len();
                if self.lower.get(at..end) == Some(text.as_slice()) {
                    self.go(rest, next, end, mark)
                } else {
                    false
                }
            }
            Node::Space => {
                let mut end = at;
                while self.chars.get(end).is_some_and(|c| c.is_whitespace()) {
                    end += 1;
                }
                let boundary = at == 0
                    || at == self.chars.len()
                    || self.chars[at - 1].is_whitespace();
                if end > at || boundary {
                    self.go(rest, next, end, mark)
                } else {
                    false
                }
            }
            Node::Optional { mark: m, nodes } => {
                let frame = Frame { nodes: rest, next };
                self.go(nodes, Some(&frame), at, mark ^ m) || self.go(rest, next, at, mark)
            }
            Node::Choice(branches) => {
                let frame = Frame { nodes: rest, next };
                branches
                    .iter()
                    .any(|b| self.go(&b.nodes, Some(&frame), at, mark ^ b.mark))
            }
            Node::Slot(slot) => {
                for end in slot_ends(&self.chars, at).into_iter().rev() {
                    let saved_bindings = self.bindings.clone();
                    let saved_regexes = self.regexes.len();
                    if !self.go(rest, next, end, mark) {
                        continue;
                    }
                    if let Some(index) = self.resolve_span(*slot, at, end) {
                        self.bindings[*slot] = Some(index);
                        return true;
                    }
                    self.bindings = saved_bindings;
                    self.regexes.truncate(saved_regexes);
                }
                false
            }
            Node::Regex(index) => {
                let Some(regex) = pattern.regex(*index) else {
                    return false;
                };
                for end in (at + 1..=self.chars.len()).rev() {
                    if self.chars[end - 1].is_whitespace() {
                        continue;
                    }
                    let text: String = self.chars[at..end].iter().collect();
                    let Some(captures) = regex.captures(&text) else {
                        continue;
                    };
                    self.regexes.push(RegexMatch::from_captures(&captures));
                    if self.go(rest, next, end, mark) {
                        return true;
                    }
                    self.regexes.pop();
                }
                false
            }
        }
    }

    fn resolve_span(&mut self, slot: usize, start: usize, end: usize) -> Option<usize> {
        if let Some(&cached) = self.cache.get(&(slot, start, end)) {
            return cached;
        }
        let text: String = self.chars[start..end].iter().collect();
        let entry = match (self.resolve)(slot, &text) {
            Ok(resolved) => {
                self.resolved.push(Some(resolved));
                Some(self.resolved.len() - 1)
            }
            Err(diagnostic) => {
                self.best.offer(diagnostic.at(end));
                None
            }
        };
        self.cache.insert((slot, start, end), entry);
        entry
    }
}
