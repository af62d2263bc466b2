//! Builds a [`Trigger`] from the indented lines of an `on <event>:` block.
//!
//! Each line is parsed in the scope of the sections enclosing it. Statements
//! are tried as control statements first, then effects, then conditions
//! (guards). Lines that fail to parse are reported and skipped; the rest of
//! the trigger is still built.
//!
//! Nodes are created in source order and linked in a separate pass once the
//! whole tree exists, since a section's `next` is only known after its
//! following siblings have been parsed.

use std::sync::Arc;

use trellis_foundation::{Kleenean, TypeId, ensure_sufficient_stack};
use trellis_parser::{
    BestDiagnostic, Condition, Diagnostic, EventMatch, LoopValueSource, ParseScope, Quality, SectionFrame,
    SectionKind, SyntaxParser, Warning,
};

use crate::control::{Control, ControlSyntaxes};
use crate::cursor::{LoopCursors, LoopHandle};
use crate::graph::{Node, NodeId, NodeKind, Trigger};
use crate::loader::{Line, LoadError, LoadWarning};

/// What one trigger build produced.
pub(crate) struct Built {
    pub(crate) trigger: Trigger,
    pub(crate) errors: Vec<LoadError>,
    pub(crate) warnings: Vec<LoadWarning>,
}

pub(crate) struct TriggerBuilder<'a> {
    parser: &'a SyntaxParser,
    controls: &'a ControlSyntaxes,
    scope: ParseScope,
    nodes: Vec<Node>,
    cursors: Arc<LoopCursors>,
    errors: Vec<LoadError>,
    warnings: Vec<LoadWarning>,
}

/// Where the next `else` / `else if` in a chain attaches.
#[derive(Copy, Clone)]
enum ElseState {
    /// No conditional precedes.
    None,
    /// Attach to this `if` or `else if`. `entry` is the delay hint from
    /// before the chain's `if`.
    Open { head: NodeId, entry: Kleenean },
    /// The head failed to parse; drop branches quietly.
    Skipping,
}

impl<'a> TriggerBuilder<'a> {
    pub(crate) fn new(parser: &'a SyntaxParser, controls: &'a ControlSyntaxes, event: &str) -> Self {
        Self {
            parser,
            controls,
            scope: ParseScope::for_events(&[event.to_string()]),
            nodes: Vec::new(),
            cursors: Arc::new(LoopCursors::new()),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn build(mut self, header: &Line, event: EventMatch, source: Arc<str>) -> Built {
        let top = self.chain(&header.children, None);
        self.link(&top);
        let trigger = Trigger::new(
            event.name,
            event.guard,
            source,
            header.number,
            header.text.clone(),
            self.nodes,
            top.first().copied(),
            self.cursors,
        );
        Built {
            trigger,
            errors: self.errors,
            warnings: self.warnings,
        }
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    fn error(&mut self, line: &Line, message: impl Into<String>) {
        self.errors.push(LoadError {
            line: line.number,
            message: message.into(),
        });
    }

    fn warn(&mut self, line: &Line, message: impl Into<String>) {
        self.warnings.push(LoadWarning {
            line: line.number,
            message: message.into(),
        });
    }

    fn warn_all(&mut self, line: &Line, warnings: Vec<Warning>) {
        for w in warnings {
            self.warn(line, w.message);
        }
    }

    // =========================================================================
    // Chains
    // =========================================================================

    fn chain(&mut self, lines: &[Line], parent: Option<NodeId>) -> Vec<NodeId> {
        ensure_sufficient_stack(|| self.chain_inner(lines, parent))
    }

    fn chain_inner(&mut self, lines: &[Line], parent: Option<NodeId>) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut else_state = ElseState::None;
        let mut exited = false;
        for line in lines {
            if exited {
                self.warn(line, "unreachable code: the statement before it always exits");
                exited = false;
            }
            if line.section {
                if let Some(condition) = else_clause(&line.text) {
                    else_state = self.else_branch(line, condition, parent, else_state);
                    continue;
                }
            }
            else_state = ElseState::None;
            if line.section {
                let entry = self.scope.delayed;
                match self.section(line, parent) {
                    SectionOutcome::Built(id, is_if) => {
                        chain.push(id);
                        if is_if {
                            else_state = ElseState::Open { head: id, entry };
                        }
                    }
                    SectionOutcome::FailedIf => else_state = ElseState::Skipping,
                    SectionOutcome::Failed => {}
                }
            } else if let Some(id) = self.statement(line, parent) {
                exited = matches!(self.nodes[id.index()].kind, NodeKind::Exit(_));
                chain.push(id);
            }
        }
        chain
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn statement(&mut self, line: &Line, parent: Option<NodeId>) -> Option<NodeId> {
        let text = line.text.as_str();
        let mut best = BestDiagnostic::new();

        match self
            .parser
            .parse_with(text, self.controls.syntaxes(), &self.scope, "statement", |f, args| {
                f(args)
            }) {
            Ok(parsed) => {
                self.warn_all(line, parsed.warnings);
                let kind = match parsed.element {
                    Control::Delay(duration) => {
                        self.scope.delayed = Kleenean::True;
                        NodeKind::Delay(duration)
                    }
                    Control::Exit(target) => NodeKind::Exit(target),
                };
                return Some(self.push(Node::new(kind, parent, text, line.number)));
            }
            Err(d) => best.offer(d),
        }

        match self.parser.parse_effect(text, &self.scope) {
            Ok(parsed) => {
                self.warn_all(line, parsed.warnings);
                let node = Node::new(NodeKind::Effect(parsed.element), parent, text, line.number);
                return Some(self.push(node));
            }
            Err(d) => best.offer(d),
        }

        match self.parser.parse_condition(text, &self.scope) {
            Ok(parsed) => {
                self.warn_all(line, parsed.warnings);
                let node = Node::new(NodeKind::Guard(parsed.element), parent, text, line.number);
                return Some(self.push(node));
            }
            Err(d) => best.offer(d),
        }

        let diagnostic = best.finish(|| Diagnostic::generic(""));
        if diagnostic.quality == Quality::Generic {
            self.error(line, format!("Can't understand this condition/effect: '{text}'"));
        } else {
            self.error(line, diagnostic.message);
        }
        None
    }

    // =========================================================================
    // Sections
    // =========================================================================

    fn section(&mut self, line: &Line, parent: Option<NodeId>) -> SectionOutcome {
        let header = line.text.as_str();
        let (keyword, rest) = header
            .split_once(char::is_whitespace)
            .map_or((header, ""), |(k, r)| (k, r.trim()));

        if keyword.eq_ignore_ascii_case("if") {
            return match self.conditional(line, rest, parent) {
                Some(id) => SectionOutcome::Built(id, true),
                None => SectionOutcome::FailedIf,
            };
        }
        let built = if keyword.eq_ignore_ascii_case("loop") {
            self.loop_section(line, rest, parent)
        } else if keyword.eq_ignore_ascii_case("while") {
            self.while_section(line, rest, parent)
        } else {
            self.error(line, format!("Can't understand this section: '{header}'"));
            None
        };
        built.map_or(SectionOutcome::Failed, |id| SectionOutcome::Built(id, false))
    }

    /// Parses the body of a section in a scope with `frame` pushed, and
    /// merges the delay hint the body leaves behind.
    fn body(&mut self, line: &Line, id: NodeId, frame: SectionFrame) -> Vec<NodeId> {
        if line.children.is_empty() {
            self.warn(line, format!("'{}' has an empty body", line.text));
        }
        let before = self.scope.delayed;
        self.scope.push(frame);
        let body = self.chain(&line.children, Some(id));
        self.scope.pop();
        // The body may not run at all, so a delay inside it only makes a
        // delay possible afterwards.
        if !before.is_true() && self.scope.delayed != before {
            self.scope.delayed = Kleenean::Unknown;
        }
        body
    }

    fn parse_condition(&mut self, line: &Line, text: &str) -> Option<Box<dyn Condition>> {
        match self.parser.parse_condition(text, &self.scope) {
            Ok(parsed) => {
                self.warn_all(line, parsed.warnings);
                Some(parsed.element)
            }
            Err(d) => {
                self.error(line, d.message);
                None
            }
        }
    }

    fn conditional(&mut self, line: &Line, condition: &str, parent: Option<NodeId>) -> Option<NodeId> {
        let condition = self.parse_condition(line, condition)?;
        Some(self.conditional_node(line, Some(condition), parent))
    }

    fn conditional_node(
        &mut self,
        line: &Line,
        condition: Option<Box<dyn Condition>>,
        parent: Option<NodeId>,
    ) -> NodeId {
        let kind = NodeKind::Conditional {
            condition,
            body: Vec::new(),
            else_branch: None,
        };
        let id = self.push(Node::new(kind, parent, &line.text, line.number));
        let frame = SectionFrame {
            kind: SectionKind::Conditional,
            source: None,
        };
        let body = self.body(line, id, frame);
        self.set_body(id, body);
        id
    }

    /// Handles `else if <condition>:` (`condition` is `Some`) and `else:`.
    fn else_branch(
        &mut self,
        line: &Line,
        condition: Option<&str>,
        parent: Option<NodeId>,
        state: ElseState,
    ) -> ElseState {
        let (head, entry) = match state {
            ElseState::Open { head, entry } => (head, entry),
            ElseState::Skipping => return ElseState::Skipping,
            ElseState::None => {
                self.error(line, format!("'{}' has no matching 'if'", line.text));
                return ElseState::None;
            }
        };
        // Only one branch runs, so each one starts from the hint before the
        // `if` and the hints they leave behind are merged.
        let after_branches = self.scope.delayed;
        self.scope.delayed = entry;
        let condition = match condition {
            Some(text) => match self.parse_condition(line, text) {
                Some(c) => Some(c),
                None => {
                    self.scope.delayed = after_branches;
                    return ElseState::Skipping;
                }
            },
            None => None,
        };
        let is_else_if = condition.is_some();
        let id = self.conditional_node(line, condition, parent);
        if self.scope.delayed != after_branches {
            self.scope.delayed = Kleenean::Unknown;
        }
        if let NodeKind::Conditional { else_branch, .. } = &mut self.nodes[head.index()].kind {
            *else_branch = Some(id);
        }
        if is_else_if {
            ElseState::Open { head: id, entry }
        } else {
            ElseState::None
        }
    }

    fn loop_section(&mut self, line: &Line, text: &str, parent: Option<NodeId>) -> Option<NodeId> {
        let values = match self.parser.parse_expression(text, &[TypeId::OBJECT], &self.scope) {
            Ok(parsed) => {
                self.warn_all(line, parsed.warnings);
                parsed.element
            }
            Err(d) => {
                self.error(line, d.message);
                return None;
            }
        };
        let value_type = values.return_type();
        let kind = NodeKind::Loop {
            values,
            body: Vec::new(),
        };
        let id = self.push(Node::new(kind, parent, &line.text, line.number));
        let handle: Arc<dyn LoopValueSource> =
            Arc::new(LoopHandle::new(Arc::clone(&self.cursors), id, value_type));
        let frame = SectionFrame {
            kind: SectionKind::Loop,
            source: Some(handle),
        };
        let body = self.body(line, id, frame);
        self.set_body(id, body);
        Some(id)
    }

    fn while_section(&mut self, line: &Line, text: &str, parent: Option<NodeId>) -> Option<NodeId> {
        let condition = self.parse_condition(line, text)?;
        let kind = NodeKind::While {
            condition,
            body: Vec::new(),
        };
        let id = self.push(Node::new(kind, parent, &line.text, line.number));
        let frame = SectionFrame {
            kind: SectionKind::While,
            source: None,
        };
        let body = self.body(line, id, frame);
        self.set_body(id, body);
        Some(id)
    }

    fn set_body(&mut self, id: NodeId, children: Vec<NodeId>) {
        if let Some(node) = self.nodes.get_mut(id.index()) {
            match &mut node.kind {
                NodeKind::Conditional { body, .. }
                | NodeKind::Loop { body, .. }
                | NodeKind::While { body, .. } => *body = children,
                _ => {}
            }
        }
    }

    // =========================================================================
    // Linking
    // =========================================================================

    /// Sets every node's `next`. A chain's last member continues with the
    /// chain's exit: the enclosing section's `next`, or the section itself
    /// for loops. `else` branches share the `next` of their `if`.
    fn link(&mut self, top: &[NodeId]) {
        let mut work: Vec<(Vec<NodeId>, Option<NodeId>)> = vec![(top.to_vec(), None)];
        while let Some((chain, exit)) = work.pop() {
            for (i, &id) in chain.iter().enumerate() {
                let next = chain.get(i + 1).copied().or(exit);
                let mut branch = Some(id);
                while let Some(at) = branch {
                    let node = &mut self.nodes[at.index()];
                    node.next = next;
                    let tail = match node.kind {
                        NodeKind::Loop { .. } | NodeKind::While { .. } => Some(at),
                        _ => next,
                    };
                    if !node.children().is_empty() {
                        work.push((node.children().to_vec(), tail));
                    }
                    branch = node.else_branch();
                }
            }
        }
    }
}

enum SectionOutcome {
    /// The section was built; the flag is set for `if` heads.
    Built(NodeId, bool),
    /// An `if` header failed to parse.
    FailedIf,
    Failed,
}

/// Splits `else` / `else if <condition>` headers. Returns `Some(None)` for a
/// bare `else`.
fn else_clause(header: &str) -> Option<Option<&str>> {
    let mut words = header.splitn(2, char::is_whitespace);
    let first = words.next()?;
    if !first.eq_ignore_ascii_case("else") {
        return None;
    }
    let rest = words.next().map_or("", str::trim);
    if rest.is_empty() {
        return Some(None);
    }
    let mut words = rest.splitn(2, char::is_whitespace);
    match words.next() {
        Some(w) if w.eq_ignore_ascii_case("if") => Some(Some(words.next().map_or("", str::trim))),
        _ => None,
    }
}
