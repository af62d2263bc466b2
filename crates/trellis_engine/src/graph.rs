//! The trigger graph.
//!
//! A trigger's statements live in an arena of [`Node`]s linked by index.
//! Every node knows its parent section and the node that runs after it, so
//! leaving a block is one pointer follow. The builder links each section's
//! last child to the section's own `next`, except in loops, where it links
//! back to the loop node so the loop can pull its next value.
//!
//! Walking a node runs it once and says where to go next. Nothing here
//! recurses; the executor's trampoline is the only driver.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use trellis_foundation::{Context, Error, Event, Result, Value};
use trellis_parser::{Condition, Effect, EventGuard, Expression, SectionKind};

use crate::cursor::LoopCursors;

// =============================================================================
// Identifiers
// =============================================================================

/// Index of a node in its trigger's arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Creates a node id from an arena index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Exits
// =============================================================================

/// The class of section a `stop N ...` statement counts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExitKind {
    /// `loop` and `while` sections.
    Loop,
    /// Any section.
    Section,
    /// `if` / `else if` / `else` sections.
    Conditional,
}

impl ExitKind {
    /// True if a section of `kind` is counted.
    #[must_use]
    pub fn matches(self, kind: SectionKind) -> bool {
        match self {
            Self::Loop => kind.is_loop(),
            Self::Section => true,
            Self::Conditional => kind == SectionKind::Conditional,
        }
    }

    /// Singular noun.
    #[must_use]
    pub fn noun(self) -> &'static str {
        match self {
            Self::Loop => "loop",
            Self::Section => "section",
            Self::Conditional => "conditional",
        }
    }
}

/// Where an exit statement jumps to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitTarget {
    /// Ends the execution.
    Trigger,
    /// Leaves the `count`-th enclosing section of a class.
    Sections {
        /// Which sections are counted.
        kind: ExitKind,
        /// How many of them to leave, at least 1.
        count: usize,
    },
}

// =============================================================================
// Nodes
// =============================================================================

/// What a node does when walked.
#[derive(Debug)]
pub(crate) enum NodeKind {
    Effect(Box<dyn Effect>),
    /// A condition on its own line; false ends the execution.
    Guard(Box<dyn Condition>),
    Delay(Box<dyn Expression>),
    Exit(ExitTarget),
    /// `if`, `else if`, or `else` (no condition).
    Conditional {
        condition: Option<Box<dyn Condition>>,
        body: Vec<NodeId>,
        else_branch: Option<NodeId>,
    },
    Loop {
        values: Box<dyn Expression>,
        body: Vec<NodeId>,
    },
    While {
        condition: Box<dyn Condition>,
        body: Vec<NodeId>,
    },
}

/// One statement or section of a trigger.
#[derive(Debug)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    text: String,
    line: usize,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, parent: Option<NodeId>, text: &str, line: usize) -> Self {
        Self {
            kind,
            parent,
            next: None,
            text: text.to_string(),
            line,
        }
    }

    /// The enclosing section.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The node that runs after this one (after the whole section, for
    /// sections).
    #[must_use]
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    /// Source text of the statement or section header.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 1-based source line.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// The section kind, if this node is a section.
    #[must_use]
    pub fn section_kind(&self) -> Option<SectionKind> {
        match self.kind {
            NodeKind::Conditional { .. } => Some(SectionKind::Conditional),
            NodeKind::Loop { .. } => Some(SectionKind::Loop),
            NodeKind::While { .. } => Some(SectionKind::While),
            _ => None,
        }
    }

    /// The child chain of a section, in order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Conditional { body, .. }
            | NodeKind::Loop { body, .. }
            | NodeKind::While { body, .. } => body,
            _ => &[],
        }
    }

    /// The `else if` / `else` linked to a conditional.
    #[must_use]
    pub fn else_branch(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::Conditional { else_branch, .. } => else_branch,
            _ => None,
        }
    }
}

/// The outcome of walking one node.
#[derive(Debug, PartialEq, Eq)]
pub enum Walk {
    /// Continue with this node, or end the execution on `None`.
    Next(Option<NodeId>),
    /// Suspend the execution and resume at `resume` after `after`.
    Suspend {
        /// How long to wait.
        after: Duration,
        /// Where to resume.
        resume: Option<NodeId>,
    },
}

// =============================================================================
// Trigger
// =============================================================================

/// A parsed `on <event>:` block.
///
/// Immutable once built and shared by every execution; per-execution loop
/// state lives in [`LoopCursors`] keyed by context.
pub struct Trigger {
    event: String,
    guard: Box<dyn EventGuard>,
    source: Arc<str>,
    line: usize,
    text: String,
    nodes: Vec<Node>,
    first: Option<NodeId>,
    cursors: Arc<LoopCursors>,
}

impl Trigger {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        event: String,
        guard: Box<dyn EventGuard>,
        source: Arc<str>,
        line: usize,
        text: String,
        nodes: Vec<Node>,
        first: Option<NodeId>,
        cursors: Arc<LoopCursors>,
    ) -> Self {
        Self {
            event,
            guard,
            source,
            line,
            text,
            nodes,
            first,
            cursors,
        }
    }

    /// Name of the event this trigger listens for.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// True if the trigger's guard accepts this occurrence.
    #[must_use]
    pub fn accepts(&self, event: &Event) -> bool {
        event.name().eq_ignore_ascii_case(&self.event) && self.guard.check(event)
    }

    /// Name of the script the trigger came from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Line of the `on ...:` header.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// The header text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The first statement.
    #[must_use]
    pub fn first(&self) -> Option<NodeId> {
        self.first
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// All nodes, in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the trigger has no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Per-context loop state.
    #[must_use]
    pub fn cursors(&self) -> &Arc<LoopCursors> {
        &self.cursors
    }

    /// Runs one node and returns where to continue.
    ///
    /// # Errors
    ///
    /// Returns whatever the node's element code returns, or an internal
    /// error for an id outside the arena.
    pub fn walk(&self, id: NodeId, ctx: &Context) -> Result<Walk> {
        let node = self
            .node(id)
            .ok_or_else(|| Error::internal(format!("no node {id} in trigger '{}'", self.text)))?;
        let next = match &node.kind {
            NodeKind::Effect(effect) => {
                effect.execute(ctx)?;
                node.next
            }
            NodeKind::Guard(condition) => {
                if condition.check(ctx)? {
                    node.next
                } else {
                    None
                }
            }
            NodeKind::Delay(duration) => {
                return Ok(match duration.get_single(ctx)? {
                    Some(Value::Timespan(after)) => Walk::Suspend {
                        after,
                        resume: node.next,
                    },
                    Some(other) => {
                        return Err(Error::type_mismatch("timespan", other.type_name()));
                    }
                    None => Walk::Next(None),
                });
            }
            NodeKind::Exit(target) => self.exit(id, *target, ctx),
            NodeKind::Conditional {
                condition,
                body,
                else_branch,
            } => {
                let pass = match condition {
                    Some(c) => c.check(ctx)?,
                    None => true,
                };
                if pass {
                    body.first().copied().or(node.next)
                } else {
                    else_branch.or(node.next)
                }
            }
            NodeKind::Loop { values, body } => {
                if self.cursors.advance(ctx, id, || values.iterate(ctx))? {
                    body.first().copied().or(Some(id))
                } else {
                    node.next
                }
            }
            NodeKind::While { condition, body } => {
                if condition.check(ctx)? {
                    body.first().copied().or(Some(id))
                } else {
                    node.next
                }
            }
        };
        Ok(Walk::Next(next))
    }

    /// Resolves an exit from `from`, clearing the state of every loop left.
    fn exit(&self, from: NodeId, target: ExitTarget, ctx: &Context) -> Option<NodeId> {
        let ExitTarget::Sections { kind, count } = target else {
            self.cursors.clear_context(ctx.id());
            return None;
        };
        let mut remaining = count;
        let mut at = self.node(from).and_then(Node::parent);
        while let Some(id) = at {
            let node = self.node(id)?;
            if matches!(node.kind, NodeKind::Loop { .. }) {
                self.cursors.clear(ctx.id(), id);
            }
            if node.section_kind().is_some_and(|k| kind.matches(k)) {
                remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    return node.next;
                }
            }
            at = node.parent;
        }
        None
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("source", &self.source)
            .field("line", &self.line)
            .field("text", &self.text)
            .field("nodes", &self.nodes.len())
            .finish_non_exhaustive()
    }
}
