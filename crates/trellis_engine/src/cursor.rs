//! Per-context loop state.
//!
//! One parsed loop node can be walked by any number of executions at once,
//! so its iterator and current value cannot live on the node. They live in a
//! [`LoopCursors`] table keyed by `(context, node)`. Entries hold a weak
//! reference to their context and are pruned once it is gone.
//!
//! The `loop-value` family of expressions reads this table through a
//! [`LoopHandle`] captured at parse time.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use trellis_foundation::{Context, ContextId, Result, TypeId, Value, WeakContext};
use trellis_parser::{
    Diagnostic, Expression, InitArgs, InitResult, LoopValueSource, RegistryBuilder, RegistryError,
};

use crate::graph::NodeId;

type ValueIter = Box<dyn Iterator<Item = Value> + Send>;

struct Cursor {
    owner: WeakContext,
    values: ValueIter,
    current: Option<Value>,
    iteration: u64,
}

/// Loop cursors of one trigger, keyed by context and loop node.
#[derive(Default)]
pub struct LoopCursors {
    table: Mutex<HashMap<(ContextId, NodeId), Cursor>>,
}

impl LoopCursors {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the loop at `node` to its next value for `ctx`, starting it with
    /// `start` if it is not running. Returns false once the values are
    /// exhausted, which also forgets the cursor.
    ///
    /// The table is not locked while `start` or the iterator run, so loop
    /// expressions may read other loops' state.
    ///
    /// # Errors
    ///
    /// Returns the error of `start`.
    pub fn advance(
        &self,
        ctx: &Context,
        node: NodeId,
        start: impl FnOnce() -> Result<ValueIter>,
    ) -> Result<bool> {
        let key = (ctx.id(), node);
        let existing = self.table.lock().remove(&key);
        let mut cursor = match existing {
            Some(cursor) => cursor,
            None => Cursor {
                owner: ctx.downgrade(),
                values: start()?,
                current: None,
                iteration: 0,
            },
        };
        let Some(value) = cursor.values.next() else {
            return Ok(false);
        };
        cursor.current = Some(value);
        cursor.iteration += 1;

        let mut table = self.table.lock();
        table.retain(|_, c| c.owner.is_alive());
        table.insert(key, cursor);
        Ok(true)
    }

    /// The current value of the loop at `node` for `ctx`.
    #[must_use]
    pub fn current(&self, ctx: &Context, node: NodeId) -> Option<Value> {
        self.table
            .lock()
            .get(&(ctx.id(), node))
            .and_then(|c| c.current.clone())
    }

    /// The 1-based iteration of the loop at `node` for `ctx`.
    #[must_use]
    pub fn iteration(&self, ctx: &Context, node: NodeId) -> Option<u64> {
        self.table.lock().get(&(ctx.id(), node)).map(|c| c.iteration)
    }

    /// Forgets the cursor of one loop.
    pub fn clear(&self, ctx: ContextId, node: NodeId) {
        self.table.lock().remove(&(ctx, node));
    }

    /// Forgets every cursor of a context.
    pub fn clear_context(&self, ctx: ContextId) {
        self.table.lock().retain(|(id, _), _| *id != ctx);
    }

    /// Number of running loops across all contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    /// True if no loop is running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }
}

impl std::fmt::Debug for LoopCursors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopCursors")
            .field("running", &self.len())
            .finish()
    }
}

// =============================================================================
// Loop handles
// =============================================================================

/// Parse-time reference to one loop node's cursors.
#[derive(Debug)]
pub struct LoopHandle {
    cursors: Arc<LoopCursors>,
    node: NodeId,
    value_type: TypeId,
}

impl LoopHandle {
    /// Creates a handle for the loop at `node`.
    #[must_use]
    pub fn new(cursors: Arc<LoopCursors>, node: NodeId, value_type: TypeId) -> Self {
        Self {
            cursors,
            node,
            value_type,
        }
    }
}

impl LoopValueSource for LoopHandle {
    fn current(&self, ctx: &Context) -> Option<Value> {
        self.cursors.current(ctx, self.node)
    }

    fn iteration(&self, ctx: &Context) -> Option<u64> {
        self.cursors.iteration(ctx, self.node)
    }

    fn value_type(&self) -> TypeId {
        self.value_type
    }
}

// =============================================================================
// Loop expressions
// =============================================================================

#[derive(Debug)]
struct LoopValue {
    source: Arc<dyn LoopValueSource>,
    ty: TypeId,
}

impl Expression for LoopValue {
    fn return_type(&self) -> TypeId {
        self.ty
    }

    fn is_single(&self) -> bool {
        true
    }

    fn get_all(&self, ctx: &Context) -> Result<Vec<Value>> {
        Ok(self.source.current(ctx).into_iter().collect())
    }
}

#[derive(Debug)]
struct LoopIteration {
    source: Arc<dyn LoopValueSource>,
}

impl Expression for LoopIteration {
    fn return_type(&self) -> TypeId {
        TypeId::INTEGER
    }

    fn is_single(&self) -> bool {
        true
    }

    fn get_all(&self, ctx: &Context) -> Result<Vec<Value>> {
        Ok(self
            .source
            .iteration(ctx)
            .map(|n| Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
            .into_iter()
            .collect())
    }
}

/// Reads the optional `-N` suffix of a loop expression.
fn loop_number(args: &InitArgs<'_>, regex: usize) -> InitResult<usize> {
    match args.regex(regex) {
        None => Ok(1),
        Some(m) => match m.text().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(Diagnostic::semantic(format!(
                "'{}' is not a valid loop number",
                m.text()
            ))),
        },
    }
}

fn find_loop(
    args: &InitArgs<'_>,
    n: usize,
    ty: Option<TypeId>,
) -> InitResult<Arc<dyn LoopValueSource>> {
    let types = args.types();
    args.scope()
        .sections()
        .filter_map(|s| s.source.as_ref())
        .filter(|s| ty.is_none_or(|t| types.is_subtype(s.value_type(), t)))
        .nth(n - 1)
        .cloned()
        .ok_or_else(|| {
            let text = &args.info().text;
            if args.scope().loop_source(1, None).is_none() {
                Diagnostic::semantic(format!("'{text}' can only be used inside a loop"))
            } else {
                Diagnostic::semantic(format!("there's no loop that matches '{text}'"))
            }
        })
}

/// Registers `loop-value[-N]`, `loop-iteration[-N]` and `loop-<type>[-N]`.
///
/// # Errors
///
/// Returns an error if a pattern fails to compile.
pub fn register_loop_expressions(
    builder: &mut RegistryBuilder,
) -> std::result::Result<(), RegistryError> {
    builder.register_expression(TypeId::OBJECT, &["loop-value[-<\\d+>]"], |args| {
        let source = find_loop(&args, loop_number(&args, 0)?, None)?;
        let ty = source.value_type();
        Ok(Box::new(LoopValue { source, ty }))
    })?;
    builder.register_expression(TypeId::INTEGER, &["loop-(iteration|counter)[-<\\d+>]"], |args| {
        let source = find_loop(&args, loop_number(&args, 0)?, None)?;
        Ok(Box::new(LoopIteration { source }))
    })?;
    builder.register_expression(
        TypeId::OBJECT,
        &["loop-<[a-z]+(?: [a-z]+)*>[-<\\d+>]"],
        |args| {
            let name = args.regex(0).map(|m| m.text().to_lowercase()).unwrap_or_default();
            let (ty, _) = args.types().lookup(&name).ok_or_else(|| {
                Diagnostic::not_an_expression(format!("'{name}' is not a type"))
            })?;
            let source = find_loop(&args, loop_number(&args, 1)?, Some(ty))?;
            Ok(Box::new(LoopValue { source, ty }))
        },
    )?;
    Ok(())
}
