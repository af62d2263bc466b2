//! Stack growth for deep recursion.
//!
//! The pattern matcher recurses per pattern element and per nested
//! expression, and expression evaluation recurses through nested
//! sub-expressions. Both wrap their recursive step in
//! [`ensure_sufficient_stack`], which grows the native stack on demand
//! instead of overflowing.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Runs `f`, first growing the stack if less than the red zone remains.
#[cfg(not(target_arch = "wasm32"))]
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// Runs `f` directly; wasm manages its own stack.
#[cfg(target_arch = "wasm32")]
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
