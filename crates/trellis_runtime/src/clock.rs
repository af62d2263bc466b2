//! A virtual-clock scheduler.
//!
//! [`ManualScheduler`] never sleeps: continuations wait in a queue until the
//! host calls [`advance`](ManualScheduler::advance), which resumes every
//! continuation that has come due, earliest first. Continuations scheduled
//! while advancing are run in the same call if they fall inside the window,
//! except zero-length delays: those wait for the next call, so a loop that
//! only waits zero seconds still hands control back to the host.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;
use trellis_engine::{Continuation, Scheduler};

struct Pending {
    due: Duration,
    seq: u64,
    immediate: bool,
    continuation: Continuation,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    // Reversed: BinaryHeap is a max-heap and the earliest entry must win.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct State {
    now: Duration,
    next_seq: u64,
    queue: BinaryHeap<Pending>,
}

/// A scheduler driven by an explicit clock.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<State>,
}

impl ManualScheduler {
    /// Creates a scheduler whose clock starts at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scheduler whose clock starts at `start`.
    #[must_use]
    pub fn starting_at(start: Duration) -> Self {
        Self {
            state: Mutex::new(State {
                now: start,
                ..State::default()
            }),
        }
    }

    /// The current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of continuations waiting.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// When the next continuation comes due, if any.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.state.lock().queue.peek().map(|p| p.due)
    }

    /// Moves the clock forward by `by`, resuming every continuation that
    /// comes due. Returns how many were resumed.
    pub fn advance(&self, by: Duration) -> usize {
        let (target, cutoff) = {
            let state = self.state.lock();
            (state.now.saturating_add(by), state.next_seq)
        };
        let mut resumed = 0;
        let mut deferred = Vec::new();
        // The lock is released before resuming: continuations schedule.
        while let Some(next) = self.pop_due(target) {
            if next.immediate && next.seq >= cutoff {
                deferred.push(next);
                continue;
            }
            trace!(due = ?next.due, "continuation due");
            next.continuation.resume();
            resumed += 1;
        }
        let mut state = self.state.lock();
        state.now = target;
        state.queue.extend(deferred);
        resumed
    }

    fn pop_due(&self, target: Duration) -> Option<Pending> {
        let mut state = self.state.lock();
        if state.queue.peek().is_none_or(|p| p.due > target) {
            return None;
        }
        let next = state.queue.pop()?;
        state.now = state.now.max(next.due);
        Some(next)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&self, after: Duration, continuation: Continuation) {
        let mut state = self.state.lock();
        let due = state.now.saturating_add(after);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.queue.push(Pending {
            due,
            seq,
            immediate: after.is_zero(),
            continuation,
        });
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualScheduler")
            .field("now", &state.now)
            .field("pending", &state.queue.len())
            .finish()
    }
}
