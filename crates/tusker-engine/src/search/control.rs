//! Search control: stop flag and wall-clock budget.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shared cancellation and timing state for one `find_best_move` call.
///
/// The budget is soft at 1x and hard at 2x: the driver keeps iterating while
/// elapsed time is inside the budget, and the hard deadline aborts in-flight
/// work. The hard deadline is only polled every 2048 nodes inside the
/// recursion to keep clock reads off the hot path; the stop flag is checked
/// every time.
pub struct SearchControl {
    stopped: Arc<AtomicBool>,
    start: Instant,
    budget: Option<Duration>,
}

impl SearchControl {
    /// Interval between wall-clock polls, in nodes. Power of two.
    const CHECK_MASK: u64 = 2047;

    /// Control for a search with no time budget (`go infinite`, `go depth`).
    pub fn new_infinite(stopped: Arc<AtomicBool>) -> Self {
        Self {
            stopped,
            start: Instant::now(),
            budget: None,
        }
    }

    /// Control for a search with a time budget.
    pub fn new_timed(stopped: Arc<AtomicBool>, budget: Duration) -> Self {
        Self {
            stopped,
            start: Instant::now(),
            budget: Some(budget),
        }
    }

    /// Time elapsed since the search started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Ask the search to stop at the next opportunity.
    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Return `true` once a stop has been requested or the hard deadline hit.
    pub fn aborted(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Best-effort cancellation check inside the recursion.
    ///
    /// Returns `true` if the search should unwind. The clock is consulted
    /// only every 2048 nodes; once the hard deadline (twice the budget) has
    /// passed, the stop flag latches so every later call is cheap.
    pub fn should_abort(&self, nodes: u64) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return true;
        }
        if nodes & Self::CHECK_MASK != 0 {
            return false;
        }
        if let Some(budget) = self.budget {
            if self.elapsed() > budget * 2 {
                self.stopped.store(true, Ordering::Release);
                return true;
            }
        }
        false
    }

    /// Return `true` once elapsed time exceeds the (soft) budget.
    pub fn budget_exceeded(&self) -> bool {
        self.budget.is_some_and(|budget| self.elapsed() > budget)
    }

    /// Return `true` once elapsed time exceeds twice the budget.
    pub fn overtime(&self) -> bool {
        self.budget.is_some_and(|budget| self.elapsed() > budget * 2)
    }

    /// The shared stop flag, for wiring into a front end.
    pub fn stop_flag(&self) -> &Arc<AtomicBool> {
        &self.stopped
    }
}
