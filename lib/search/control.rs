use crate::chess::Position;
use crate::search::Limits;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Whether the search may continue expanding nodes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ControlFlow {
    /// Continue searching.
    Continue,
    /// Abandon the current branch as soon as possible.
    Abort,
}

/// How many nodes are expanded between wall-clock polls.
const CADENCE: u64 = 2048;

/// Controls the flow of an ongoing search.
///
/// Cancellation is cooperative: the searcher polls [`Control::check`] on a
/// fixed node cadence, so a branch may overrun its budget by up to one
/// interval. The stop flag may be raised from another thread at any time and
/// is authoritative; a score returned from an aborted branch is not.
#[derive(Debug)]
pub struct Control {
    limits: Limits,
    budget: Option<Duration>,
    timestamp: Instant,
    nodes: AtomicU64,
    abort: AtomicBool,
}

impl Control {
    /// Sets up the controller for a new search of a position.
    #[inline(always)]
    pub fn new(pos: &Position, limits: Limits) -> Self {
        Control {
            budget: limits.budget(pos.fullmoves()),
            timestamp: Instant::now(),
            nodes: AtomicU64::new(0),
            abort: AtomicBool::new(false),
            limits,
        }
    }

    /// The search limits.
    #[inline(always)]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// The time elapsed since the search started.
    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed().max(Duration::from_nanos(1))
    }

    /// The number of nodes expanded so far.
    #[inline(always)]
    pub fn nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    /// Asks the search to stop as soon as possible.
    ///
    /// May be called from any thread.
    #[inline(always)]
    pub fn stop(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    /// Whether the search has been asked to stop.
    #[inline(always)]
    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    /// Accounts for one expanded node and decides whether to continue.
    #[inline(always)]
    pub fn check(&self) -> ControlFlow {
        if self.is_aborted() {
            return ControlFlow::Abort;
        }

        let nodes = self.nodes.fetch_add(1, Ordering::Relaxed) + 1;
        if nodes >= self.limits.max_nodes() {
            self.stop();
            return ControlFlow::Abort;
        }

        if nodes.is_multiple_of(CADENCE) {
            if let Some(budget) = self.budget {
                if self.elapsed() >= budget {
                    self.stop();
                    return ControlFlow::Abort;
                }
            }
        }

        ControlFlow::Continue
    }
}
