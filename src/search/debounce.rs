//! Debounce scheduler
//!
//! Collapses a burst of query changes into one delayed trigger. Arming a new
//! timer always cancels the previous one, so only the last query of a burst
//! survives the quiet window.

use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

/// Identifies one armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// What `schedule` did with a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// A timer is armed and will fire after the delay
    Armed(TimerId),
    /// The query was empty: nothing armed, caller must take the clear path
    Bypassed,
}

#[derive(Debug)]
struct ArmedTimer {
    id: TimerId,
    handle: JoinHandle<()>,
}

/// Holds at most one pending delayed invocation.
///
/// The callback receives the timer's id and must confirm it with
/// [`fire_if_current`](Self::fire_if_current) before acting: a timer that
/// already woke up can race a `cancel` that arrives before the callback
/// gets to run.
#[derive(Debug)]
pub struct DebounceScheduler {
    runtime: Handle,
    armed: Option<ArmedTimer>,
    next_id: u64,
}

impl DebounceScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            armed: None,
            next_id: 0,
        }
    }

    /// Cancel any pending timer, then arm a new one that calls
    /// `on_fire(id, query)` after `delay`.
    ///
    /// An empty query arms nothing and returns [`Schedule::Bypassed`].
    pub fn schedule<F, Fut>(&mut self, query: &str, delay: Duration, on_fire: F) -> Schedule
    where
        F: FnOnce(TimerId, String) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        if query.is_empty() {
            return Schedule::Bypassed;
        }

        self.next_id += 1;
        let id = TimerId(self.next_id);
        let query = query.to_string();
        trace!(timer = id.0, ?delay, "arming debounce timer");
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire(id, query).await;
        });
        self.armed = Some(ArmedTimer { id, handle });
        Schedule::Armed(id)
    }

    /// Disarm the pending timer, if any. Returns whether one was armed.
    pub fn cancel(&mut self) -> bool {
        match self.armed.take() {
            Some(timer) => {
                trace!(timer = timer.id.0, "cancelling debounce timer");
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Claim the firing of timer `id`.
    ///
    /// Returns true exactly once, and only if `id` is still the armed timer.
    /// The timer's task is released rather than aborted, so the callback
    /// keeps running past this point.
    pub fn fire_if_current(&mut self, id: TimerId) -> bool {
        if self.armed.as_ref().is_some_and(|timer| timer.id == id) {
            self.armed = None;
            true
        } else {
            false
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
