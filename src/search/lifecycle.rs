//! Lifecycle manager: the one place pending work gets cancelled
//!
//! New queries, clears, short-circuits and disposal all route through
//! [`Lifecycle::cancel_all`], so a timer or request can't be missed on one
//! path and handled on another.

use super::debounce::DebounceScheduler;
use super::guard::RequestGuard;
use tokio::runtime::Handle;
use tracing::debug;

#[derive(Debug)]
pub(crate) struct Lifecycle {
    pub scheduler: DebounceScheduler,
    pub guard: RequestGuard,
    disposed: bool,
}

impl Lifecycle {
    pub fn new(runtime: Handle) -> Self {
        Self {
            scheduler: DebounceScheduler::new(runtime),
            guard: RequestGuard::new(),
            disposed: false,
        }
    }

    /// Disarm the debounce timer and cancel the live request.
    pub fn cancel_all(&mut self) {
        self.scheduler.cancel();
        self.guard.cancel_all();
    }

    /// Cancel everything and refuse further work. Idempotent.
    pub fn dispose(&mut self) {
        if !self.disposed {
            debug!("disposing search session");
        }
        self.cancel_all();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Nothing armed and nothing in flight
    pub fn is_quiescent(&self) -> bool {
        !self.scheduler.is_armed() && !self.guard.has_live_request()
    }
}
