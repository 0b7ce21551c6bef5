//! Cancellation guard for search requests
//!
//! Each request gets a token carrying a monotonic generation and a
//! cooperative cancellation signal. The executor watches the signal to stop
//! early; the controller compares generations before committing, so a
//! response that lost the race can never reach visible state even if its
//! transport could not be stopped.

use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Token minted for one search request
#[derive(Debug, Clone)]
pub struct RequestToken {
    generation: u64,
    cancel: CancellationToken,
}

impl RequestToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once cancellation is requested.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Tracks the single live request of a session.
///
/// Generations start at 1 and never repeat within a guard.
#[derive(Debug, Default)]
pub struct RequestGuard {
    live: Option<RequestToken>,
    last_generation: u64,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the live request, if any, and mint the token for a new one.
    pub fn begin_request(&mut self) -> RequestToken {
        if let Some(previous) = self.live.take() {
            trace!(generation = previous.generation, "superseding live request");
            previous.cancel();
        }
        self.last_generation += 1;
        let token = RequestToken {
            generation: self.last_generation,
            cancel: CancellationToken::new(),
        };
        self.live = Some(token.clone());
        token
    }

    /// Whether `token` belongs to the live request.
    pub fn is_current(&self, token: &RequestToken) -> bool {
        self.live
            .as_ref()
            .is_some_and(|live| live.generation == token.generation)
    }

    /// Retire `token` after its request settled.
    ///
    /// Returns true if it was the live request, which then stops being live
    /// without being cancelled. Stale tokens leave the guard untouched.
    pub fn settle(&mut self, token: &RequestToken) -> bool {
        if self.is_current(token) {
            self.live = None;
            true
        } else {
            false
        }
    }

    /// Cancel the live request without minting a new token.
    pub fn cancel_all(&mut self) {
        if let Some(live) = self.live.take() {
            trace!(generation = live.generation, "cancelling live request");
            live.cancel();
        }
    }

    pub fn has_live_request(&self) -> bool {
        self.live.is_some()
    }
}
