//! Cancellable execution scope for the overall saga deadline.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// How a scoped future ended.
#[derive(Debug)]
pub enum ScopeOutcome<T> {
    /// The future finished before the deadline.
    Finished(T),
    /// The deadline fired first; the scope's token is now cancelled.
    DeadlineReached,
}

/// A cancellation scope with a single deadline.
///
/// Work run inside the scope receives the scope's token so that
/// in-flight operations (retry backoffs in particular) stop promptly
/// when the deadline fires, instead of running to completion with no
/// observer.
pub struct CancellableScope {
    token: CancellationToken,
}

impl CancellableScope {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// The token work inside this scope should observe.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Runs `fut` until it finishes or `deadline` elapses.
    ///
    /// On deadline the token is cancelled before returning, so any
    /// cooperative work inside `fut` has already been told to stop by
    /// the time the caller sees `DeadlineReached`.
    pub async fn run_until_deadline<T>(
        &self,
        deadline: Duration,
        fut: impl Future<Output = T>,
    ) -> ScopeOutcome<T> {
        tokio::select! {
            value = fut => ScopeOutcome::Finished(value),
            _ = tokio::time::sleep(deadline) => {
                self.token.cancel();
                ScopeOutcome::DeadlineReached
            }
        }
    }
}

impl Default for CancellableScope {
    fn default() -> Self {
        Self::new()
    }
}
