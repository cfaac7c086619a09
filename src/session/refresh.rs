//! Token Refresher: single-flight guard and the periodic refresh task.
//!
//! DESIGN
//! ======
//! Refreshes are triggered from two places: the interval task and any
//! authorized call that sees a 401. Both go through [`RefreshFlight`], so a
//! tick that lands while a reactive refresh is in flight waits for it and
//! reuses its result instead of spending the refresh token a second time.
//!
//! TRADE-OFFS
//! ==========
//! The guard is a `tokio::sync::Mutex` plus a generation counter rather than a
//! shared future. Callers that queued behind a running refresh see the
//! generation move and take the stored result; a caller arriving after the
//! refresh finished starts a new one.

#[cfg(test)]
#[path = "refresh_test.rs"]
mod refresh_test;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{SessionError, SessionManager};

// =============================================================================
// SINGLE FLIGHT
// =============================================================================

/// At most one refresh runs at a time; waiters share its outcome.
pub(crate) struct RefreshFlight {
    generation: AtomicU64,
    last: Mutex<Option<Result<(), SessionError>>>,
}

impl RefreshFlight {
    pub(crate) fn new() -> Self {
        Self { generation: AtomicU64::new(0), last: Mutex::new(None) }
    }

    /// Run `op`, or join the run that was already in flight when we arrived.
    pub(crate) async fn run<F, Fut>(&self, op: F) -> Result<(), SessionError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), SessionError>>,
    {
        let observed = self.generation.load(Ordering::Acquire);
        let mut last = self.last.lock().await;
        if self.generation.load(Ordering::Acquire) != observed {
            if let Some(shared) = last.as_ref() {
                debug!("joined in-flight token refresh");
                return shared.clone();
            }
        }

        let result = op().await;
        *last = Some(result.clone());
        self.generation.fetch_add(1, Ordering::Release);
        result
    }
}

// =============================================================================
// PERIODIC TASK
// =============================================================================

/// Spawn the interval refresh. The first tick fires one `period` from now.
///
/// Ticks while logged out are skipped, so the task can outlive a logout and
/// resume after the next login. Abort the handle to stop it.
#[must_use]
pub fn spawn_refresh_task(session: SessionManager, period: Duration) -> JoinHandle<()> {
    info!(period_secs = period.as_secs(), "token refresh task started");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if !session.is_authenticated() {
                continue;
            }
            match session.refresh().await {
                Ok(()) => debug!("scheduled token refresh succeeded"),
                Err(e) => warn!(error = %e, "scheduled token refresh failed"),
            }
        }
    })
}
