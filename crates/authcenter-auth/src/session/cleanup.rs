//! Periodic maintenance: session cleanup and, optionally, rate-limiter sweeps.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{error, info};

use authcenter_core::error::AppError;

use crate::ratelimit::RateLimiters;

use super::store::SessionStore;

/// Shortest period the worker will tick at.
const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Background worker deleting dead sessions.
///
/// Limiter state lives in the process that serves logins, so the idle-key
/// sweep only runs when that process attaches its limiters through
/// [`with_limiter_sweep`](Self::with_limiter_sweep).
#[derive(Debug, Clone)]
pub struct SessionCleanup {
    session_store: Arc<SessionStore>,
    session_interval: Duration,
    sweep: Option<(Arc<RateLimiters>, Duration)>,
}

impl SessionCleanup {
    /// Creates a worker that only cleans sessions. Periods below one second
    /// are raised to one second.
    pub fn new(session_store: Arc<SessionStore>, session_interval: Duration) -> Self {
        Self {
            session_store,
            session_interval: session_interval.max(MIN_PERIOD),
            sweep: None,
        }
    }

    /// Also sweep idle keys out of `limiters` every `interval`.
    pub fn with_limiter_sweep(mut self, limiters: Arc<RateLimiters>, interval: Duration) -> Self {
        self.sweep = Some((limiters, interval.max(MIN_PERIOD)));
        self
    }

    /// Runs one session cleanup cycle. Returns the number of sessions deleted.
    pub async fn run_cleanup(&self) -> Result<u64, AppError> {
        let deleted = self.session_store.cleanup().await?;
        if deleted > 0 {
            info!(deleted = deleted, "Session cleanup completed");
        }
        Ok(deleted)
    }

    /// Runs one limiter sweep. Returns the number of keys dropped, zero when
    /// no limiters are attached.
    pub async fn run_sweep(&self) -> usize {
        match &self.sweep {
            Some((limiters, _)) => limiters.cleanup_expired().await,
            None => 0,
        }
    }

    /// Runs the cycles on their intervals until `shutdown` flips to `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            session_interval_secs = self.session_interval.as_secs(),
            sweep_interval_secs = self.sweep.as_ref().map(|(_, d)| d.as_secs()),
            "Maintenance worker started"
        );

        let mut session_tick = ticker(self.session_interval);
        let mut sweep_tick = self.sweep.as_ref().map(|(_, d)| ticker(*d));

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = session_tick.tick() => {
                    if let Err(e) = self.run_cleanup().await {
                        error!(error = %e, retryable = e.is_retryable(), "Session cleanup failed");
                    }
                }
                Some(_) = next_tick(sweep_tick.as_mut()) => {
                    self.run_sweep().await;
                }
            }
        }

        info!("Maintenance worker stopped");
    }
}

fn ticker(period: Duration) -> Interval {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn next_tick(interval: Option<&mut Interval>) -> Option<time::Instant> {
    match interval {
        Some(interval) => Some(interval.tick().await),
        None => std::future::pending().await,
    }
}
