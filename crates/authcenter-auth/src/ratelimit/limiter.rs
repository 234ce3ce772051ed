//! In-memory sliding-window rate limiter.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use authcenter_core::config::{RateLimitConfig, RateLimitRule};
use authcenter_core::error::AppError;

/// Counts events per key over a trailing window.
///
/// The prune-and-record sequence for a key runs under a single lock, so at
/// a full window exactly the excess callers are rejected. A full window
/// always rejects immediately; it never waits.
#[derive(Debug, Clone)]
pub struct SlidingWindowLimiter {
    name: &'static str,
    limit: usize,
    window: Duration,
    requests: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
}

impl SlidingWindowLimiter {
    /// Creates a limiter admitting `limit` events per `window`.
    pub fn new(name: &'static str, limit: u32, window: Duration) -> Self {
        Self {
            name,
            limit: limit as usize,
            window,
            requests: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates a limiter from a configured rule.
    pub fn from_rule(name: &'static str, rule: &RateLimitRule) -> Self {
        Self::new(name, rule.max_requests, rule.window())
    }

    /// Records an event for `key` if the window has room.
    pub async fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.lock().await;
        let history = requests.entry(key.to_string()).or_default();

        while history
            .front()
            .is_some_and(|t| now.duration_since(*t) >= self.window)
        {
            history.pop_front();
        }

        if history.len() >= self.limit {
            return false;
        }
        history.push_back(now);
        true
    }

    /// Like [`allow`](Self::allow), failing with `RateLimited` on rejection.
    pub async fn check(&self, key: &str) -> Result<(), AppError> {
        if self.allow(key).await {
            return Ok(());
        }
        warn!(limiter = self.name, key = %key, "Rate limit exceeded");
        Err(AppError::rate_limited(format!(
            "Too many requests; retry after {} seconds",
            self.window.as_secs()
        )))
    }

    /// Clears the history for one key.
    pub async fn reset(&self, key: &str) {
        self.requests.lock().await.remove(key);
    }

    /// Clears all tracked history.
    pub async fn reset_all(&self) {
        self.requests.lock().await.clear();
    }

    /// Drops keys with no events left inside the window. Returns how many
    /// keys were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut requests = self.requests.lock().await;
        let before = requests.len();
        requests.retain(|_, history| {
            history.retain(|t| now.duration_since(*t) < self.window);
            !history.is_empty()
        });
        let removed = before - requests.len();
        if removed > 0 {
            debug!(limiter = self.name, removed = removed, "Swept idle rate-limit keys");
        }
        removed
    }

    /// Number of keys currently tracked.
    pub async fn tracked_keys(&self) -> usize {
        self.requests.lock().await.len()
    }
}

/// The two limiters used by the service.
#[derive(Debug, Clone)]
pub struct RateLimiters {
    /// General per-client request limiter.
    pub general: SlidingWindowLimiter,
    /// Stricter per-client login limiter.
    pub login: SlidingWindowLimiter,
}

impl RateLimiters {
    /// Builds both limiters from configuration.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            general: SlidingWindowLimiter::from_rule("general", &config.general),
            login: SlidingWindowLimiter::from_rule("login", &config.login),
        }
    }

    /// Sweeps both limiters.
    pub async fn cleanup_expired(&self) -> usize {
        self.general.cleanup_expired().await + self.login.cleanup_expired().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authcenter_core::ErrorKind;

    fn login_limiter() -> SlidingWindowLimiter {
        SlidingWindowLimiter::from_rule("login", &RateLimitConfig::default().login)
    }

    #[tokio::test(start_paused = true)]
    async fn test_sixth_attempt_rejected_until_window_elapses() {
        let limiter = login_limiter();

        for _ in 0..5 {
            assert!(limiter.allow("10.0.0.1").await);
            tokio::time::advance(Duration::from_secs(60)).await;
        }
        assert!(!limiter.allow("10.0.0.1").await);
        assert!(limiter.allow("10.0.0.2").await);

        // The first attempt was 300s ago; it leaves the window at 900s.
        tokio::time::advance(Duration::from_secs(600)).await;
        assert!(limiter.allow("10.0.0.1").await);
        assert!(!limiter.allow("10.0.0.1").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejections_are_not_recorded() {
        let limiter = SlidingWindowLimiter::new("test", 1, Duration::from_secs(10));
        assert!(limiter.allow("k").await);
        for _ in 0..10 {
            assert!(!limiter.allow("k").await);
        }
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(limiter.allow("k").await);
    }

    #[tokio::test]
    async fn test_check_maps_to_rate_limited() {
        let limiter = SlidingWindowLimiter::new("test", 1, Duration::from_secs(60));
        limiter.check("k").await.unwrap();
        let err = limiter.check("k").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn test_reset() {
        let limiter = SlidingWindowLimiter::new("test", 1, Duration::from_secs(60));
        assert!(limiter.allow("a").await);
        assert!(limiter.allow("b").await);

        limiter.reset("a").await;
        assert!(limiter.allow("a").await);
        assert!(!limiter.allow("b").await);

        limiter.reset_all().await;
        assert!(limiter.allow("b").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_drops_idle_keys() {
        let limiter = SlidingWindowLimiter::new("test", 5, Duration::from_secs(60));
        limiter.allow("old").await;
        tokio::time::advance(Duration::from_secs(30)).await;
        limiter.allow("new").await;
        tokio::time::advance(Duration::from_secs(31)).await;

        assert_eq!(limiter.cleanup_expired().await, 1);
        assert_eq!(limiter.tracked_keys().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_admit_exactly_limit() {
        let limiter = SlidingWindowLimiter::new("test", 5, Duration::from_secs(60));
        let mut handles = Vec::new();
        for _ in 0..50 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move { limiter.allow("shared").await }));
        }
        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 5);
    }
}
