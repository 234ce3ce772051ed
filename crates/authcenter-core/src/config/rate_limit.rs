//! Rate limiting configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A single sliding-window rule: at most `max_requests` per `window_seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRule {
    /// Requests admitted inside one window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_seconds: u64,
}

impl RateLimitRule {
    /// Window length as a [`Duration`].
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

/// The two named limiter configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// General request limiter, keyed by client identity.
    #[serde(default = "default_general")]
    pub general: RateLimitRule,
    /// Stricter login limiter; lower environments may relax it.
    #[serde(default = "default_login")]
    pub login: RateLimitRule,
    /// Interval between sweeps that drop idle keys, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl RateLimitConfig {
    /// Sweep interval as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general: default_general(),
            login: default_login(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_general() -> RateLimitRule {
    RateLimitRule {
        max_requests: 100,
        window_seconds: 60,
    }
}

fn default_login() -> RateLimitRule {
    RateLimitRule {
        max_requests: 5,
        window_seconds: 15 * 60,
    }
}

fn default_sweep_interval() -> u64 {
    300
}
