//! Session management configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Session store and maintenance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Interval between expired/revoked session sweeps, in minutes.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_minutes: u64,
    /// Deadline applied to every persistence call, in seconds.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cleanup_interval_minutes: default_cleanup_interval(),
            operation_timeout_seconds: default_operation_timeout(),
        }
    }
}

impl SessionConfig {
    /// Sweep interval as a [`Duration`].
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_minutes.saturating_mul(60))
    }

    /// Persistence deadline as a [`Duration`].
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_seconds)
    }
}

fn default_cleanup_interval() -> u64 {
    60
}

fn default_operation_timeout() -> u64 {
    5
}
