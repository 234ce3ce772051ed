//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files overlaid with `AUTHCENTER__`-prefixed environment variables.
//! Each sub-module represents a logical configuration section.

pub mod auth;
pub mod database;
pub mod logging;
pub mod rate_limit;
pub mod session;

use serde::{Deserialize, Serialize};

pub use self::auth::AuthConfig;
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::rate_limit::{RateLimitConfig, RateLimitRule};
pub use self::session::SessionConfig;

use crate::error::AppError;

/// Longest accepted access token lifetime: one day.
pub const MAX_ACCESS_TTL_MINUTES: u64 = 24 * 60;
/// Longest accepted refresh token lifetime: one year.
pub const MAX_REFRESH_TTL_HOURS: u64 = 365 * 24;
/// Longest accepted session cleanup interval: one week.
pub const MAX_CLEANUP_INTERVAL_MINUTES: u64 = 7 * 24 * 60;
/// Longest accepted limiter window or sweep interval: one week.
pub const MAX_WINDOW_SECONDS: u64 = 7 * 24 * 3600;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Token and credential settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Session store settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Rate limiter settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default` with an environment-specific overlay and
    /// environment variables prefixed with `AUTHCENTER__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("AUTHCENTER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject configurations the core cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must not be empty"));
        }
        if self.auth.jwt_access_ttl_minutes == 0 || self.auth.jwt_refresh_ttl_hours == 0 {
            return Err(AppError::configuration("token TTLs must be greater than zero"));
        }
        if self.auth.jwt_access_ttl_minutes > MAX_ACCESS_TTL_MINUTES {
            return Err(AppError::configuration(format!(
                "auth.jwt_access_ttl_minutes must be at most {MAX_ACCESS_TTL_MINUTES}"
            )));
        }
        if self.auth.jwt_refresh_ttl_hours > MAX_REFRESH_TTL_HOURS {
            return Err(AppError::configuration(format!(
                "auth.jwt_refresh_ttl_hours must be at most {MAX_REFRESH_TTL_HOURS}"
            )));
        }
        if self.auth.jwt_issuer.trim().is_empty() {
            return Err(AppError::configuration("auth.jwt_issuer must not be empty"));
        }
        if self.auth.default_role.trim().is_empty() {
            return Err(AppError::configuration("auth.default_role must not be empty"));
        }
        for (name, rule) in [
            ("general", &self.rate_limit.general),
            ("login", &self.rate_limit.login),
        ] {
            if rule.window_seconds == 0 || rule.window_seconds > MAX_WINDOW_SECONDS {
                return Err(AppError::configuration(format!(
                    "rate_limit.{name}.window_seconds must be between 1 and {MAX_WINDOW_SECONDS}"
                )));
            }
        }
        if self.rate_limit.sweep_interval_seconds == 0
            || self.rate_limit.sweep_interval_seconds > MAX_WINDOW_SECONDS
        {
            return Err(AppError::configuration(format!(
                "rate_limit.sweep_interval_seconds must be between 1 and {MAX_WINDOW_SECONDS}"
            )));
        }
        if self.session.cleanup_interval_minutes == 0
            || self.session.cleanup_interval_minutes > MAX_CLEANUP_INTERVAL_MINUTES
        {
            return Err(AppError::configuration(format!(
                "session.cleanup_interval_minutes must be between 1 and {MAX_CLEANUP_INTERVAL_MINUTES}"
            )));
        }
        if self.session.operation_timeout_seconds == 0 {
            return Err(AppError::configuration(
                "session.operation_timeout_seconds must be greater than zero",
            ));
        }

        if self.auth.jwt_secret == auth::PLACEHOLDER_JWT_SECRET {
            tracing::warn!("auth.jwt_secret is the shipped placeholder; set a real secret");
        }
        Ok(())
    }
}
