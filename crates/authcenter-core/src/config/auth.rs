//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Placeholder secret shipped in the defaults. Startup warns when it is still in use.
pub const PLACEHOLDER_JWT_SECRET: &str = "change-this-secret-in-production";

/// Lowest accepted password hashing work factor.
pub const MIN_HASH_WORK_FACTOR: u32 = 12;

/// Token signing and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub jwt_access_ttl_minutes: u64,
    /// Refresh token TTL in hours.
    #[serde(default = "default_refresh_ttl")]
    pub jwt_refresh_ttl_hours: u64,
    /// Issuer embedded in and required of every token.
    #[serde(default = "default_issuer")]
    pub jwt_issuer: String,
    /// Password hashing work factor; values below 12 are raised to 12.
    #[serde(default = "default_work_factor")]
    pub hash_work_factor: u32,
    /// Minimum password length accepted at registration.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Name of the role granted to every newly registered principal.
    #[serde(default = "default_role")]
    pub default_role: String,
    /// Consume the presented session on refresh so refresh tokens are single-use.
    #[serde(default)]
    pub rotate_refresh_tokens: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_access_ttl_minutes: default_access_ttl(),
            jwt_refresh_ttl_hours: default_refresh_ttl(),
            jwt_issuer: default_issuer(),
            hash_work_factor: default_work_factor(),
            password_min_length: default_password_min(),
            default_role: default_role(),
            rotate_refresh_tokens: false,
        }
    }
}

impl AuthConfig {
    /// Access token lifetime in seconds.
    pub fn access_ttl_seconds(&self) -> i64 {
        i64::try_from(self.jwt_access_ttl_minutes.saturating_mul(60)).unwrap_or(i64::MAX)
    }

    /// Refresh token lifetime in seconds.
    pub fn refresh_ttl_seconds(&self) -> i64 {
        i64::try_from(self.jwt_refresh_ttl_hours.saturating_mul(3600)).unwrap_or(i64::MAX)
    }
}

fn default_jwt_secret() -> String {
    PLACEHOLDER_JWT_SECRET.to_string()
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    168
}

fn default_issuer() -> String {
    "AuthCenter".to_string()
}

fn default_work_factor() -> u32 {
    MIN_HASH_WORK_FACTOR
}

fn default_password_min() -> usize {
    8
}

fn default_role() -> String {
    "User".to_string()
}
