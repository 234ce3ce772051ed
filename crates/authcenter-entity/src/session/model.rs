//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A server-side record backing one issued refresh token.
///
/// The session identifier is the refresh token's JTI. Sessions are created
/// on login and refresh, revoked on logout, and deleted by cleanup once
/// revoked or expired.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Session identifier (refresh token JTI).
    pub id: Uuid,
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// User-Agent reported at login.
    pub user_agent: Option<String>,
    /// Client address reported at login.
    pub ip_address: Option<String>,
    /// Client class (`web`, `mobile`, `api`).
    pub device_type: Option<String>,
    /// Absolute expiry, matching the refresh token's `exp`.
    pub expires_at: DateTime<Utc>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Last time the session was used to refresh.
    pub last_accessed_at: DateTime<Utc>,
    /// Whether the session has been revoked.
    pub revoked: bool,
}

impl Session {
    /// A session is live iff it is not revoked and `now` is before expiry.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && now < self.expires_at
    }

    /// Check if the session has passed its expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Device metadata recorded on this session.
    pub fn device(&self) -> DeviceInfo {
        DeviceInfo {
            user_agent: self.user_agent.clone(),
            ip_address: self.ip_address.clone(),
            device_type: self.device_type.as_deref().and_then(|d| d.parse().ok()),
        }
    }
}

/// Kind of client a session was opened from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// Browser client.
    Web,
    /// Mobile application.
    Mobile,
    /// Programmatic client.
    Api,
}

impl DeviceType {
    /// Return the device type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Mobile => "mobile",
            Self::Api => "api",
        }
    }
}

impl std::str::FromStr for DeviceType {
    type Err = authcenter_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "web" => Ok(Self::Web),
            "mobile" => Ok(Self::Mobile),
            "api" => Ok(Self::Api),
            _ => Err(authcenter_core::AppError::invalid_request(format!(
                "Invalid device type: '{s}'"
            ))),
        }
    }
}

/// Client metadata captured from a login request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// Client address.
    pub ip_address: Option<String>,
    /// Client class.
    pub device_type: Option<DeviceType>,
}

/// Data required to create a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    /// Caller-supplied identifier (the refresh token JTI).
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Device metadata.
    pub device: DeviceInfo,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
}

impl CreateSession {
    /// Materialize the record as of `now`: timestamps set, not revoked.
    pub fn into_session(self, now: DateTime<Utc>) -> Session {
        Session {
            id: self.id,
            user_id: self.user_id,
            user_agent: self.device.user_agent,
            ip_address: self.device.ip_address,
            device_type: self.device.device_type.map(|d| d.as_str().to_string()),
            expires_at: self.expires_at,
            created_at: now,
            last_accessed_at: now,
            revoked: false,
        }
    }
}
