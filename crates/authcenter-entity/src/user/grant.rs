//! Role grant: the association between a principal and a role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A role granted to a user, with provenance.
///
/// Grants are unique per `(user, role)` pair. An expired grant is kept for
/// audit but contributes neither its role name nor its permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RoleGrant {
    /// The granted role.
    pub role_id: Uuid,
    /// Denormalized role name.
    pub role_name: String,
    /// Who granted the role; `None` for system-originated grants.
    pub granted_by: Option<Uuid>,
    /// When the grant was made.
    pub granted_at: DateTime<Utc>,
    /// Optional expiry of the grant.
    pub expires_at: Option<DateTime<Utc>>,
}

impl RoleGrant {
    /// A grant made by the system itself (no human grantor).
    pub fn system(role_id: Uuid, role_name: impl Into<String>) -> Self {
        Self {
            role_id,
            role_name: role_name.into(),
            granted_by: None,
            granted_at: Utc::now(),
            expires_at: None,
        }
    }

    /// Whether the grant has lapsed at `now`. Expiry is exclusive.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }

    /// Whether the grant was made by the system.
    pub fn is_system_grant(&self) -> bool {
        self.granted_by.is_none()
    }
}
