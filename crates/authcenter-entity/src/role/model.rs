//! Role entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::RoleStatus;
use crate::permission::permission_key;

/// A named bundle of permissions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    /// Unique role identifier.
    pub id: Uuid,
    /// Unique role name (e.g. `Admin`).
    pub name: String,
    /// Human-readable name.
    pub display_name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Precedence; higher levels carry more privilege.
    pub level: i32,
    /// Role status.
    pub status: RoleStatus,
    /// When the role was created.
    pub created_at: DateTime<Utc>,
    /// When the role was last updated.
    pub updated_at: DateTime<Utc>,
    /// Denormalized permission references. Loaded from `role_permissions`.
    #[sqlx(skip)]
    #[serde(default)]
    pub permissions: Vec<RolePermission>,
}

impl Role {
    /// Check if the role is in force.
    pub fn is_active(&self) -> bool {
        self.status == RoleStatus::Active
    }

    /// Check if this role outranks `other`.
    pub fn outranks(&self, other: &Role) -> bool {
        self.level > other.level
    }
}

/// A permission reference held by a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RolePermission {
    /// The referenced permission.
    pub permission_id: Uuid,
    /// Permission name (e.g. `KNOWLEDGE_READ`).
    pub name: String,
    /// Protected resource.
    pub resource: String,
    /// Action on the resource.
    pub action: String,
}

impl RolePermission {
    /// The canonical `resource:action` key.
    pub fn key(&self) -> String {
        permission_key(&self.resource, &self.action)
    }
}
