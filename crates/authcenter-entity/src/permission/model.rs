//! Permission entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Build the canonical `resource:action` permission key.
pub fn permission_key(resource: &str, action: &str) -> String {
    format!("{resource}:{action}")
}

/// A grantable capability.
///
/// Identity for authorization purposes is the `(resource, action)` pair,
/// not the name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    /// Unique permission identifier.
    pub id: Uuid,
    /// Unique permission name (e.g. `KNOWLEDGE_READ`).
    pub name: String,
    /// Protected resource (e.g. `knowledge`).
    pub resource: String,
    /// Action on the resource (e.g. `READ`).
    pub action: String,
    /// Optional description.
    pub description: Option<String>,
    /// Grouping used by management screens.
    pub category: String,
    /// When the permission was created.
    pub created_at: DateTime<Utc>,
}

impl Permission {
    /// The canonical `resource:action` key.
    pub fn key(&self) -> String {
        permission_key(&self.resource, &self.action)
    }
}
