//! Role status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a role currently confers its permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "role_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RoleStatus {
    /// Role is in force.
    Active,
    /// Role is retired; grants referencing it resolve to nothing.
    Inactive,
}

impl RoleStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl Default for RoleStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl fmt::Display for RoleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
