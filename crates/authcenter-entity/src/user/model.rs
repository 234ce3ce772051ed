//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::grant::RoleGrant;
use super::status::UserStatus;

/// A registered principal.
///
/// At least one of `username`, `email` or `phone` is always present.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique login name.
    pub username: String,
    /// Email address (optional, unique when present).
    pub email: Option<String>,
    /// Phone number (optional, unique when present).
    pub phone: Option<String>,
    /// Argon2 password hash. Phone-only principals carry none.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Account status.
    pub status: UserStatus,
    /// Number of successful logins.
    pub login_count: i64,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
    /// Client address of the last successful login.
    pub last_login_ip: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Role grants in grant order. Loaded separately from `user_roles`.
    #[sqlx(skip)]
    #[serde(default)]
    pub roles: Vec<RoleGrant>,
}

impl User {
    /// Check if the user can log in right now.
    pub fn can_login(&self) -> bool {
        self.status.can_login()
    }

    /// Name embedded in access tokens.
    pub fn display_name(&self) -> &str {
        &self.username
    }

    /// Role grants that have not lapsed at `now`, in grant order.
    pub fn active_grants_at(&self, now: DateTime<Utc>) -> impl Iterator<Item = &RoleGrant> {
        self.roles.iter().filter(move |g| !g.is_expired_at(now))
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Desired username.
    pub username: String,
    /// Email address (optional).
    pub email: Option<String>,
    /// Phone number (optional).
    pub phone: Option<String>,
    /// Pre-hashed password (optional).
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Initial status.
    pub status: UserStatus,
    /// Initial role grants.
    pub roles: Vec<RoleGrant>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            phone: None,
            password_hash: Some("$argon2id$...".to_string()),
            status: UserStatus::Active,
            login_count: 0,
            last_login_at: None,
            last_login_ip: None,
            created_at: now,
            updated_at: now,
            roles: Vec::new(),
        }
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn test_active_grants_skip_expired() {
        let now = Utc::now();
        let mut user = sample_user();
        let mut expired = RoleGrant::system(Uuid::new_v4(), "Editor");
        expired.expires_at = Some(now - Duration::minutes(1));
        user.roles = vec![RoleGrant::system(Uuid::new_v4(), "User"), expired];

        let names: Vec<&str> = user
            .active_grants_at(now)
            .map(|g| g.role_name.as_str())
            .collect();
        assert_eq!(names, vec!["User"]);
    }
}
