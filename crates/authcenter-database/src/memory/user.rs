//! In-memory principal repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use authcenter_core::error::{AppError, ErrorKind};
use authcenter_core::result::AppResult;
use authcenter_entity::user::{CreateUser, RoleGrant, User, UserStatus};

use crate::repositories::UserRepository;

#[derive(Debug, Default)]
struct UserTable {
    rows: HashMap<Uuid, User>,
    by_username: HashMap<String, Uuid>,
    by_email: HashMap<String, Uuid>,
    by_phone: HashMap<String, Uuid>,
}

impl UserTable {
    fn lookup(&self, index: &HashMap<String, Uuid>, key: &str) -> Option<User> {
        index.get(key).and_then(|id| self.rows.get(id)).cloned()
    }
}

/// Principal repository held in process memory.
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    table: RwLock<UserTable>,
}

impl MemoryUserRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Change a principal's status.
    pub async fn set_status(&self, id: Uuid, status: UserStatus) -> AppResult<()> {
        let mut table = self.table.write().await;
        let user = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        user.status = status;
        user.updated_at = Utc::now();
        Ok(())
    }

    /// Append a grant, replacing any existing grant for the same role.
    pub async fn grant_role(&self, id: Uuid, grant: RoleGrant) -> AppResult<()> {
        let mut table = self.table.write().await;
        let user = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        user.roles.retain(|g| g.role_id != grant.role_id);
        user.roles.push(grant);
        Ok(())
    }

    /// Remove a principal and free its handles.
    pub async fn delete(&self, id: Uuid) -> bool {
        let mut table = self.table.write().await;
        let Some(user) = table.rows.remove(&id) else {
            return false;
        };
        table.by_username.remove(&user.username);
        if let Some(email) = &user.email {
            table.by_email.remove(email);
        }
        if let Some(phone) = &user.phone {
            table.by_phone.remove(phone);
        }
        true
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        self.table
            .read()
            .await
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    async fn get_by_username(&self, username: &str) -> AppResult<User> {
        let table = self.table.read().await;
        table
            .lookup(&table.by_username, username)
            .ok_or_else(|| AppError::not_found("User not found by username"))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<User> {
        let table = self.table.read().await;
        table
            .lookup(&table.by_email, email)
            .ok_or_else(|| AppError::not_found("User not found by email"))
    }

    async fn get_by_phone(&self, phone: &str) -> AppResult<User> {
        let table = self.table.read().await;
        table
            .lookup(&table.by_phone, phone)
            .ok_or_else(|| AppError::not_found("User not found by phone"))
    }

    async fn get_by_username_or_email(&self, identifier: &str) -> AppResult<User> {
        let table = self.table.read().await;
        table
            .lookup(&table.by_username, identifier)
            .or_else(|| table.lookup(&table.by_email, identifier))
            .ok_or_else(|| AppError::not_found("User not found by username or email"))
    }

    async fn create(&self, data: CreateUser) -> AppResult<User> {
        let mut table = self.table.write().await;

        if table.by_username.contains_key(&data.username) {
            return Err(AppError::new(ErrorKind::UsernameTaken, "Username already exists"));
        }
        if let Some(email) = &data.email {
            if table.by_email.contains_key(email) {
                return Err(AppError::new(ErrorKind::EmailTaken, "Email already exists"));
            }
        }
        if let Some(phone) = &data.phone {
            if table.by_phone.contains_key(phone) {
                return Err(AppError::new(ErrorKind::PhoneTaken, "Phone already exists"));
            }
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: data.username,
            email: data.email,
            phone: data.phone,
            password_hash: data.password_hash,
            status: data.status,
            login_count: 0,
            last_login_at: None,
            last_login_ip: None,
            created_at: now,
            updated_at: now,
            roles: data.roles,
        };

        table.by_username.insert(user.username.clone(), user.id);
        if let Some(email) = &user.email {
            table.by_email.insert(email.clone(), user.id);
        }
        if let Some(phone) = &user.phone {
            table.by_phone.insert(phone.clone(), user.id);
        }
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn record_login(&self, id: Uuid, ip: Option<&str>, at: DateTime<Utc>) -> AppResult<()> {
        let mut table = self.table.write().await;
        let user = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        user.login_count += 1;
        user.last_login_at = Some(at);
        if let Some(ip) = ip {
            user.last_login_ip = Some(ip.to_string());
        }
        user.updated_at = at;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: Option<&str>) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            email: email.map(str::to_string),
            phone: None,
            password_hash: None,
            status: UserStatus::Active,
            roles: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_handle_collisions_are_specific() {
        let repo = MemoryUserRepository::new();
        repo.create(new_user("alice", Some("a@example.com"))).await.unwrap();

        let err = repo.create(new_user("alice", None)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UsernameTaken);

        let err = repo
            .create(new_user("bob", Some("a@example.com")))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmailTaken);
    }

    #[tokio::test]
    async fn test_username_or_email_prefers_username() {
        let repo = MemoryUserRepository::new();
        let by_email = repo.create(new_user("carol", Some("dave"))).await.unwrap();
        let by_name = repo.create(new_user("dave", None)).await.unwrap();

        assert_eq!(repo.get_by_username_or_email("dave").await.unwrap().id, by_name.id);
        assert_eq!(repo.get_by_username_or_email("carol").await.unwrap().id, by_email.id);
        assert!(repo.get_by_username_or_email("erin").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_record_login_bumps_history() {
        let repo = MemoryUserRepository::new();
        let user = repo.create(new_user("frank", None)).await.unwrap();
        let at = Utc::now();

        repo.record_login(user.id, Some("10.0.0.1"), at).await.unwrap();
        repo.record_login(user.id, None, at).await.unwrap();

        let user = repo.get_by_id(user.id).await.unwrap();
        assert_eq!(user.login_count, 2);
        assert_eq!(user.last_login_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(user.last_login_at, Some(at));
    }
}
