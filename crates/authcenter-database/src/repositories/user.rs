//! PostgreSQL principal repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use authcenter_core::error::{AppError, ErrorKind};
use authcenter_core::result::AppResult;
use authcenter_entity::user::{CreateUser, RoleGrant, User};

use super::UserRepository;

const USER_COLUMNS: &str = "id, username, email, phone, password_hash, status, login_count, \
     last_login_at, last_login_ip, created_at, updated_at";

/// Principal repository backed by the `users` and `user_roles` tables.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {column} = $1"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Persistence,
                format!("Failed to find user by {column}"),
                e,
            )
        })
    }

    async fn load_grants(&self, mut user: User) -> AppResult<User> {
        user.roles = sqlx::query_as::<_, RoleGrant>(
            "SELECT role_id, role_name, granted_by, granted_at, expires_at \
             FROM user_roles WHERE user_id = $1 ORDER BY granted_at, role_name",
        )
        .bind(user.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to load role grants", e)
        })?;
        Ok(user)
    }

    async fn require(&self, column: &str, value: &str) -> AppResult<User> {
        match self.find_one(column, value).await? {
            Some(user) => self.load_grants(user).await,
            None => {
                debug!(column = %column, "User lookup missed");
                Err(AppError::not_found(format!("User not found by {column}")))
            }
        }
    }
}

/// Translate a unique-constraint violation into the handle-specific kind.
fn map_insert_error(err: sqlx::Error) -> AppError {
    let constraint = err
        .as_database_error()
        .filter(|db| db.is_unique_violation())
        .and_then(|db| db.constraint().map(str::to_owned));

    match constraint.as_deref() {
        Some("users_username_key") => AppError::new(ErrorKind::UsernameTaken, "Username already exists"),
        Some("users_email_key") => AppError::new(ErrorKind::EmailTaken, "Email already exists"),
        Some("users_phone_key") => AppError::new(ErrorKind::PhoneTaken, "Phone already exists"),
        _ => AppError::with_source(ErrorKind::Persistence, "Failed to create user", err),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to find user by id", e))?
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        self.load_grants(user).await
    }

    async fn get_by_username(&self, username: &str) -> AppResult<User> {
        self.require("username", username).await
    }

    async fn get_by_email(&self, email: &str) -> AppResult<User> {
        self.require("email", email).await
    }

    async fn get_by_phone(&self, phone: &str) -> AppResult<User> {
        self.require("phone", phone).await
    }

    async fn get_by_username_or_email(&self, identifier: &str) -> AppResult<User> {
        if let Some(user) = self.find_one("username", identifier).await? {
            return self.load_grants(user).await;
        }
        self.require("email", identifier).await
    }

    async fn create(&self, data: CreateUser) -> AppResult<User> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to begin transaction", e)
        })?;

        let mut user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, email, phone, password_hash, status) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.password_hash)
        .bind(data.status)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_insert_error)?;

        for grant in &data.roles {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role_id, role_name, granted_by, granted_at, expires_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(user.id)
            .bind(grant.role_id)
            .bind(&grant.role_name)
            .bind(grant.granted_by)
            .bind(grant.granted_at)
            .bind(grant.expires_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Persistence, "Failed to grant role", e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to commit user", e)
        })?;

        user.roles = data.roles;
        Ok(user)
    }

    async fn record_login(&self, id: Uuid, ip: Option<&str>, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET login_count = login_count + 1, last_login_at = $2, \
             last_login_ip = COALESCE($3, last_login_ip), updated_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .bind(ip)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to record login", e))?;
        Ok(())
    }
}
