//! PostgreSQL role repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use authcenter_core::error::{AppError, ErrorKind};
use authcenter_core::result::AppResult;
use authcenter_entity::permission::Permission;
use authcenter_entity::role::{Role, RolePermission, RoleStatus};

use super::RoleRepository;

/// Role repository backed by `roles`, `permissions` and `role_permissions`.
#[derive(Debug, Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    /// Create a new role repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn get_by_name(&self, name: &str) -> AppResult<Role> {
        let mut role = sqlx::query_as::<_, Role>(
            "SELECT id, name, display_name, description, level, status, created_at, updated_at \
             FROM roles WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to find role", e))?
        .ok_or_else(|| AppError::not_found(format!("Role '{name}' not found")))?;

        role.permissions = sqlx::query_as::<_, RolePermission>(
            "SELECT p.id AS permission_id, p.name, p.resource, p.action \
             FROM role_permissions rp JOIN permissions p ON p.id = rp.permission_id \
             WHERE rp.role_id = $1 ORDER BY p.name",
        )
        .bind(role.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to load role permissions", e)
        })?;

        Ok(role)
    }

    async fn get_permissions(&self, role_id: Uuid) -> AppResult<Vec<Permission>> {
        let status: Option<RoleStatus> =
            sqlx::query_scalar("SELECT status FROM roles WHERE id = $1")
                .bind(role_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Persistence, "Failed to find role", e)
                })?;

        if status != Some(RoleStatus::Active) {
            return Err(AppError::not_found(format!("Active role {role_id} not found")));
        }

        sqlx::query_as::<_, Permission>(
            "SELECT p.id, p.name, p.resource, p.action, p.description, p.category, p.created_at \
             FROM role_permissions rp JOIN permissions p ON p.id = rp.permission_id \
             WHERE rp.role_id = $1 ORDER BY p.name",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to load role permissions", e)
        })
    }
}
