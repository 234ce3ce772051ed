//! In-memory role repository and the stock role catalog.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use authcenter_core::error::AppError;
use authcenter_core::result::AppResult;
use authcenter_entity::permission::Permission;
use authcenter_entity::role::{Role, RolePermission, RoleStatus};

use crate::repositories::RoleRepository;

/// `(name, resource, action, category)` for every stock permission.
const STOCK_PERMISSIONS: &[(&str, &str, &str, &str)] = &[
    ("KNOWLEDGE_READ", "knowledge", "READ", "knowledge_content"),
    ("KNOWLEDGE_CREATE", "knowledge", "CREATE", "knowledge_content"),
    ("KNOWLEDGE_UPDATE", "knowledge", "UPDATE", "knowledge_content"),
    ("KNOWLEDGE_DELETE", "knowledge", "DELETE", "knowledge_content"),
    ("KNOWLEDGE_PUBLISH", "knowledge", "PUBLISH", "knowledge_content"),
    ("KNOWLEDGE_APPROVE", "knowledge", "APPROVE", "knowledge_content"),
    ("USER_MANAGE", "user", "MANAGE", "system_management"),
    ("ROLE_MANAGE", "role", "MANAGE", "system_management"),
    ("SYSTEM_CONFIG", "system", "CONFIG", "system_management"),
    ("CATEGORY_MANAGE", "category", "MANAGE", "content_organization"),
    ("TAG_CREATE", "tag", "CREATE", "content_organization"),
    ("TAG_MANAGE", "tag", "MANAGE", "content_organization"),
    ("COMMENT", "knowledge", "COMMENT", "interaction"),
    ("FAVORITE", "knowledge", "FAVORITE", "interaction"),
    ("SEARCH", "knowledge", "SEARCH", "interaction"),
    ("AI_ASSISTANT", "ai", "USE", "interaction"),
];

const EDITOR_PERMISSIONS: &[&str] = &[
    "KNOWLEDGE_READ",
    "KNOWLEDGE_CREATE",
    "KNOWLEDGE_UPDATE",
    "KNOWLEDGE_DELETE",
    "KNOWLEDGE_PUBLISH",
    "CATEGORY_MANAGE",
    "TAG_CREATE",
    "COMMENT",
    "FAVORITE",
    "SEARCH",
    "AI_ASSISTANT",
];

const AUTHOR_PERMISSIONS: &[&str] = &[
    "KNOWLEDGE_READ",
    "KNOWLEDGE_CREATE",
    "KNOWLEDGE_UPDATE",
    "TAG_CREATE",
    "COMMENT",
    "FAVORITE",
    "SEARCH",
    "AI_ASSISTANT",
];

const USER_PERMISSIONS: &[&str] = &["KNOWLEDGE_READ", "COMMENT", "FAVORITE", "SEARCH", "AI_ASSISTANT"];

#[derive(Debug, Default)]
struct RoleTable {
    roles: HashMap<Uuid, Role>,
    permissions: HashMap<Uuid, Permission>,
}

/// Role repository held in process memory.
#[derive(Debug, Default)]
pub struct MemoryRoleRepository {
    table: RwLock<RoleTable>,
}

impl MemoryRoleRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository holding the stock catalog: `Admin`, `Editor`,
    /// `Author` and `User` with their default permission sets.
    pub fn with_stock_roles() -> Self {
        let now = Utc::now();
        let mut table = RoleTable::default();

        let mut by_name = HashMap::new();
        for (name, resource, action, category) in STOCK_PERMISSIONS {
            let permission = Permission {
                id: Uuid::new_v4(),
                name: (*name).to_string(),
                resource: (*resource).to_string(),
                action: (*action).to_string(),
                description: None,
                category: (*category).to_string(),
                created_at: now,
            };
            by_name.insert(*name, permission.id);
            table.permissions.insert(permission.id, permission);
        }

        let all: Vec<&str> = STOCK_PERMISSIONS.iter().map(|(name, ..)| *name).collect();
        let catalog: [(&str, &str, i32, &[&str]); 4] = [
            ("Admin", "Administrator", 4, all.as_slice()),
            ("Editor", "Editor", 3, EDITOR_PERMISSIONS),
            ("Author", "Author", 2, AUTHOR_PERMISSIONS),
            ("User", "User", 1, USER_PERMISSIONS),
        ];

        for (name, display_name, level, names) in catalog {
            let permissions = names
                .iter()
                .filter_map(|n| by_name.get(n))
                .filter_map(|id| table.permissions.get(id))
                .map(|p| RolePermission {
                    permission_id: p.id,
                    name: p.name.clone(),
                    resource: p.resource.clone(),
                    action: p.action.clone(),
                })
                .collect();
            let role = Role {
                id: Uuid::new_v4(),
                name: name.to_string(),
                display_name: display_name.to_string(),
                description: None,
                level,
                status: RoleStatus::Active,
                created_at: now,
                updated_at: now,
                permissions,
            };
            table.roles.insert(role.id, role);
        }

        Self {
            table: RwLock::new(table),
        }
    }

    /// Insert a role together with the permissions it references.
    pub async fn insert(&self, role: Role, permissions: Vec<Permission>) {
        let mut table = self.table.write().await;
        for permission in permissions {
            table.permissions.insert(permission.id, permission);
        }
        table.roles.insert(role.id, role);
    }

    /// Change a role's status.
    pub async fn set_status(&self, role_id: Uuid, status: RoleStatus) -> AppResult<()> {
        let mut table = self.table.write().await;
        let role = table
            .roles
            .get_mut(&role_id)
            .ok_or_else(|| AppError::not_found(format!("Role {role_id} not found")))?;
        role.status = status;
        role.updated_at = Utc::now();
        Ok(())
    }

    /// Remove a role. Grants that reference it stop resolving.
    pub async fn remove(&self, role_id: Uuid) -> bool {
        self.table.write().await.roles.remove(&role_id).is_some()
    }
}

#[async_trait]
impl RoleRepository for MemoryRoleRepository {
    async fn get_by_name(&self, name: &str) -> AppResult<Role> {
        self.table
            .read()
            .await
            .roles
            .values()
            .find(|r| r.name == name)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Role '{name}' not found")))
    }

    async fn get_permissions(&self, role_id: Uuid) -> AppResult<Vec<Permission>> {
        let table = self.table.read().await;
        let role = table
            .roles
            .get(&role_id)
            .filter(|r| r.is_active())
            .ok_or_else(|| AppError::not_found(format!("Active role {role_id} not found")))?;

        Ok(role
            .permissions
            .iter()
            .filter_map(|rp| table.permissions.get(&rp.permission_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stock_catalog() {
        let repo = MemoryRoleRepository::with_stock_roles();

        let admin = repo.get_by_name("Admin").await.unwrap();
        assert_eq!(admin.level, 4);
        assert_eq!(repo.get_permissions(admin.id).await.unwrap().len(), 16);

        let user = repo.get_by_name("User").await.unwrap();
        let keys: Vec<String> = repo
            .get_permissions(user.id)
            .await
            .unwrap()
            .iter()
            .map(Permission::key)
            .collect();
        assert_eq!(keys.len(), 5);
        assert!(keys.contains(&"knowledge:READ".to_string()));
        assert!(keys.contains(&"ai:USE".to_string()));
        assert!(admin.outranks(&user));
    }

    #[tokio::test]
    async fn test_inactive_role_has_no_permissions() {
        let repo = MemoryRoleRepository::with_stock_roles();
        let editor = repo.get_by_name("Editor").await.unwrap();

        repo.set_status(editor.id, RoleStatus::Inactive).await.unwrap();
        assert!(repo.get_permissions(editor.id).await.unwrap_err().is_not_found());
        assert!(repo.get_permissions(Uuid::new_v4()).await.unwrap_err().is_not_found());
    }
}
