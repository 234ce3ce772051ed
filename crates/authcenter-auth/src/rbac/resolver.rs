//! Aggregates a principal's role grants into a permission snapshot.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use authcenter_core::deadline::with_deadline;
use authcenter_database::repositories::RoleRepository;
use authcenter_entity::permission::permission_key;
use authcenter_entity::user::RoleGrant;

/// Role names and permission keys taken from a principal's live grants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAccess {
    /// Names of non-expired roles, in grant order. A role whose permission
    /// lookup failed is still listed; it just contributes no permissions.
    pub roles: Vec<String>,
    /// Deduplicated `resource:action` keys, in first-seen order.
    pub permissions: Vec<String>,
}

/// Resolves role grants to permission keys.
///
/// A role whose lookup fails is logged and skipped; the result feeds an
/// allow-list, so a partial set only ever grants less.
#[derive(Clone)]
pub struct PermissionResolver {
    roles: Arc<dyn RoleRepository>,
    deadline: Duration,
}

impl std::fmt::Debug for PermissionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionResolver")
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl PermissionResolver {
    /// Creates a resolver over the role lookup collaborator.
    pub fn new(roles: Arc<dyn RoleRepository>, deadline: Duration) -> Self {
        Self { roles, deadline }
    }

    /// Resolves the permission keys for `grants` as of now.
    pub async fn resolve_permissions(&self, grants: &[RoleGrant]) -> Vec<String> {
        self.resolve_at(grants, Utc::now()).await.permissions
    }

    /// Resolves role names and permission keys for `grants` as of `now`.
    pub async fn resolve_at(&self, grants: &[RoleGrant], now: DateTime<Utc>) -> ResolvedAccess {
        let mut access = ResolvedAccess::default();
        let mut seen = HashSet::new();

        for grant in grants.iter().filter(|g| !g.is_expired_at(now)) {
            access.roles.push(grant.role_name.clone());

            let lookup = with_deadline(
                self.deadline,
                "role.get_permissions",
                self.roles.get_permissions(grant.role_id),
            )
            .await;

            let permissions = match lookup {
                Ok(permissions) => permissions,
                Err(e) => {
                    warn!(
                        role_id = %grant.role_id,
                        role = %grant.role_name,
                        error = %e,
                        "Skipping role whose permissions could not be resolved"
                    );
                    continue;
                }
            };

            for permission in permissions {
                let key = permission.key();
                if seen.insert(key.clone()) {
                    access.permissions.push(key);
                }
            }
        }

        debug!(
            roles = access.roles.len(),
            permissions = access.permissions.len(),
            "Resolved permissions"
        );
        access
    }

    /// Exact-match membership test for `resource:action`.
    pub fn check_access(permissions: &[String], resource: &str, action: &str) -> bool {
        let wanted = permission_key(resource, action);
        permissions.iter().any(|p| *p == wanted)
    }
}
