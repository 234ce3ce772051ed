//! Collaborator interfaces and their PostgreSQL adapters.
//!
//! Each trait is a narrow capability consumed by the auth services. Lookups
//! that miss fail with [`ErrorKind::NotFound`](authcenter_core::ErrorKind::NotFound);
//! session operations that address a single record report whether it matched
//! so the caller decides what a miss means.

pub mod role;
pub mod session;
pub mod user;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use authcenter_core::result::AppResult;
use authcenter_entity::permission::Permission;
use authcenter_entity::role::Role;
use authcenter_entity::session::{CreateSession, Session};
use authcenter_entity::user::{CreateUser, User};

pub use role::PgRoleRepository;
pub use session::PgSessionRepository;
pub use user::PgUserRepository;

/// Principal lookup and creation.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Find a principal by primary key.
    async fn get_by_id(&self, id: Uuid) -> AppResult<User>;

    /// Find a principal by username.
    async fn get_by_username(&self, username: &str) -> AppResult<User>;

    /// Find a principal by email.
    async fn get_by_email(&self, email: &str) -> AppResult<User>;

    /// Find a principal by phone.
    async fn get_by_phone(&self, phone: &str) -> AppResult<User>;

    /// Find a principal whose username, failing that whose email, equals
    /// `identifier`.
    async fn get_by_username_or_email(&self, identifier: &str) -> AppResult<User>;

    /// Persist a new principal with its initial grants.
    ///
    /// Handle collisions fail with the handle-specific `*Taken` kind.
    async fn create(&self, user: CreateUser) -> AppResult<User>;

    /// Record a successful login: bump the counter, stamp time and address.
    async fn record_login(&self, id: Uuid, ip: Option<&str>, at: DateTime<Utc>) -> AppResult<()>;
}

/// Role lookup.
#[async_trait]
pub trait RoleRepository: Send + Sync + 'static {
    /// Find a role by unique name.
    async fn get_by_name(&self, name: &str) -> AppResult<Role>;

    /// Permissions held by an active role. Missing and inactive roles are
    /// both `NotFound`.
    async fn get_permissions(&self, role_id: Uuid) -> AppResult<Vec<Permission>>;
}

/// Durable session persistence.
///
/// Every mutation is a single-record atomic update so revoke-all and
/// cleanup can run alongside create and lookup.
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Insert a new, unrevoked session stamped at `now`.
    async fn create(&self, session: CreateSession, now: DateTime<Utc>) -> AppResult<Session>;

    /// Fetch a session by identifier.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>>;

    /// Set `last_accessed_at`. Returns whether the session exists.
    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool>;

    /// Mark one session revoked. Returns whether the session exists.
    async fn revoke(&self, id: Uuid) -> AppResult<bool>;

    /// Revoke the session only if it is still live at `now`. Returns whether
    /// this call performed the transition.
    async fn consume(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool>;

    /// Revoke every session owned by `user_id`. Returns the number matched.
    async fn revoke_all_for_user(&self, user_id: Uuid) -> AppResult<u64>;

    /// Delete sessions that are revoked or expired at `now`.
    async fn delete_revoked_or_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;

    /// Live sessions owned by `user_id`, newest first.
    async fn find_active_by_user(&self, user_id: Uuid, now: DateTime<Utc>)
    -> AppResult<Vec<Session>>;
}
