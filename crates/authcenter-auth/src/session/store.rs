//! Session storage operations wrapping the session repository.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use authcenter_core::config::SessionConfig;
use authcenter_core::deadline::with_deadline;
use authcenter_core::error::AppError;
use authcenter_database::repositories::SessionRepository;
use authcenter_entity::session::{CreateSession, Session};

/// Owns every session record.
///
/// Each call into the repository is bounded by the configured operation
/// timeout and fails with `Timeout` rather than blocking.
#[derive(Clone)]
pub struct SessionStore {
    repo: Arc<dyn SessionRepository>,
    deadline: Duration,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl SessionStore {
    /// Creates a new session store.
    pub fn new(repo: Arc<dyn SessionRepository>, config: &SessionConfig) -> Self {
        Self {
            repo,
            deadline: config.operation_timeout(),
        }
    }

    /// Persists a new session under the caller-supplied identifier.
    pub async fn create(&self, session: CreateSession) -> Result<Session, AppError> {
        let created = with_deadline(
            self.deadline,
            "session.create",
            self.repo.create(session, Utc::now()),
        )
        .await?;
        debug!(session_id = %created.id, user_id = %created.user_id, "Session created");
        Ok(created)
    }

    /// Fetches a session by ID.
    pub async fn get_by_id(&self, session_id: Uuid) -> Result<Session, AppError> {
        with_deadline(
            self.deadline,
            "session.get_by_id",
            self.repo.find_by_id(session_id),
        )
        .await?
        .ok_or_else(|| AppError::session_not_found(session_id))
    }

    /// Updates the session's last-access time.
    pub async fn touch(&self, session_id: Uuid) -> Result<(), AppError> {
        let found = with_deadline(
            self.deadline,
            "session.touch",
            self.repo.touch(session_id, Utc::now()),
        )
        .await?;
        if !found {
            return Err(AppError::session_not_found(session_id));
        }
        Ok(())
    }

    /// Revokes a single session.
    pub async fn revoke_one(&self, session_id: Uuid) -> Result<(), AppError> {
        let found =
            with_deadline(self.deadline, "session.revoke", self.repo.revoke(session_id)).await?;
        if !found {
            return Err(AppError::session_not_found(session_id));
        }
        info!(session_id = %session_id, "Session revoked");
        Ok(())
    }

    /// Revokes every session owned by the principal. Zero matches is fine.
    pub async fn revoke_all_for_principal(&self, user_id: Uuid) -> Result<u64, AppError> {
        let revoked = with_deadline(
            self.deadline,
            "session.revoke_all",
            self.repo.revoke_all_for_user(user_id),
        )
        .await?;
        info!(user_id = %user_id, revoked = revoked, "Revoked all sessions for user");
        Ok(revoked)
    }

    /// Deletes sessions that are revoked or past expiry.
    pub async fn cleanup(&self) -> Result<u64, AppError> {
        with_deadline(
            self.deadline,
            "session.cleanup",
            self.repo.delete_revoked_or_expired(Utc::now()),
        )
        .await
    }

    /// Revokes the session if and only if it is still live. Returns whether
    /// this call won; concurrent callers see at most one `true`.
    pub async fn consume(&self, session_id: Uuid) -> Result<bool, AppError> {
        with_deadline(
            self.deadline,
            "session.consume",
            self.repo.consume(session_id, Utc::now()),
        )
        .await
    }

    /// Live sessions for the principal, newest first.
    pub async fn list_active(&self, user_id: Uuid) -> Result<Vec<Session>, AppError> {
        with_deadline(
            self.deadline,
            "session.list_active",
            self.repo.find_active_by_user(user_id, Utc::now()),
        )
        .await
    }

    /// Resolves a session that must be live: absent, revoked and expired
    /// sessions all fail with `SessionInvalid`.
    pub async fn validate(&self, session_id: Uuid) -> Result<Session, AppError> {
        let session = match self.get_by_id(session_id).await {
            Ok(session) => session,
            Err(e) if e.kind == authcenter_core::ErrorKind::SessionNotFound => {
                return Err(AppError::session_invalid("Session not found"));
            }
            Err(e) => return Err(e),
        };
        if session.revoked {
            return Err(AppError::session_invalid("Session has been revoked"));
        }
        if session.is_expired_at(Utc::now()) {
            return Err(AppError::session_invalid("Session has expired"));
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use authcenter_core::ErrorKind;
    use authcenter_core::result::AppResult;
    use authcenter_database::memory::MemorySessionRepository;
    use authcenter_entity::session::DeviceInfo;
    use chrono::DateTime;

    fn store() -> SessionStore {
        SessionStore::new(
            Arc::new(MemorySessionRepository::new()),
            &SessionConfig::default(),
        )
    }

    fn new_session(user_id: Uuid, ttl: chrono::Duration) -> CreateSession {
        CreateSession {
            id: Uuid::new_v4(),
            user_id,
            device: DeviceInfo::default(),
            expires_at: Utc::now() + ttl,
        }
    }

    #[tokio::test]
    async fn test_create_sets_timestamps() {
        let store = store();
        let request = new_session(Uuid::new_v4(), chrono::Duration::hours(1));
        let id = request.id;
        let session = store.create(request).await.unwrap();

        assert_eq!(session.id, id);
        assert!(!session.revoked);
        assert_eq!(session.created_at, session.last_accessed_at);
        assert_eq!(store.get_by_id(id).await.unwrap().id, id);
    }

    #[tokio::test]
    async fn test_missing_session_is_not_found() {
        let store = store();
        let id = Uuid::new_v4();
        assert_eq!(store.get_by_id(id).await.unwrap_err().kind, ErrorKind::SessionNotFound);
        assert_eq!(store.touch(id).await.unwrap_err().kind, ErrorKind::SessionNotFound);
        assert_eq!(store.revoke_one(id).await.unwrap_err().kind, ErrorKind::SessionNotFound);
        assert_eq!(store.revoke_all_for_principal(id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_touch_is_idempotent() {
        let store = store();
        let session = store
            .create(new_session(Uuid::new_v4(), chrono::Duration::hours(1)))
            .await
            .unwrap();
        store.touch(session.id).await.unwrap();
        store.touch(session.id).await.unwrap();
        let touched = store.get_by_id(session.id).await.unwrap();
        assert!(touched.last_accessed_at >= session.last_accessed_at);
        assert!(!touched.revoked);
    }

    #[tokio::test]
    async fn test_validate_rejects_revoked_and_expired() {
        let store = store();
        let user = Uuid::new_v4();
        let live = store
            .create(new_session(user, chrono::Duration::hours(1)))
            .await
            .unwrap();
        let expired = store
            .create(new_session(user, chrono::Duration::seconds(-1)))
            .await
            .unwrap();

        assert!(store.validate(live.id).await.is_ok());
        assert_eq!(
            store.validate(expired.id).await.unwrap_err().kind,
            ErrorKind::SessionInvalid
        );
        assert_eq!(
            store.validate(Uuid::new_v4()).await.unwrap_err().kind,
            ErrorKind::SessionInvalid
        );

        store.revoke_one(live.id).await.unwrap();
        assert_eq!(
            store.validate(live.id).await.unwrap_err().kind,
            ErrorKind::SessionInvalid
        );
        assert_eq!(store.cleanup().await.unwrap(), 2);
    }

    #[derive(Debug)]
    struct StalledRepository;

    #[async_trait]
    impl SessionRepository for StalledRepository {
        async fn create(&self, _: CreateSession, _: DateTime<Utc>) -> AppResult<Session> {
            std::future::pending().await
        }
        async fn find_by_id(&self, _: Uuid) -> AppResult<Option<Session>> {
            std::future::pending().await
        }
        async fn touch(&self, _: Uuid, _: DateTime<Utc>) -> AppResult<bool> {
            std::future::pending().await
        }
        async fn revoke(&self, _: Uuid) -> AppResult<bool> {
            std::future::pending().await
        }
        async fn consume(&self, _: Uuid, _: DateTime<Utc>) -> AppResult<bool> {
            std::future::pending().await
        }
        async fn revoke_all_for_user(&self, _: Uuid) -> AppResult<u64> {
            std::future::pending().await
        }
        async fn delete_revoked_or_expired(&self, _: DateTime<Utc>) -> AppResult<u64> {
            std::future::pending().await
        }
        async fn find_active_by_user(&self, _: Uuid, _: DateTime<Utc>) -> AppResult<Vec<Session>> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_persistence_times_out() {
        let store = SessionStore::new(Arc::new(StalledRepository), &SessionConfig::default());

        let err = store.get_by_id(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(err.is_retryable());

        let err = store.revoke_all_for_principal(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert_eq!(store.cleanup().await.unwrap_err().kind, ErrorKind::Timeout);
    }
}
