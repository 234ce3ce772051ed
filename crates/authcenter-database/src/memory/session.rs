//! In-memory session repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use authcenter_core::result::AppResult;
use authcenter_entity::session::{CreateSession, Session};

use crate::repositories::SessionRepository;

/// Session repository over a sharded concurrent map.
///
/// Each operation locks at most one entry at a time, so revoke-all and
/// cleanup interleave safely with create and lookup.
#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    sessions: DashMap<Uuid, Session>,
}

impl MemorySessionRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, live or not.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the repository holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn create(&self, data: CreateSession, now: DateTime<Utc>) -> AppResult<Session> {
        let session = data.into_session(now);
        self.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>> {
        Ok(self.sessions.get(&id).map(|s| s.clone()))
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        Ok(match self.sessions.get_mut(&id) {
            Some(mut session) => {
                session.last_accessed_at = at;
                true
            }
            None => false,
        })
    }

    async fn revoke(&self, id: Uuid) -> AppResult<bool> {
        Ok(match self.sessions.get_mut(&id) {
            Some(mut session) => {
                session.revoked = true;
                true
            }
            None => false,
        })
    }

    async fn consume(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        Ok(match self.sessions.get_mut(&id) {
            Some(mut session) if session.is_valid_at(now) => {
                session.revoked = true;
                session.last_accessed_at = now;
                true
            }
            _ => false,
        })
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let mut matched = 0;
        for mut session in self.sessions.iter_mut() {
            if session.user_id == user_id && !session.revoked {
                session.revoked = true;
                matched += 1;
            }
        }
        Ok(matched)
    }

    async fn delete_revoked_or_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !session.revoked && !session.is_expired_at(now));
        Ok(before.saturating_sub(self.sessions.len()) as u64)
    }

    async fn find_active_by_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.is_valid_at(now))
            .map(|s| s.clone())
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authcenter_entity::session::DeviceInfo;
    use chrono::Duration;

    fn new_session(user_id: Uuid, expires_at: DateTime<Utc>) -> CreateSession {
        CreateSession {
            id: Uuid::new_v4(),
            user_id,
            device: DeviceInfo::default(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_consume_wins_once() {
        let repo = MemorySessionRepository::new();
        let now = Utc::now();
        let session = repo
            .create(new_session(Uuid::new_v4(), now + Duration::hours(1)), now)
            .await
            .unwrap();

        assert!(repo.consume(session.id, now).await.unwrap());
        assert!(!repo.consume(session.id, now).await.unwrap());
        assert!(!repo.consume(Uuid::new_v4(), now).await.unwrap());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_live_sessions() {
        let repo = MemorySessionRepository::new();
        let now = Utc::now();
        let user = Uuid::new_v4();
        let live = repo
            .create(new_session(user, now + Duration::hours(1)), now)
            .await
            .unwrap();
        let revoked = repo
            .create(new_session(user, now + Duration::hours(1)), now)
            .await
            .unwrap();
        repo.create(new_session(user, now), now - Duration::hours(1))
            .await
            .unwrap();
        repo.revoke(revoked.id).await.unwrap();

        assert_eq!(repo.delete_revoked_or_expired(now).await.unwrap(), 2);
        assert_eq!(repo.len(), 1);
        assert!(repo.find_by_id(live.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_revoke_all_scoped_to_user() {
        let repo = MemorySessionRepository::new();
        let now = Utc::now();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        for _ in 0..3 {
            repo.create(new_session(alice, now + Duration::hours(1)), now)
                .await
                .unwrap();
        }
        repo.create(new_session(bob, now + Duration::hours(1)), now)
            .await
            .unwrap();

        assert_eq!(repo.revoke_all_for_user(alice).await.unwrap(), 3);
        assert_eq!(repo.revoke_all_for_user(alice).await.unwrap(), 0);
        assert!(repo.find_active_by_user(alice, now).await.unwrap().is_empty());
        assert_eq!(repo.find_active_by_user(bob, now).await.unwrap().len(), 1);
    }
}
