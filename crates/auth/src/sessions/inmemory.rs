//! In-memory session storage.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use boac_core::auth::{Result, Session, SessionId, SessionRepository};

/// In-memory session store for development and testing.
///
/// Sessions live in a HashMap wrapped in `Arc<RwLock<_>>` and are lost when
/// the process exits.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    /// Creates a new empty in-memory session store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for SessionStore {
    async fn create_session(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.as_str().to_string(), session.clone());
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(id.as_str()).cloned())
    }

    async fn delete_session(&self, id: &SessionId) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id.as_str());
        Ok(())
    }

    async fn delete_user_sessions(&self, uid: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.uid != uid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_session(id: &str, uid: &str) -> Session {
        Session {
            id: SessionId::new(id.to_string()),
            uid: uid.to_string(),
            created_at: Utc::now(),
            expires_at: Utc::now() + chrono::Duration::hours(12),
        }
    }

    fn id(value: &str) -> SessionId {
        SessionId::new(value.to_string())
    }

    #[tokio::test]
    async fn test_session_create_and_get() {
        let store = SessionStore::new();
        store
            .create_session(&create_test_session("session-1", "1133399"))
            .await
            .unwrap();

        let retrieved = store.get_session(&id("session-1")).await.unwrap().unwrap();
        assert_eq!(retrieved.id.as_str(), "session-1");
        assert_eq!(retrieved.uid, "1133399");
    }

    #[tokio::test]
    async fn test_session_get_nonexistent() {
        let store = SessionStore::new();
        assert!(store.get_session(&id("nonexistent")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_delete() {
        let store = SessionStore::new();
        store
            .create_session(&create_test_session("session-1", "1133399"))
            .await
            .unwrap();
        store.delete_session(&id("session-1")).await.unwrap();

        assert!(store.get_session(&id("session-1")).await.unwrap().is_none());
        // Deleting again is not an error
        assert!(store.delete_session(&id("session-1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_user_sessions() {
        let store = SessionStore::new();
        for (session, uid) in [("s1", "2040"), ("s2", "2040"), ("s3", "53791")] {
            store
                .create_session(&create_test_session(session, uid))
                .await
                .unwrap();
        }

        store.delete_user_sessions("2040").await.unwrap();

        assert!(store.get_session(&id("s1")).await.unwrap().is_none());
        assert!(store.get_session(&id("s2")).await.unwrap().is_none());
        assert!(store.get_session(&id("s3")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let store = SessionStore::new();
        let clone = store.clone();

        store
            .create_session(&create_test_session("session-1", "2040"))
            .await
            .unwrap();

        assert!(clone.get_session(&id("session-1")).await.unwrap().is_some());
    }
}
