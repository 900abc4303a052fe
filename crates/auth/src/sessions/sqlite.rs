//! SQLite session storage implementation.

use async_trait::async_trait;
use boac_core::auth::{AuthError, Result, Session, SessionId, SessionRepository};
use chrono::{DateTime, Utc};
use tokio_rusqlite::Connection;

const CREATE_SESSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    uid TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sessions_uid ON sessions(uid);
CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
"#;

fn storage_err(e: impl std::fmt::Display) -> AuthError {
    AuthError::Storage(e.to_string())
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(storage_err)
}

/// SQLite-backed session storage.
pub struct SqliteSessionStore {
    conn: Connection,
}

impl SqliteSessionStore {
    /// Opens the session store at `path`, creating the table if needed.
    pub async fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).await.map_err(storage_err)?;
        let store = Self { conn };
        store.migrate().await?;
        Ok(store)
    }

    /// Opens a throwaway in-memory store.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await.map_err(storage_err)?;
        let store = Self { conn };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute_batch(CREATE_SESSIONS)?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionStore {
    async fn create_session(&self, session: &Session) -> Result<()> {
        let row = (
            session.id.as_str().to_string(),
            session.uid.clone(),
            session.created_at.to_rfc3339(),
            session.expires_at.to_rfc3339(),
        );

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO sessions (id, uid, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![row.0, row.1, row.2, row.3],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        let id = id.as_str().to_string();

        let row = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, uid, created_at, expires_at FROM sessions WHERE id = ?1",
                )?;
                match stmt.query_row([&id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                }) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(storage_err)?;

        row.map(|(id, uid, created_at, expires_at)| {
            Ok(Session {
                id: SessionId::new(id),
                uid,
                created_at: parse_datetime(&created_at)?,
                expires_at: parse_datetime(&expires_at)?,
            })
        })
        .transpose()
    }

    async fn delete_session(&self, id: &SessionId) -> Result<()> {
        let id = id.as_str().to_string();

        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM sessions WHERE id = ?1", [&id])?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    async fn delete_user_sessions(&self, uid: &str) -> Result<()> {
        let uid = uid.to_string();

        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM sessions WHERE uid = ?1", [&uid])?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boac_core::auth::generate_session_id;

    fn session(uid: &str) -> Session {
        let now = Utc::now();
        Session {
            id: generate_session_id(),
            uid: uid.to_string(),
            created_at: now,
            expires_at: now + chrono::Duration::hours(12),
        }
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let store = SqliteSessionStore::open_in_memory().await.unwrap();
        let session = session("1133399");
        store.create_session(&session).await.unwrap();

        let retrieved = store.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(retrieved.uid, "1133399");
        assert_eq!(retrieved.expires_at.timestamp(), session.expires_at.timestamp());

        store.delete_session(&session.id).await.unwrap();
        assert!(store.get_session(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_user_sessions() {
        let store = SqliteSessionStore::open_in_memory().await.unwrap();
        let first = session("2040");
        let second = session("2040");
        let other = session("53791");
        for s in [&first, &second, &other] {
            store.create_session(s).await.unwrap();
        }

        store.delete_user_sessions("2040").await.unwrap();

        assert!(store.get_session(&first.id).await.unwrap().is_none());
        assert!(store.get_session(&second.id).await.unwrap().is_none());
        assert!(store.get_session(&other.id).await.unwrap().is_some());
    }
}
