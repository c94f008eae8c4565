use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::RwLock;

use super::models::{SessionRow, StoredSession};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session storage error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Corrupt stored user: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Persistent home for the bearer token and user of each session.
///
/// Sessions are keyed by an opaque string (the chat id for the bot). Writes replace
/// token and user together so a reader never sees one without the other.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<StoredSession>, StoreError>;
    async fn save(&self, key: &str, session: &StoredSession) -> Result<(), StoreError>;
    async fn clear(&self, key: &str) -> Result<(), StoreError>;
    /// Every stored session, used by background jobs.
    async fn all(&self) -> Result<Vec<(String, StoredSession)>, StoreError>;
}

#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn from_row(row: SessionRow) -> Result<(String, StoredSession), StoreError> {
    let user = serde_json::from_str(&row.user_json)?;
    Ok((
        row.key,
        StoredSession {
            token: row.token,
            user,
            updated_at: row.updated_at,
        },
    ))
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self, key: &str) -> Result<Option<StoredSession>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT key, token, user_json, updated_at FROM sessions WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(from_row)
            .transpose()
            .map(|found| found.map(|(_, session)| session))
    }

    async fn save(&self, key: &str, session: &StoredSession) -> Result<(), StoreError> {
        let user_json = serde_json::to_string(&session.user)?;
        sqlx::query(
            "INSERT INTO sessions (key, token, user_json, updated_at) VALUES ($1, $2, $3, $4)
             ON CONFLICT(key) DO UPDATE SET
                token = excluded.token,
                user_json = excluded.user_json,
                updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(&session.token)
        .bind(user_json)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;

        log::debug!("Stored session for {}", key);
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        log::debug!("Cleared session for {}", key);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<(String, StoredSession)>, StoreError> {
        let rows = sqlx::query_as::<_, SessionRow>(
            "SELECT key, token, user_json, updated_at FROM sessions ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(from_row).collect()
    }
}

/// Volatile store, handy when persistence isn't wanted.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, key: &str) -> Result<Option<StoredSession>, StoreError> {
        Ok(self.sessions.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, session: &StoredSession) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(key.to_string(), session.clone());
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(key);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<(String, StoredSession)>, StoreError> {
        let mut sessions: Vec<_> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(key, session)| (key.clone(), session.clone()))
            .collect();
        sessions.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{Role, User};
    use crate::db::init_db;

    fn session(token: &str) -> StoredSession {
        StoredSession::new(
            token.to_string(),
            User {
                id: "u1".to_string(),
                first_name: "Ada".to_string(),
                role: Role::Doctor,
                ..Default::default()
            },
        )
    }

    async fn sqlite_store() -> SqliteSessionStore {
        SqliteSessionStore::new(init_db("sqlite::memory:").await.unwrap())
    }

    #[tokio::test]
    async fn sqlite_round_trips_and_overwrites() {
        let store = sqlite_store().await;
        assert!(store.load("42").await.unwrap().is_none());

        store.save("42", &session("first")).await.unwrap();
        store.save("42", &session("second")).await.unwrap();

        let loaded = store.load("42").await.unwrap().unwrap();
        assert_eq!(loaded.token, "second");
        assert_eq!(loaded.user.role, Role::Doctor);
        assert_eq!(store.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sqlite_clear_removes_only_that_key() {
        let store = sqlite_store().await;
        store.save("1", &session("a")).await.unwrap();
        store.save("2", &session("b")).await.unwrap();

        store.clear("1").await.unwrap();

        assert!(store.load("1").await.unwrap().is_none());
        let remaining = store.all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].0, "2");
    }

    #[tokio::test]
    async fn memory_store_lists_sorted_keys() {
        let store = MemorySessionStore::default();
        store.save("b", &session("1")).await.unwrap();
        store.save("a", &session("2")).await.unwrap();

        let keys: Vec<String> = store.all().await.unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }
}
