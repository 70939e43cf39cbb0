//! Status check records
//!
//! Minimal liveness records clients can write and list, kept in the same
//! durable store as scan sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use uuid::Uuid;

use crate::error::Result;

/// A client-reported status check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCheck {
    /// Unique record identifier
    pub id: Uuid,
    /// Name the client reported
    pub client_name: String,
    /// When the check was recorded
    pub timestamp: DateTime<Utc>,
}

impl StatusCheck {
    /// Create a new record stamped with the current time
    #[must_use]
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_name: client_name.into(),
            timestamp: Utc::now(),
        }
    }
}

/// SQLite-backed store for status checks
pub struct StatusCheckStore {
    pool: SqlitePool,
}

impl StatusCheckStore {
    /// Create a new store with the given database pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS status_checks (
                id TEXT PRIMARY KEY,
                client_name TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Persist a status check
    pub async fn create(&self, check: &StatusCheck) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO status_checks (id, client_name, timestamp)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(check.id.to_string())
        .bind(&check.client_name)
        .bind(check.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List recorded checks, oldest first, up to `limit`
    pub async fn list(&self, limit: i64) -> Result<Vec<StatusCheck>> {
        let rows = sqlx::query(
            r#"
            SELECT id, client_name, timestamp
            FROM status_checks
            ORDER BY timestamp
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let id: String = row.get("id");
                let timestamp: String = row.get("timestamp");
                StatusCheck {
                    id: Uuid::parse_str(&id).unwrap_or_default(),
                    client_name: row.get("client_name"),
                    timestamp: DateTime::parse_from_rfc3339(&timestamp)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> StatusCheckStore {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = StatusCheckStore::new(pool);
        store.init().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let store = setup_test_db().await;

        let check = StatusCheck::new("frontend");
        store.create(&check).await.unwrap();

        let listed = store.list(1000).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, check.id);
        assert_eq!(listed[0].client_name, "frontend");
    }

    #[tokio::test]
    async fn test_list_respects_limit() {
        let store = setup_test_db().await;

        for i in 0..5 {
            store
                .create(&StatusCheck::new(format!("client-{i}")))
                .await
                .unwrap();
        }

        assert_eq!(store.list(3).await.unwrap().len(), 3);
        assert_eq!(store.list(1000).await.unwrap().len(), 5);
    }
}
