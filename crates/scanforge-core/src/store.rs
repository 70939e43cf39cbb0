//! Session store
//!
//! SQLite-backed persistence for scan sessions, keyed by session id. The
//! core only needs create/read/merge on single records; SQLite's per-row
//! atomicity is the only transactional guarantee relied on.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::session::{ScanSession, ScanStatus};

/// Partial update merged into an existing session record
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    /// New lifecycle status
    pub status: Option<ScanStatus>,
    /// Final combined output
    pub output: Option<String>,
    /// Terminal timestamp
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionPatch {
    /// Create an empty patch
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the status field
    #[must_use]
    pub fn status(mut self, status: ScanStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the output field
    #[must_use]
    pub fn output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Set the terminal timestamp
    #[must_use]
    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }
}

/// SQLite-backed store for scan sessions
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    /// Create a new session store with the given database pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scan_sessions (
                id TEXT PRIMARY KEY,
                model_name TEXT NOT NULL,
                environment TEXT NOT NULL,
                tool TEXT NOT NULL,
                probe TEXT NOT NULL,
                status TEXT NOT NULL,
                output TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                completed_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_scan_sessions_status ON scan_sessions(status);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Persist a new session; the id must not already exist
    pub async fn create(&self, session: &ScanSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO scan_sessions
            (id, model_name, environment, tool, probe, status, output, created_at, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(session.id.to_string())
        .bind(&session.model_name)
        .bind(&session.environment)
        .bind(&session.tool)
        .bind(&session.probe)
        .bind(session.status.as_str())
        .bind(&session.output)
        .bind(session.created_at.to_rfc3339())
        .bind(session.completed_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch the full session record
    pub async fn get(&self, id: Uuid) -> Result<ScanSession> {
        let row = sqlx::query(
            r#"
            SELECT id, model_name, environment, tool, probe, status, output,
                   created_at, completed_at
            FROM scan_sessions
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => session_from_row(&row),
            None => Err(Error::SessionNotFound(id)),
        }
    }

    /// Merge the given fields into an existing record
    pub async fn update(&self, id: Uuid, patch: SessionPatch) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE scan_sessions
            SET status = COALESCE(?, status),
                output = COALESCE(?, output),
                completed_at = COALESCE(?, completed_at)
            WHERE id = ?
            "#,
        )
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.output)
        .bind(patch.completed_at.map(|t| t.to_rfc3339()))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::SessionNotFound(id));
        }
        Ok(())
    }
}

fn session_from_row(row: &SqliteRow) -> Result<ScanSession> {
    let id: String = row.get("id");
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");
    let completed_at: Option<String> = row.get("completed_at");

    Ok(ScanSession {
        id: Uuid::parse_str(&id).map_err(|e| Error::Database(e.to_string()))?,
        model_name: row.get("model_name"),
        environment: row.get("environment"),
        tool: row.get("tool"),
        probe: row.get("probe"),
        status: status.parse()?,
        output: row.get("output"),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        completed_at: completed_at
            .and_then(|t| DateTime::parse_from_rfc3339(&t).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    })
}
