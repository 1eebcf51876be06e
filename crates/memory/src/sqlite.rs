//! SQLite store.
//!
//! A single `memory_records` table, append-only. Rows are read back in
//! insertion order so "later written" is well defined even when two
//! records share a timestamp.

use async_trait::async_trait;
use chrono::Utc;
use meetwise_core::error::MemoryError;
use meetwise_core::memory::{MemoryRecord, MemoryStore, SessionId};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// A persistent SQLite memory store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    ///
    /// Accepts a plain file path or a `sqlite:` URL. Pass `"sqlite::memory:"`
    /// for an in-process ephemeral database.
    pub async fn new(path: &str) -> Result<Self, MemoryError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite://{path}")
        };
        let ephemeral = url.contains(":memory:");

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| MemoryError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // Each connection to :memory: is its own database.
        let max_connections = if ephemeral { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite memory store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, MemoryError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS memory_records (
                iid          INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id   TEXT NOT NULL,
                key          TEXT NOT NULL,
                value        TEXT NOT NULL,
                extra_data   TEXT NOT NULL DEFAULT '{}',
                created_at   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("memory_records table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_memory_records_session ON memory_records(session_id, iid)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("session index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Parse a `MemoryRecord` from a SQLite row.
    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<MemoryRecord, MemoryError> {
        let key: String = row
            .try_get("key")
            .map_err(|e| MemoryError::QueryFailed(format!("key column: {e}")))?;
        let value: String = row
            .try_get("value")
            .map_err(|e| MemoryError::QueryFailed(format!("value column: {e}")))?;
        let extra_json: String = row
            .try_get("extra_data")
            .map_err(|e| MemoryError::QueryFailed(format!("extra_data column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| MemoryError::QueryFailed(format!("created_at column: {e}")))?;

        // Metadata is open-ended; a corrupt blob reads as empty rather than failing the query.
        let extra_data = match serde_json::from_str::<serde_json::Value>(&extra_json) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => {
                warn!(key = %key, "Ignoring non-object extra_data");
                serde_json::Map::new()
            }
        };

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| MemoryError::QueryFailed(format!("created_at value: {e}")))?;

        Ok(MemoryRecord {
            key,
            value,
            extra_data,
            created_at,
        })
    }

    /// Number of records stored for a session.
    pub async fn count(&self, session: &SessionId) -> Result<usize, MemoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM memory_records WHERE session_id = ?")
            .bind(session.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(e.to_string()))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| MemoryError::QueryFailed(e.to_string()))?;
        Ok(n as usize)
    }
}

#[async_trait]
impl MemoryStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn query(&self, session: &SessionId) -> Result<Vec<MemoryRecord>, MemoryError> {
        let rows = sqlx::query(
            "SELECT key, value, extra_data, created_at FROM memory_records \
             WHERE session_id = ? ORDER BY iid ASC",
        )
        .bind(session.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn append(&self, session: &SessionId, record: MemoryRecord) -> Result<(), MemoryError> {
        let extra_json = serde_json::to_string(&record.extra_data)
            .map_err(|e| MemoryError::Storage(format!("extra_data encode: {e}")))?;

        sqlx::query(
            "INSERT INTO memory_records (session_id, key, value, extra_data, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session.as_str())
        .bind(&record.key)
        .bind(&record.value)
        .bind(extra_json)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(e.to_string()))?;

        debug!(session = %session, key = %record.key, "Appended memory record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn test_store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn append_and_query_round_trip() {
        let store = test_store().await;
        let session = SessionId::new("alice");
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let record = MemoryRecord::new("interaction:summarization", "Q3 planning recap")
            .with_extra("tool_used", "summarization")
            .with_extra("response_length", 42)
            .at(at);

        store.append(&session, record.clone()).await.unwrap();

        let records = store.query(&session).await.unwrap();
        assert_eq!(records, vec![record]);
    }

    #[tokio::test]
    async fn query_preserves_write_order() {
        let store = test_store().await;
        let session = SessionId::default();
        let at = Utc::now();
        for value in ["one", "two", "three"] {
            store
                .append(&session, MemoryRecord::new("k", value).at(at))
                .await
                .unwrap();
        }

        let values: Vec<String> = store
            .query(&session)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.value)
            .collect();
        assert_eq!(values, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = test_store().await;
        store
            .append(&SessionId::new("alice"), MemoryRecord::new("k", "v"))
            .await
            .unwrap();
        assert!(store.query(&SessionId::new("bob")).await.unwrap().is_empty());
        assert_eq!(store.count(&SessionId::new("alice")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.db");
        let path = path.to_string_lossy().to_string();
        let session = SessionId::new("alice");

        {
            let store = SqliteStore::new(&path).await.unwrap();
            store
                .append(&session, MemoryRecord::new("user_preferences", "prefers bullet points"))
                .await
                .unwrap();
        }

        let reopened = SqliteStore::new(&path).await.unwrap();
        let records = reopened.query(&session).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "user_preferences");
    }

    #[tokio::test]
    async fn store_name() {
        assert_eq!(test_store().await.name(), "sqlite");
    }
}
