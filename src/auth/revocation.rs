//! Token Revocation Store
//! Mission: Keep blacklisted token ids dead until their natural expiry

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rusqlite::{params, Connection};
use tracing::debug;

/// Key-value store with per-key TTL used to blacklist token ids (`jti`).
///
/// Entries self-expire: `get` never returns a value whose TTL has elapsed,
/// and no explicit delete exists. Overwriting a key resets its TTL. All
/// access is by key, so concurrent requests for unrelated tokens never
/// contend.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
}

/// Revocation storage with SQLite backend
///
/// File-backed so it can be shared by multiple server processes. Rows carry
/// an absolute expiry timestamp; expired rows read as absent and are purged
/// opportunistically on writes.
pub struct SqliteRevocationStore {
    db_path: String,
}

impl SqliteRevocationStore {
    /// Create a new revocation store and initialize its schema
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS revocations (
                jti TEXT PRIMARY KEY,
                marker TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            )",
            [],
        )
        .context("Failed to create revocations table")?;

        Ok(())
    }
}

#[async_trait]
impl RevocationStore for SqliteRevocationStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let now = Utc::now();
        let expires_at = now.timestamp_millis() + ttl.as_millis() as i64;

        let conn = Connection::open(&self.db_path)?;

        // Opportunistic purge; nothing reads expired rows anyway
        conn.execute(
            "DELETE FROM revocations WHERE expires_at <= ?1",
            params![now.timestamp_millis()],
        )?;

        conn.execute(
            "INSERT OR REPLACE INTO revocations (jti, marker, expires_at)
             VALUES (?1, ?2, ?3)",
            params![key, value, expires_at],
        )
        .context("Failed to write revocation entry")?;

        debug!("Revocation entry stored for key {key}, ttl {}s", ttl.as_secs());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = Connection::open(&self.db_path)?;

        let row: Option<(String, i64)> = match conn
            .prepare("SELECT marker, expires_at FROM revocations WHERE jti = ?1")?
            .query_row(params![key], |row| Ok((row.get(0)?, row.get(1)?)))
        {
            Ok(row) => Some(row),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        match row {
            Some((marker, expires_at)) if expires_at > Utc::now().timestamp_millis() => {
                Ok(Some(marker))
            }
            Some(_) => {
                conn.execute("DELETE FROM revocations WHERE jti = ?1", params![key])?;
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

/// In-memory revocation store for tests and single-process deployments
#[derive(Default)]
pub struct MemoryRevocationStore {
    entries: RwLock<HashMap<String, (String, DateTime<Utc>)>>,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl).context("TTL out of range")?;
        self.entries
            .write()
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let expired = match self.entries.read().get(key) {
            Some((value, expires_at)) if *expires_at > Utc::now() => {
                return Ok(Some(value.clone()));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.write().remove(key);
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_sqlite_store() -> (SqliteRevocationStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = SqliteRevocationStore::new(db_path).unwrap();
        (store, temp_file)
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (store, _temp) = create_sqlite_store();

        store
            .put("jti-1", "canceled", Duration::from_secs(60))
            .await
            .unwrap();

        let value = store.get("jti-1").await.unwrap();
        assert_eq!(value.as_deref(), Some("canceled"));
    }

    #[tokio::test]
    async fn test_get_absent_key() {
        let (store, _temp) = create_sqlite_store();
        assert!(store.get("never-stored").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entry_absent_after_ttl() {
        let (store, _temp) = create_sqlite_store();

        store
            .put("jti-short", "canceled", Duration::from_secs(1))
            .await
            .unwrap();
        assert!(store.get("jti-short").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(store.get("jti-short").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_resets_ttl() {
        let (store, _temp) = create_sqlite_store();

        store
            .put("jti-1", "canceled", Duration::from_millis(100))
            .await
            .unwrap();
        store
            .put("jti-1", "canceled", Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;

        // The second put's TTL governs
        assert!(store.get("jti-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_memory_store_expiry() {
        let store = MemoryRevocationStore::new();

        store
            .put("jti-mem", "canceled", Duration::from_millis(100))
            .await
            .unwrap();
        assert!(store.get("jti-mem").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(store.get("jti-mem").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = MemoryRevocationStore::new();

        store
            .put("jti-a", "canceled", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(store.get("jti-a").await.unwrap().is_some());
        assert!(store.get("jti-b").await.unwrap().is_none());
    }
}
