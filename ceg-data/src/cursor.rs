use crate::error::IngestError;
use async_trait::async_trait;
use ceg_core::source::Cursor;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Per-source cursor record as persisted to disk (§6 "Persisted state").
/// Updated only after a batch is fully committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorRecord {
    pub source_code: SmolStr,
    pub last_external_id: Option<SmolStr>,
    pub last_timestamp: Option<chrono::DateTime<chrono::Utc>>,
    pub backfill_completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl CursorRecord {
    pub fn from_cursor(source_code: SmolStr, cursor: &Cursor) -> Self {
        Self {
            source_code,
            last_external_id: cursor.last_external_id.clone(),
            last_timestamp: cursor.last_timestamp,
            backfill_completed_at: cursor.backfill_completed_at,
        }
    }

    pub fn as_cursor(&self) -> Cursor {
        Cursor {
            last_external_id: self.last_external_id.clone(),
            last_timestamp: self.last_timestamp,
            backfill_completed_at: self.backfill_completed_at,
        }
    }
}

/// Durable cursor storage, keyed by source code. Implementations must only
/// persist a cursor once its batch has been fully committed (ordering
/// guarantee, §5).
#[async_trait]
pub trait CursorStore: Send + Sync {
    async fn load(&self, source_code: &str) -> Result<Option<Cursor>, IngestError>;
    async fn save(&self, source_code: &str, cursor: &Cursor) -> Result<(), IngestError>;
}

/// File-backed [`CursorStore`]: one JSON file holding a map of
/// `source_code → CursorRecord`, replaced atomically (write-to-temp +
/// rename) on every save, matching the learned-alias persistence scheme in
/// §6.
#[derive(Debug)]
pub struct FileCursorStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    fn read_all(path: &Path) -> Result<HashMap<SmolStr, CursorRecord>, IngestError> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let data = std::fs::read_to_string(path)
            .map_err(|error| IngestError::CursorPersist(error.to_string()))?;
        if data.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&data).map_err(|error| IngestError::CursorPersist(error.to_string()))
    }

    fn write_all(path: &Path, data: &HashMap<SmolStr, CursorRecord>) -> Result<(), IngestError> {
        let tmp_path = path.with_extension("tmp");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|error| IngestError::CursorPersist(error.to_string()))?;
        }
        let serialized = serde_json::to_string_pretty(data)
            .map_err(|error| IngestError::CursorPersist(error.to_string()))?;
        std::fs::write(&tmp_path, serialized)
            .map_err(|error| IngestError::CursorPersist(error.to_string()))?;
        std::fs::rename(&tmp_path, path)
            .map_err(|error| IngestError::CursorPersist(error.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl CursorStore for FileCursorStore {
    async fn load(&self, source_code: &str) -> Result<Option<Cursor>, IngestError> {
        let _guard = self.guard.lock().await;
        let all = Self::read_all(&self.path)?;
        Ok(all.get(source_code).map(CursorRecord::as_cursor))
    }

    async fn save(&self, source_code: &str, cursor: &Cursor) -> Result<(), IngestError> {
        let _guard = self.guard.lock().await;
        let mut all = Self::read_all(&self.path)?;
        all.insert(
            source_code.into(),
            CursorRecord::from_cursor(source_code.into(), cursor),
        );
        Self::write_all(&self.path, &all)
    }
}

/// In-memory [`CursorStore`], used in tests and for sources that do not need
/// cross-run resumability.
#[derive(Debug, Default)]
pub struct InMemoryCursorStore {
    state: Mutex<HashMap<SmolStr, Cursor>>,
}

#[async_trait]
impl CursorStore for InMemoryCursorStore {
    async fn load(&self, source_code: &str) -> Result<Option<Cursor>, IngestError> {
        Ok(self.state.lock().await.get(source_code).cloned())
    }

    async fn save(&self, source_code: &str, cursor: &Cursor) -> Result<(), IngestError> {
        self.state
            .lock()
            .await
            .insert(source_code.into(), cursor.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_round_trips() {
        let store = InMemoryCursorStore::default();
        assert!(store.load("reuters").await.unwrap().is_none());

        let cursor = Cursor {
            last_external_id: Some("abc123".into()),
            last_timestamp: Some(chrono::Utc::now()),
            backfill_completed_at: None,
        };
        store.save("reuters", &cursor).await.unwrap();
        assert_eq!(store.load("reuters").await.unwrap(), Some(cursor));
    }

    #[tokio::test]
    async fn file_store_persists_across_instances() {
        let dir = std::env::temp_dir().join(format!("ceg-cursor-test-{}", std::process::id()));
        let path = dir.join("cursors.json");

        let cursor = Cursor {
            last_external_id: Some("ext-1".into()),
            last_timestamp: None,
            backfill_completed_at: None,
        };

        {
            let store = FileCursorStore::new(&path);
            store.save("moex_news", &cursor).await.unwrap();
        }

        let store2 = FileCursorStore::new(&path);
        assert_eq!(store2.load("moex_news").await.unwrap(), Some(cursor));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
