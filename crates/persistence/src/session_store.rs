//! Session-record CRUD (spec §1's "session-record CRUD" collaborator).

use crate::types::{SessionRecord, SessionStatus};
use async_trait::async_trait;
use browser_core_types::RuntimeError;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, record: SessionRecord) -> Result<(), RuntimeError>;
    async fn get(&self, id: &str) -> Result<Option<SessionRecord>, RuntimeError>;
    async fn delete(&self, id: &str) -> Result<(), RuntimeError>;
    async fn list(&self) -> Result<Vec<SessionRecord>, RuntimeError>;

    /// Transitions an existing record to `status`, bumping `updated_at`.
    /// A no-op (`Ok(())`) if no record is stored under `id`.
    async fn update_status(&self, id: &str, status: SessionStatus) -> Result<(), RuntimeError> {
        if let Some(mut record) = self.get(id).await? {
            record.status = status;
            record.updated_at = chrono::Utc::now();
            self.put(record).await?;
        }
        Ok(())
    }

    /// Stashes a JSON-encoded snapshot on the record (spec §6), bumping
    /// `updated_at`. A no-op if no record is stored under `id`.
    async fn save_snapshot(&self, id: &str, snapshot: serde_json::Value) -> Result<(), RuntimeError> {
        if let Some(mut record) = self.get(id).await? {
            record.snapshot = Some(snapshot);
            record.updated_at = chrono::Utc::now();
            self.put(record).await?;
        }
        Ok(())
    }

    async fn list_by_status(&self, status: SessionStatus) -> Result<Vec<SessionRecord>, RuntimeError> {
        Ok(self.list().await?.into_iter().filter(|r| r.status == status).collect())
    }

    /// Transitions every `active` record to `suspended` (spec §6).
    async fn suspend_all(&self) -> Result<(), RuntimeError> {
        for record in self.list_by_status(SessionStatus::Active).await? {
            self.update_status(&record.id, SessionStatus::Suspended).await?;
        }
        Ok(())
    }

    /// Transitions every non-closed record to `closed` (spec §6).
    async fn close_all(&self) -> Result<(), RuntimeError> {
        for record in self.list().await? {
            if record.status != SessionStatus::Closed {
                self.update_status(&record.id, SessionStatus::Closed).await?;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySessionStore {
    records: RwLock<HashMap<String, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, record: SessionRecord) -> Result<(), RuntimeError> {
        self.records.write().await.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<SessionRecord>, RuntimeError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<(), RuntimeError> {
        self.records.write().await.remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SessionRecord>, RuntimeError> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}

pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn put(&self, record: SessionRecord) -> Result<(), RuntimeError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RuntimeError::other(e.to_string()))?;
        let json = serde_json::to_string_pretty(&record).map_err(|e| RuntimeError::other(e.to_string()))?;
        tokio::fs::write(self.path_for(&record.id), json)
            .await
            .map_err(|e| RuntimeError::other(e.to_string()))
    }

    async fn get(&self, id: &str) -> Result<Option<SessionRecord>, RuntimeError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RuntimeError::other(e.to_string()))?;
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| RuntimeError::other(e.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<(), RuntimeError> {
        let path = self.path_for(id);
        if path.exists() {
            tokio::fs::remove_file(path)
                .await
                .map_err(|e| RuntimeError::other(e.to_string()))?;
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SessionRecord>, RuntimeError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| RuntimeError::other(e.to_string()))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RuntimeError::other(e.to_string()))?
        {
            if entry.path().extension() == Some(std::ffi::OsStr::new("json")) {
                if let Ok(json) = tokio::fs::read_to_string(entry.path()).await {
                    if let Ok(record) = serde_json::from_str(&json) {
                        out.push(record);
                    }
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(id: &str) -> SessionRecord {
        SessionRecord {
            id: id.to_string(),
            profile: None,
            status: SessionStatus::Active,
            last_url: None,
            snapshot: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn in_memory_roundtrip() {
        let store = InMemorySessionStore::new();
        store.put(sample("s1")).await.unwrap();
        assert!(store.get("s1").await.unwrap().is_some());
        store.delete("s1").await.unwrap();
        assert!(store.get("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf());
        store.put(sample("s1")).await.unwrap();
        let fetched = store.get("s1").await.unwrap().unwrap();
        assert_eq!(fetched.id, "s1");
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_status_transitions_an_existing_record() {
        let store = InMemorySessionStore::new();
        store.put(sample("s1")).await.unwrap();
        store.update_status("s1", SessionStatus::Closed).await.unwrap();
        let fetched = store.get("s1").await.unwrap().unwrap();
        assert_eq!(fetched.status, SessionStatus::Closed);
    }

    #[tokio::test]
    async fn update_status_on_unknown_id_is_a_no_op() {
        let store = InMemorySessionStore::new();
        store.update_status("missing", SessionStatus::Suspended).await.unwrap();
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_snapshot_attaches_json_to_the_record() {
        let store = InMemorySessionStore::new();
        store.put(sample("s1")).await.unwrap();
        store.save_snapshot("s1", serde_json::json!({"url": "https://example.com"})).await.unwrap();
        let fetched = store.get("s1").await.unwrap().unwrap();
        assert_eq!(fetched.snapshot, Some(serde_json::json!({"url": "https://example.com"})));
    }

    #[tokio::test]
    async fn list_by_status_filters_to_matching_records() {
        let store = InMemorySessionStore::new();
        store.put(sample("s1")).await.unwrap();
        store.put(sample("s2")).await.unwrap();
        store.update_status("s2", SessionStatus::Closed).await.unwrap();
        let active = store.list_by_status(SessionStatus::Active).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "s1");
    }

    #[tokio::test]
    async fn suspend_all_only_touches_active_records() {
        let store = InMemorySessionStore::new();
        store.put(sample("s1")).await.unwrap();
        store.put(sample("s2")).await.unwrap();
        store.update_status("s2", SessionStatus::Closed).await.unwrap();
        store.suspend_all().await.unwrap();
        assert_eq!(store.get("s1").await.unwrap().unwrap().status, SessionStatus::Suspended);
        assert_eq!(store.get("s2").await.unwrap().unwrap().status, SessionStatus::Closed);
    }

    #[tokio::test]
    async fn close_all_transitions_every_non_closed_record() {
        let store = InMemorySessionStore::new();
        store.put(sample("s1")).await.unwrap();
        store.update_status("s1", SessionStatus::Suspended).await.unwrap();
        store.put(sample("s2")).await.unwrap();
        store.close_all().await.unwrap();
        assert_eq!(store.get("s1").await.unwrap().unwrap().status, SessionStatus::Closed);
        assert_eq!(store.get("s2").await.unwrap().unwrap().status, SessionStatus::Closed);
    }
}
