//! An append-only action log (spec §1's "append-only action log").

use crate::types::ActionLogEntry;
use async_trait::async_trait;
use browser_core_types::RuntimeError;
use std::path::PathBuf;
use tokio::sync::Mutex;

#[async_trait]
pub trait ActionLogStore: Send + Sync {
    async fn append(&self, entry: ActionLogEntry) -> Result<(), RuntimeError>;
    async fn for_session(&self, session_id: &str) -> Result<Vec<ActionLogEntry>, RuntimeError>;

    /// The `limit` most recent entries across every session (spec §6).
    async fn recent(&self, limit: usize) -> Result<Vec<ActionLogEntry>, RuntimeError>;

    /// The `limit` most recent entries for one session.
    async fn for_session_limit(&self, session_id: &str, limit: usize) -> Result<Vec<ActionLogEntry>, RuntimeError> {
        let mut entries = self.for_session(session_id).await?;
        if entries.len() > limit {
            entries = entries.split_off(entries.len() - limit);
        }
        Ok(entries)
    }

    async fn count_for_session(&self, session_id: &str) -> Result<usize, RuntimeError> {
        Ok(self.for_session(session_id).await?.len())
    }

    async fn failures_for_session(&self, session_id: &str) -> Result<Vec<ActionLogEntry>, RuntimeError> {
        Ok(self.for_session(session_id).await?.into_iter().filter(|e| !e.ok).collect())
    }
}

fn sort_recent(mut entries: Vec<ActionLogEntry>, limit: usize) -> Vec<ActionLogEntry> {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    entries.truncate(limit);
    entries
}

#[derive(Default)]
pub struct InMemoryActionLogStore {
    entries: Mutex<Vec<ActionLogEntry>>,
}

impl InMemoryActionLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActionLogStore for InMemoryActionLogStore {
    async fn append(&self, entry: ActionLogEntry) -> Result<(), RuntimeError> {
        self.entries.lock().await.push(entry);
        Ok(())
    }

    async fn for_session(&self, session_id: &str) -> Result<Vec<ActionLogEntry>, RuntimeError> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ActionLogEntry>, RuntimeError> {
        Ok(sort_recent(self.entries.lock().await.clone(), limit))
    }
}

/// One JSON Lines file per session; append is an O(1) file write.
pub struct FileActionLogStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileActionLogStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            write_lock: Mutex::new(()),
        }
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.jsonl"))
    }
}

#[async_trait]
impl ActionLogStore for FileActionLogStore {
    async fn append(&self, entry: ActionLogEntry) -> Result<(), RuntimeError> {
        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RuntimeError::other(e.to_string()))?;
        let mut line = serde_json::to_string(&entry).map_err(|e| RuntimeError::other(e.to_string()))?;
        line.push('\n');
        use tokio::io::AsyncWriteExt;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(&entry.session_id))
            .await
            .map_err(|e| RuntimeError::other(e.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| RuntimeError::other(e.to_string()))
    }

    async fn for_session(&self, session_id: &str) -> Result<Vec<ActionLogEntry>, RuntimeError> {
        let path = self.path_for(session_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RuntimeError::other(e.to_string()))?;
        Ok(content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }

    /// One log is one file per session, so `recent` has to read every
    /// `*.jsonl` file in the directory before it can merge-sort globally.
    async fn recent(&self, limit: usize) -> Result<Vec<ActionLogEntry>, RuntimeError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut all = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| RuntimeError::other(e.to_string()))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RuntimeError::other(e.to_string()))?
        {
            if entry.path().extension() == Some(std::ffi::OsStr::new("jsonl")) {
                if let Ok(content) = tokio::fs::read_to_string(entry.path()).await {
                    all.extend(content.lines().filter_map(|line| serde_json::from_str(line).ok()));
                }
            }
        }
        Ok(sort_recent(all, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(session_id: &str) -> ActionLogEntry {
        sample_at(session_id, "a1", true, Utc::now())
    }

    fn sample_at(session_id: &str, id: &str, ok: bool, created_at: chrono::DateTime<Utc>) -> ActionLogEntry {
        ActionLogEntry {
            id: id.to_string(),
            session_id: session_id.to_string(),
            action: "click".to_string(),
            selector: Some("#go".to_string()),
            input: None,
            ok,
            error_code: if ok { None } else { Some("TARGET_NOT_FOUND".to_string()) },
            screenshot_path: None,
            duration_ms: 12,
            retries: 0,
            created_at,
        }
    }

    #[tokio::test]
    async fn in_memory_filters_by_session() {
        let store = InMemoryActionLogStore::new();
        store.append(sample("s1")).await.unwrap();
        store.append(sample("s2")).await.unwrap();
        assert_eq!(store.for_session("s1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn file_store_appends_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileActionLogStore::new(dir.path().to_path_buf());
        store.append(sample("s1")).await.unwrap();
        store.append(sample("s1")).await.unwrap();
        assert_eq!(store.for_session("s1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn for_session_limit_keeps_only_the_newest_entries() {
        let store = InMemoryActionLogStore::new();
        let base = Utc::now();
        for i in 0..5u32 {
            store.append(sample_at("s1", &format!("a{i}"), true, base + chrono::Duration::seconds(i as i64))).await.unwrap();
        }
        let newest_two = store.for_session_limit("s1", 2).await.unwrap();
        assert_eq!(newest_two.len(), 2);
        assert_eq!(newest_two[0].id, "a3");
        assert_eq!(newest_two[1].id, "a4");
    }

    #[tokio::test]
    async fn count_and_failures_for_session() {
        let store = InMemoryActionLogStore::new();
        let base = Utc::now();
        store.append(sample_at("s1", "a0", true, base)).await.unwrap();
        store.append(sample_at("s1", "a1", false, base + chrono::Duration::seconds(1))).await.unwrap();
        store.append(sample_at("s1", "a2", false, base + chrono::Duration::seconds(2))).await.unwrap();

        assert_eq!(store.count_for_session("s1").await.unwrap(), 3);
        let failures = store.failures_for_session("s1").await.unwrap();
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().all(|e| !e.ok));
    }

    #[tokio::test]
    async fn in_memory_recent_sorts_newest_first_across_sessions() {
        let store = InMemoryActionLogStore::new();
        let base = Utc::now();
        store.append(sample_at("s1", "a0", true, base)).await.unwrap();
        store.append(sample_at("s2", "a1", true, base + chrono::Duration::seconds(5))).await.unwrap();
        store.append(sample_at("s1", "a2", true, base + chrono::Duration::seconds(10))).await.unwrap();

        let recent = store.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, "a2");
        assert_eq!(recent[1].id, "a1");
    }

    #[tokio::test]
    async fn file_store_recent_merges_across_session_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileActionLogStore::new(dir.path().to_path_buf());
        let base = Utc::now();
        store.append(sample_at("s1", "a0", true, base)).await.unwrap();
        store.append(sample_at("s2", "a1", true, base + chrono::Duration::seconds(5))).await.unwrap();

        let recent = store.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, "a1");
        assert_eq!(recent[1].id, "a0");
    }
}
