//! Screenshot/PDF artifact persistence, laid out as
//! `{baseDir}/{sessionId}/{epochMs}-{label}.{ext}` with retention over the
//! number of session subdirectories kept (spec §6).

use async_trait::async_trait;
use browser_core_types::RuntimeError;
use std::path::PathBuf;
use tokio::sync::Mutex;

#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    /// Writes `bytes` under `session_id`'s artifact directory and returns
    /// the path (or key) it was written under.
    async fn write(&self, session_id: &str, bytes: Vec<u8>, label: &str, extension: &str, epoch_ms: u64) -> Result<String, RuntimeError>;
}

fn validate_session_id(session_id: &str) -> Result<(), RuntimeError> {
    if !session_id.is_empty() && session_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        Ok(())
    } else {
        Err(RuntimeError::other(format!("invalid session id for artifact path: {session_id}")))
    }
}

pub struct FileArtifactWriter {
    dir: PathBuf,
    max_retained_sessions: usize,
}

impl FileArtifactWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self::with_retention(dir, 100)
    }

    pub fn with_retention(dir: PathBuf, max_retained_sessions: usize) -> Self {
        Self { dir, max_retained_sessions }
    }

    /// Deletes the oldest session subdirectories (by modified time) once
    /// there are more than `max_retained_sessions` of them.
    async fn enforce_retention(&self) -> Result<(), RuntimeError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| RuntimeError::other(e.to_string()))?;
        let mut dirs = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| RuntimeError::other(e.to_string()))? {
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                let modified = entry.metadata().await.ok().and_then(|m| m.modified().ok());
                dirs.push((entry.path(), modified));
            }
        }
        if dirs.len() <= self.max_retained_sessions {
            return Ok(());
        }
        dirs.sort_by_key(|(_, modified)| *modified);
        let excess = dirs.len() - self.max_retained_sessions;
        for (path, _) in dirs.into_iter().take(excess) {
            let _ = tokio::fs::remove_dir_all(path).await;
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactWriter for FileArtifactWriter {
    async fn write(&self, session_id: &str, bytes: Vec<u8>, label: &str, extension: &str, epoch_ms: u64) -> Result<String, RuntimeError> {
        validate_session_id(session_id)?;
        let session_dir = self.dir.join(session_id);
        tokio::fs::create_dir_all(&session_dir)
            .await
            .map_err(|e| RuntimeError::other(e.to_string()))?;
        let filename = format!("{epoch_ms}-{label}.{extension}");
        let path = session_dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| RuntimeError::other(e.to_string()))?;
        self.enforce_retention().await?;
        Ok(path.to_string_lossy().into_owned())
    }
}

/// Records writes in memory; used by tests that assert an artifact was
/// produced without touching the filesystem.
#[derive(Default)]
pub struct InMemoryArtifactWriter {
    pub written: Mutex<Vec<String>>,
}

impl InMemoryArtifactWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactWriter for InMemoryArtifactWriter {
    async fn write(&self, session_id: &str, _bytes: Vec<u8>, label: &str, extension: &str, epoch_ms: u64) -> Result<String, RuntimeError> {
        validate_session_id(session_id)?;
        let key = format!("{session_id}/{epoch_ms}-{label}.{extension}");
        self.written.lock().await.push(key.clone());
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_writer_nests_under_session_and_names_by_epoch_and_label() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileArtifactWriter::new(dir.path().to_path_buf());
        let path = writer.write("sess-1", vec![1, 2, 3], "click-failure", "png", 1000).await.unwrap();
        assert!(path.contains("sess-1") && path.ends_with("1000-click-failure.png"));
    }

    #[tokio::test]
    async fn file_writer_rejects_path_breakout_session_ids() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileArtifactWriter::new(dir.path().to_path_buf());
        let err = writer.write("../escape", vec![1], "x", "png", 1).await.unwrap_err();
        assert!(err.to_string().contains("invalid session id"));
    }

    #[tokio::test]
    async fn file_writer_prunes_oldest_sessions_past_retention() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileArtifactWriter::with_retention(dir.path().to_path_buf(), 2);
        for i in 0..4 {
            writer.write(&format!("sess-{i}"), vec![0], "shot", "png", i as u64).await.unwrap();
        }
        let remaining = tokio::fs::read_dir(dir.path()).await.unwrap();
        let count = tokio_stream_count(remaining).await;
        assert!(count <= 2);
    }

    async fn tokio_stream_count(mut entries: tokio::fs::ReadDir) -> usize {
        let mut count = 0;
        while entries.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        count
    }
}
