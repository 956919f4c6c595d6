//! Profile-directory validation and snapshot persistence (spec §4.8).

use browser_core_types::RuntimeError;
use browser_session::SessionSnapshot;
use std::path::{Path, PathBuf};

const SNAPSHOT_FILE: &str = "session-snapshot.json";

/// Rejects anything but `^[A-Za-z0-9_-]+$`, which also rejects path
/// traversal (`..`, `/`) since those characters aren't in the allow-list.
pub fn validate_profile_name(name: &str) -> Result<(), RuntimeError> {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        Ok(())
    } else {
        Err(RuntimeError::other(format!("invalid profile name: {name}")))
    }
}

pub fn profile_dir(root: &Path, profile: &str) -> PathBuf {
    root.join(profile)
}

pub async fn ensure_profile_dir(root: &Path, profile: &str) -> Result<PathBuf, RuntimeError> {
    validate_profile_name(profile)?;
    let dir = profile_dir(root, profile);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| RuntimeError::other(e.to_string()))?;
    Ok(dir)
}

pub async fn load_snapshot(dir: &Path) -> Option<SessionSnapshot> {
    let path = dir.join(SNAPSHOT_FILE);
    let content = tokio::fs::read_to_string(path).await.ok()?;
    serde_json::from_str(&content).ok()
}

pub async fn save_snapshot(dir: &Path, snapshot: &SessionSnapshot) -> Result<(), RuntimeError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| RuntimeError::other(e.to_string()))?;
    let json = serde_json::to_string_pretty(snapshot).map_err(|e| RuntimeError::other(e.to_string()))?;
    tokio::fs::write(dir.join(SNAPSHOT_FILE), json)
        .await
        .map_err(|e| RuntimeError::other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_traversal() {
        assert!(validate_profile_name("../etc").is_err());
        assert!(validate_profile_name("a/b").is_err());
        assert!(validate_profile_name("").is_err());
    }

    #[test]
    fn accepts_plain_names() {
        assert!(validate_profile_name("work-profile_1").is_ok());
    }

    #[tokio::test]
    async fn snapshot_roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = SessionSnapshot {
            session_id: "s1".to_string(),
            url: "https://example.com".to_string(),
            cookies: vec![],
            local_storage: Default::default(),
            timestamp: chrono::Utc::now(),
        };
        save_snapshot(dir.path(), &snapshot).await.unwrap();
        let loaded = load_snapshot(dir.path()).await.unwrap();
        assert_eq!(loaded.url, "https://example.com");
    }
}
