//! The health-monitored browser session pool (spec §4.8): admission,
//! lazy deduped launch, profile restore/persist, and identity-preserving
//! auto-recovery.

mod health;
mod launcher;
mod pool;
mod profile;
mod types;

pub use health::{HealthMonitor, HealthMonitorConfig};
pub use launcher::{BrowserLauncher, FakeBrowserLauncher};
pub use pool::{SessionPool, SessionPoolConfig};
pub use profile::validate_profile_name;
pub use types::AcquireOptions;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config(root: &std::path::Path) -> SessionPoolConfig {
        SessionPoolConfig {
            max_contexts: 2,
            profile_root: root.to_path_buf(),
            health: HealthMonitorConfig {
                interval: Duration::from_millis(25),
                probe_timeout: Duration::from_millis(200),
                max_failures: 2,
            },
        }
    }

    #[tokio::test]
    async fn acquire_rejects_past_max_contexts() {
        let dir = tempfile::tempdir().unwrap();
        let pool = SessionPool::new(test_config(dir.path()), std::sync::Arc::new(FakeBrowserLauncher));
        pool.acquire(AcquireOptions::default()).await.unwrap();
        pool.acquire(AcquireOptions::default()).await.unwrap();
        let err = pool.acquire(AcquireOptions::default()).await.unwrap_err();
        assert!(err.to_string().contains("pool limit reached"));
    }

    #[tokio::test]
    async fn release_of_profile_session_persists_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let pool = SessionPool::new(test_config(dir.path()), std::sync::Arc::new(FakeBrowserLauncher));
        let session = pool
            .acquire(AcquireOptions {
                profile: Some("work".to_string()),
                url: Some("https://example.com".to_string()),
            })
            .await
            .unwrap();
        let id = session.id().clone();
        pool.release(&id).await.unwrap();
        let snapshot_path = dir.path().join("work").join("session-snapshot.json");
        assert!(snapshot_path.exists());
    }

    #[tokio::test]
    async fn acquire_rejects_path_traversal_profile() {
        let dir = tempfile::tempdir().unwrap();
        let pool = SessionPool::new(test_config(dir.path()), std::sync::Arc::new(FakeBrowserLauncher));
        let err = pool
            .acquire(AcquireOptions {
                profile: Some("../escape".to_string()),
                url: None,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid profile name"));
    }

    #[tokio::test]
    async fn unhealthy_session_is_recovered_with_same_id() {
        let dir = tempfile::tempdir().unwrap();
        let pool = SessionPool::new(test_config(dir.path()), std::sync::Arc::new(FakeBrowserLauncher));
        let session = pool.acquire(AcquireOptions::default()).await.unwrap();
        let id = session.id().clone();
        pool.start_health_monitor().await;

        session.page().close().await.unwrap();
        // Health probes against a closed page fail; after max_failures
        // consecutive misses the session is replaced but keeps its id.
        tokio::time::sleep(Duration::from_millis(300)).await;

        let recovered = pool.get(&id).expect("session still tracked under same id");
        assert_eq!(recovered.id(), &id);
        pool.shutdown().await;
    }
}
