//! Wires the session pool, action engine, handle registries, persistence
//! stores, and tool surface into a single `Runtime` an agent host embeds
//! (spec §1, SPEC_FULL §4.11/§4.12). The binary in `src/main.rs` is a thin
//! CLI shell around this library.

pub mod config;
pub mod telemetry;

use browser_action_engine::{ActionEngine, NoopArtifactSink};
use browser_action_trace::ActionTrace;
use browser_persistence::{ActionLogStore, ArtifactWriter, FileActionLogStore, FileArtifactWriter, FileSessionStore, SessionStore};
use browser_resilience::{PopupDismisser, PopupDismisserConfig};
use browser_session_pool::{FakeBrowserLauncher, SessionPool, SessionPoolConfig};
use browser_tool_surface::{ApprovalConfig, RedactionConfig, ToolSurface, ToolSurfaceConfig};
use config::RuntimeConfig;
use std::sync::Arc;
use std::time::Duration;

pub struct Runtime {
    pub config: RuntimeConfig,
    pub pool: Arc<SessionPool>,
    pub engine: Arc<ActionEngine>,
    pub trace: Arc<ActionTrace>,
    pub tools: Arc<ToolSurface>,
    pub session_store: Arc<dyn SessionStore>,
}

impl Runtime {
    /// Builds every subsystem against `config`, using the in-process
    /// `FakeBrowserLauncher` (no real CDP/WebDriver client is in scope —
    /// spec's Non-goals).
    pub async fn start(config: RuntimeConfig) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&config.profiles_dir).await?;
        tokio::fs::create_dir_all(&config.artifacts_dir).await?;
        tokio::fs::create_dir_all(&config.store_path).await?;

        let pool = SessionPool::new(
            SessionPoolConfig {
                max_contexts: config.pool.max_contexts,
                profile_root: config.profiles_dir.clone(),
                health: browser_session_pool::HealthMonitorConfig {
                    interval: Duration::from_millis(config.health.interval_ms),
                    probe_timeout: Duration::from_millis(config.health.timeout_ms),
                    max_failures: config.health.max_failures,
                },
            },
            Arc::new(FakeBrowserLauncher),
        );
        pool.start_health_monitor().await;

        let trace = Arc::new(ActionTrace::new());
        let engine = Arc::new(ActionEngine::new(
            Arc::clone(&trace),
            Arc::new(PopupDismisser::new(PopupDismisserConfig::default())),
            Arc::new(NoopArtifactSink),
        ));

        let artifact_writer: Arc<dyn ArtifactWriter> =
            Arc::new(FileArtifactWriter::with_retention(config.artifacts_dir.clone(), config.max_retained_sessions));
        let action_log: Arc<dyn ActionLogStore> = Arc::new(FileActionLogStore::new(config.store_path.join("action-log")));
        let session_store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(config.store_path.join("sessions")));

        let redaction = RedactionConfig::default().with_additional_keys(config.sensitive_keys.clone());
        let tools = Arc::new(ToolSurface::new(
            Arc::clone(&pool),
            Arc::clone(&engine),
            Arc::clone(&trace),
            artifact_writer,
            action_log,
            Arc::clone(&session_store),
            None,
            ToolSurfaceConfig {
                approval: ApprovalConfig { auto_approve: config.auto_approve },
                redaction,
            },
        ));

        Ok(Self { config, pool, engine, trace, tools, session_store })
    }

    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn runtime_starts_and_serves_a_tool_call() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            profiles_dir: dir.path().join("profiles"),
            artifacts_dir: dir.path().join("artifacts"),
            store_path: dir.path().join("store"),
            log_dir: dir.path().join("logs"),
            ..RuntimeConfig::default()
        };
        let runtime = Runtime::start(config).await.unwrap();

        let opened = runtime.tools.call("open", json!({})).await.unwrap();
        let session_id = opened.details["sessionId"].as_str().unwrap().to_string();
        let navigated = runtime
            .tools
            .call("navigate", json!({"sessionId": session_id, "url": "https://example.com"}))
            .await
            .unwrap();
        assert_eq!(navigated.details["data"]["url"], "https://example.com");

        runtime.shutdown().await;
    }
}
