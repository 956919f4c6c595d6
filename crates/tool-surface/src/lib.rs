//! The agent-facing tool surface: 26 `browser_*` tools dispatched onto the
//! session pool, action engine, handle registries, and persistence stores
//! (spec §6).

mod approval;
mod args;
mod outcome;
mod redaction;
mod surface;

pub use approval::{resolve_approval, ApprovalConfig, ApprovalProvider};
pub use outcome::{ToolContent, ToolOutcome};
pub use redaction::{redact_input, RedactionConfig};
pub use surface::{ToolSurface, ToolSurfaceConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use browser_action_engine::{ActionEngine, NoopArtifactSink};
    use browser_action_trace::ActionTrace;
    use browser_persistence::{InMemoryActionLogStore, InMemorySessionStore, SessionStore};
    use browser_resilience::{PopupDismisser, PopupDismisserConfig};
    use browser_session_pool::{FakeBrowserLauncher, SessionPool, SessionPoolConfig};
    use serde_json::json;
    use std::sync::Arc;

    fn surface(dir: &std::path::Path) -> Arc<ToolSurface> {
        let pool = SessionPool::new(
            SessionPoolConfig {
                profile_root: dir.to_path_buf(),
                ..SessionPoolConfig::default()
            },
            Arc::new(FakeBrowserLauncher),
        );
        let trace = Arc::new(ActionTrace::new());
        let engine = Arc::new(ActionEngine::new(
            Arc::clone(&trace),
            Arc::new(PopupDismisser::new(PopupDismisserConfig::default())),
            Arc::new(NoopArtifactSink),
        ));
        Arc::new(ToolSurface::new(
            pool,
            engine,
            trace,
            Arc::new(browser_persistence::InMemoryArtifactWriter::new()),
            Arc::new(InMemoryActionLogStore::new()),
            Arc::new(InMemorySessionStore::new()),
            None,
            ToolSurfaceConfig::default(),
        ))
    }

    #[tokio::test]
    async fn open_then_navigate_then_close() {
        let dir = tempfile::tempdir().unwrap();
        let surface = surface(dir.path());

        let opened = surface.call("open", json!({})).await.unwrap();
        let session_id = opened.details["sessionId"].as_str().unwrap().to_string();

        let navigated = surface
            .call("navigate", json!({"sessionId": session_id, "url": "https://example.com"}))
            .await
            .unwrap();
        assert_eq!(navigated.details["data"]["url"], "https://example.com");

        let closed = surface.call("close", json!({"sessionId": session_id})).await.unwrap();
        assert_eq!(closed.details["closed"], true);
    }

    #[tokio::test]
    async fn wait_requires_exactly_one_of_selector_or_condition() {
        let dir = tempfile::tempdir().unwrap();
        let surface = surface(dir.path());
        let opened = surface.call("open", json!({})).await.unwrap();
        let session_id = opened.details["sessionId"].as_str().unwrap().to_string();

        let err = surface.call("wait", json!({"sessionId": session_id})).await.unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[tokio::test]
    async fn request_approval_defaults_to_false() {
        std::env::remove_var("BROWSER_AUTO_APPROVE");
        let dir = tempfile::tempdir().unwrap();
        let surface = surface(dir.path());
        let result = surface
            .call("request_approval", json!({"sessionId": "s1", "message": "allow?"}))
            .await
            .unwrap();
        assert_eq!(result.details["approved"], false);
    }

    /// A freshly-opened session's `BrowserSession::last_snapshot()` is `None`
    /// until something calls `snapshot`/`restore` on that in-memory object —
    /// the same state a session is left in after the pool's crash recovery
    /// swaps in a replacement `BrowserSession` under the old id. `restore`
    /// must fall back to whatever was last persisted to the session store
    /// rather than erroring out.
    #[tokio::test]
    async fn restore_falls_back_to_persisted_snapshot_when_session_has_no_in_memory_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let session_store = Arc::new(InMemorySessionStore::new());
        let pool = SessionPool::new(
            SessionPoolConfig {
                profile_root: dir.path().to_path_buf(),
                ..SessionPoolConfig::default()
            },
            Arc::new(FakeBrowserLauncher),
        );
        let trace = Arc::new(ActionTrace::new());
        let engine = Arc::new(ActionEngine::new(
            Arc::clone(&trace),
            Arc::new(PopupDismisser::new(PopupDismisserConfig::default())),
            Arc::new(NoopArtifactSink),
        ));
        let surface = Arc::new(ToolSurface::new(
            pool,
            engine,
            trace,
            Arc::new(browser_persistence::InMemoryArtifactWriter::new()),
            Arc::new(InMemoryActionLogStore::new()),
            Arc::clone(&session_store) as Arc<dyn browser_persistence::SessionStore>,
            None,
            ToolSurfaceConfig::default(),
        ));

        let opened = surface.call("open", json!({})).await.unwrap();
        let session_id = opened.details["sessionId"].as_str().unwrap().to_string();
        surface
            .call("navigate", json!({"sessionId": session_id, "url": "https://example.com/live"}))
            .await
            .unwrap();

        // Simulate a snapshot that was persisted at some earlier point (e.g.
        // a prior `close`) without ever touching the live session object, so
        // its own `last_snapshot()` stays `None`.
        let snapshot = browser_session::SessionSnapshot {
            session_id: session_id.clone(),
            url: "https://example.com/restored".to_string(),
            cookies: Vec::new(),
            local_storage: std::collections::HashMap::from([("theme".to_string(), "dark".to_string())]),
            timestamp: chrono::Utc::now(),
        };
        session_store
            .save_snapshot(&session_id, serde_json::to_value(&snapshot).unwrap())
            .await
            .unwrap();

        let restored = surface.call("restore", json!({"sessionId": session_id})).await.unwrap();
        assert_eq!(restored.details["restoredTo"], "https://example.com/restored");

        let record = session_store.get(&session_id).await.unwrap().unwrap();
        assert_eq!(record.last_url.as_deref(), Some("https://example.com/restored"));
    }
}
