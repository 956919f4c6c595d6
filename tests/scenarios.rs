//! The six end-to-end scenarios from spec §8, run against the in-process
//! `FakeDriver` the way every crate's own unit tests do, but exercised
//! through the same layers an embedding agent host actually drives:
//! `SessionPool`, the `ActionEngine` envelope, the handle registry, and
//! `ToolSurface`'s JSON-in/JSON-out dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use browser_action_engine::{ActionEngine, ActionOptions, NoopArtifactSink};
use browser_action_trace::ActionTrace;
use browser_actions::{click, extract_structured, ActionContext, ExtractionSchema, FieldType, SchemaField, Target};
use browser_core_types::SessionId;
use browser_driver::fake::{FakeBrowserContext, FakeElement};
use browser_driver::{BrowserContext, Page};
use browser_handle_registry::HandleRegistry;
use browser_resilience::{PopupDismisser, PopupDismisserConfig};
use browser_selector_resolver::{Selector, SelectorStrategy};
use browser_session::BrowserSession;
use browser_session_pool::{AcquireOptions, FakeBrowserLauncher, HealthMonitorConfig, SessionPool, SessionPoolConfig};
use serde_json::json;

fn engine() -> Arc<ActionEngine> {
    Arc::new(ActionEngine::new(
        Arc::new(ActionTrace::new()),
        Arc::new(PopupDismisser::new(PopupDismisserConfig::default())),
        Arc::new(NoopArtifactSink),
    ))
}

/// Builds a session against a concrete `FakeBrowserContext` so the test can
/// reach `last_page()` for DOM seeding, mirroring `browser-actions`'
/// own fixture pattern.
async fn fixture() -> (Arc<BrowserSession>, ActionContext, Arc<browser_driver::fake::FakePage>) {
    let context = FakeBrowserContext::new();
    let page = context.new_page().await.unwrap();
    let fake_page = context.last_page().unwrap();
    let context_dyn: Arc<dyn browser_driver::BrowserContext> = context;
    let session = Arc::new(BrowserSession::new(SessionId::new(), context_dyn, page, None));
    let ctx = ActionContext::new(Arc::clone(&session), engine(), Arc::new(HandleRegistry::new()));
    (session, ctx, fake_page)
}

fn pool_config(root: &std::path::Path) -> SessionPoolConfig {
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

/// Scenario 1 — Pool lifecycle: repeated acquire/release at capacity never
/// leaks a slot and the pool stays serviceable afterwards.
#[tokio::test]
async fn pool_lifecycle_acquire_release_does_not_leak_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let pool = SessionPool::new(pool_config(dir.path()), Arc::new(FakeBrowserLauncher));

    for _ in 0..20 {
        let session = pool.acquire(AcquireOptions::default()).await.unwrap();
        pool.release(session.id()).await.unwrap();
    }

    // The pool is still at zero live sessions, so it can admit up to
    // `max_contexts` fresh ones without hitting "pool limit reached".
    let a = pool.acquire(AcquireOptions::default()).await.unwrap();
    let b = pool.acquire(AcquireOptions::default()).await.unwrap();
    assert!(pool.acquire(AcquireOptions::default()).await.is_err());
    pool.release(a.id()).await.unwrap();
    pool.release(b.id()).await.unwrap();
    pool.shutdown().await;
}

/// Scenario 2 — Selector fallback with remap tracking: a handle registered
/// against `[css(#btn), testid(action-btn)]` keeps resolving after the id
/// attribute disappears from the DOM, and the registry records the remap.
#[tokio::test]
async fn selector_fallback_remaps_when_primary_strategy_stops_matching() {
    let (_, ctx, fake_page) = fixture().await;
    fake_page.seed(vec![FakeElement::new("button").attr("id", "btn").attr("data-testid", "action-btn")]);

    let chain = Selector::chain(vec![
        SelectorStrategy::Css { selector: "#btn".to_string() },
        SelectorStrategy::TestId { id: "action-btn".to_string() },
    ])
    .unwrap();
    let (handle_id, first) = ctx.registry.register(fake_page.as_ref(), chain, 1000).await.unwrap();
    assert_eq!(first.strategy.name(), "css");

    // The id attribute is dropped from the DOM; only the testid survives.
    fake_page.remove("#btn");
    fake_page.seed(vec![FakeElement::new("button").attr("data-testid", "action-btn")]);

    let outcome = ctx
        .registry
        .resolve(fake_page.as_ref(), &handle_id, browser_selector_resolver::WaitState::Visible, 1000)
        .await
        .unwrap();
    assert!(outcome.remapped);
    assert_eq!(outcome.resolution.strategy.name(), "testid");
    assert_eq!(ctx.registry.get(&handle_id).unwrap().remap_count, 1);
}

/// Scenario 3 — Retry on a flaky element: the target isn't in the DOM on
/// the first click attempt but appears a few dozen milliseconds later;
/// `click` retries through the engine envelope and succeeds with a
/// non-zero retry count, never surfacing `TARGET_NOT_FOUND` to the caller.
#[tokio::test]
async fn click_retries_past_a_late_appearing_element() {
    let (_, ctx, fake_page) = fixture().await;
    fake_page.schedule_insert(
        Duration::from_millis(60),
        FakeElement::new("button").attr("id", "go").text("Go"),
    );

    let result = click(&ctx, Target::Selector("#go".into()), ActionOptions { retries: 5, ..ActionOptions::default() }).await;

    assert!(result.ok, "click should eventually succeed: {:?}", result.error);
    assert!(result.retries >= 1, "expected at least one retry while the element was still absent");
}

/// Scenario 4 — Crash recovery, identity preserved: closing the active
/// page without going through the session API simulates a renderer crash;
/// the pool's health monitor detects it and swaps in a fresh context while
/// keeping the session's id stable, so callers holding that id keep working.
#[tokio::test]
async fn crash_recovery_keeps_session_id_stable() {
    let dir = tempfile::tempdir().unwrap();
    let pool = SessionPool::new(pool_config(dir.path()), Arc::new(FakeBrowserLauncher));
    let session = pool
        .acquire(AcquireOptions {
            profile: None,
            url: Some("data:text/html,<h1>x</h1>".to_string()),
        })
        .await
        .unwrap();
    let id = session.id().clone();
    pool.start_health_monitor().await;

    session.page().close().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let recovered = pool.get(&id).expect("session still tracked under its original id");
    assert_eq!(recovered.id(), &id);
    assert!(recovered.is_healthy());
    assert_eq!(pool.list().len(), 1);
    pool.shutdown().await;
}

/// Scenario 5 — Structured extract: three `<li>` rows yield three records
/// with field coercion and per-row provenance.
#[tokio::test]
async fn structured_extract_reads_three_rows_with_provenance() {
    let (_, ctx, fake_page) = fixture().await;
    fake_page.seed(vec![
        FakeElement::new("li").attr("id", "row-1").attr("data-rank", "1").text("Apples"),
        FakeElement::new("li").attr("id", "row-2").attr("data-rank", "2").text("Bananas"),
        FakeElement::new("li").attr("id", "row-3").attr("data-rank", "3").text("Cherries"),
    ]);

    let mut fields = HashMap::new();
    fields.insert("name".to_string(), SchemaField { source: "textContent".to_string(), field_type: FieldType::String });
    fields.insert("rank".to_string(), SchemaField { source: "data-rank".to_string(), field_type: FieldType::Integer });

    let result = extract_structured(&ctx, "li", ExtractionSchema { fields }, 100, ActionOptions::default()).await;
    assert!(result.ok, "extract_structured failed: {:?}", result.error);
    let extraction = result.data.unwrap();
    assert_eq!(extraction.data.len(), 3);
    assert_eq!(extraction.provenance.len(), 3);
    assert_eq!(extraction.data[0]["name"], json!("Apples"));
    assert_eq!(extraction.data[0]["rank"], json!(1));
    assert_eq!(extraction.provenance[2].tag_name, "li");
    assert_eq!(extraction.provenance[2].id.as_deref(), Some("row-3"));
}

/// Scenario 6 — Navigation guard: a body that navigates the page mid-attempt
/// and fails so the engine retries is interrupted on the very next attempt
/// with `NAVIGATION_INTERRUPTED` the moment the engine notices `page.url()`
/// no longer matches the url the action started against, rather than
/// retrying a target that no longer makes sense on the new page.
#[tokio::test]
async fn navigation_mid_action_is_reported_as_interrupted() {
    let (_, ctx, fake_page) = fixture().await;
    fake_page.seed(vec![FakeElement::new("div").attr("id", "target")]);
    let page = ctx.page();

    let result = ctx
        .engine
        .execute_action(page.clone(), ctx.session.id(), "probe", ActionOptions { retries: 3, ..ActionOptions::default() }, {
            let page = Arc::clone(&page);
            move |attempt_ctx| {
                let page = Arc::clone(&page);
                async move {
                    if attempt_ctx.attempt == 0 {
                        page.goto("https://example.com/elsewhere").await?;
                        return Err(browser_core_types::RuntimeError::target_not_found("#target vanished"));
                    }
                    Ok(())
                }
            }
        })
        .await;

    assert!(!result.ok);
    // One attempt ran (and navigated); the guard trips before the body is
    // invoked again, so no retry actually happened.
    assert_eq!(result.retries, 0);
    let structured = result.structured_error.expect("navigation guard should report a structured error");
    assert_eq!(structured.code, "NAVIGATION_INTERRUPTED");
}
