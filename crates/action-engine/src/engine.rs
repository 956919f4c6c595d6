//! The `executeAction` envelope: precondition → execute → postcondition,
//! with retries, a navigation guard, selector-chain rotation, back-off, and
//! trace/screenshot emission (spec §4.4).

use crate::types::{ActionOptions, ActionResult, ArtifactSink, AttemptContext, TraceMeta};
use browser_action_trace::{ActionTrace, TraceEntry};
use browser_core_types::{ErrorKind, RuntimeError, SessionId};
use browser_driver::Page;
use browser_resilience::PopupDismisser;
use chrono::Utc;
use parking_lot::Mutex;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

pub struct ActionEngine {
    trace: Arc<ActionTrace>,
    popup_dismisser: Arc<PopupDismisser>,
    artifact_sink: Arc<dyn ArtifactSink>,
}

impl ActionEngine {
    pub fn new(trace: Arc<ActionTrace>, popup_dismisser: Arc<PopupDismisser>, artifact_sink: Arc<dyn ArtifactSink>) -> Self {
        Self {
            trace,
            popup_dismisser,
            artifact_sink,
        }
    }

    /// Runs `body` under the full envelope. A [`PopupDismisser`] watcher is
    /// started before the first attempt and always stopped before returning,
    /// success or failure (spec §4.3), on top of the per-attempt
    /// [`PopupDismisser::sweep_once`] already run inside the loop.
    pub async fn execute_action<T, F, Fut>(
        &self,
        page: Arc<dyn Page>,
        session_id: &SessionId,
        action_name: &str,
        options: ActionOptions,
        body: F,
    ) -> ActionResult<T>
    where
        F: FnMut(AttemptContext) -> Fut,
        Fut: Future<Output = Result<T, RuntimeError>>,
    {
        let watcher = Arc::clone(&self.popup_dismisser).start(Arc::clone(&page));
        let result = self
            .run_attempts(page.as_ref(), session_id, action_name, options, body)
            .await;
        watcher.stop().await;
        result
    }

    async fn run_attempts<T, F, Fut>(
        &self,
        page: &dyn Page,
        session_id: &SessionId,
        action_name: &str,
        options: ActionOptions,
        mut body: F,
    ) -> ActionResult<T>
    where
        F: FnMut(AttemptContext) -> Fut,
        Fut: Future<Output = Result<T, RuntimeError>>,
    {
        let start = Instant::now();
        let start_url = page.url().await;
        let max_attempts = options.retries + 1;
        let mut attempts_performed: u32 = 0;
        let mut last_error: Option<RuntimeError> = None;
        let mut last_trace_meta = TraceMeta::default();

        for attempt in 0..max_attempts {
            if attempt >= 1 {
                let current_url = page.url().await;
                if current_url != start_url {
                    let error = RuntimeError::navigation_interrupted(format!(
                        "navigated from {start_url} to {current_url} mid-action"
                    ));
                    return self
                        .finish_failure(
                            page,
                            session_id,
                            action_name,
                            &error,
                            attempts_performed.saturating_sub(1),
                            start,
                            &last_trace_meta,
                            options.screenshot_on_failure,
                        )
                        .await;
                }
            }

            self.popup_dismisser.sweep_once(page).await;

            let trace_meta = Arc::new(Mutex::new(TraceMeta::default()));
            let attempt_ctx = AttemptContext {
                attempt,
                trace_meta: Arc::clone(&trace_meta),
            };

            let precondition_ok = match &options.precondition {
                Some(precondition) => {
                    trace_meta.lock().assertions_checked.push("precondition".to_string());
                    precondition(page).await
                }
                None => true,
            };

            let outcome: Result<T, RuntimeError> = if !precondition_ok {
                Err(RuntimeError::assertion_failed("precondition failed"))
            } else {
                match body(attempt_ctx).await {
                    Ok(value) => match &options.postcondition {
                        Some(postcondition) => {
                            trace_meta.lock().assertions_checked.push("postcondition".to_string());
                            if postcondition(page).await {
                                Ok(value)
                            } else {
                                Err(RuntimeError::assertion_failed("postcondition failed"))
                            }
                        }
                        None => Ok(value),
                    },
                    Err(error) => Err(error),
                }
            };
            attempts_performed += 1;
            last_trace_meta = std::mem::take(&mut *trace_meta.lock());

            match outcome {
                Ok(value) => {
                    let retries = attempts_performed - 1;
                    self.emit_trace_success(session_id, action_name, &last_trace_meta, retries, start);
                    return ActionResult::success(value, retries, start.elapsed().as_millis() as u64);
                }
                Err(error) => {
                    if let RuntimeError::Taxonomy(ref taxonomy) = error {
                        if taxonomy.kind == ErrorKind::TargetNotFound {
                            if let Some(chain) = &options.selector_strategies {
                                let mut guard = chain.lock();
                                if !guard.is_empty() {
                                    let head = guard.remove(0);
                                    guard.push(head);
                                }
                            }
                        }
                    }

                    let retryable = error.engine_retryable();
                    last_error = Some(error);

                    if !retryable || attempt + 1 >= max_attempts {
                        let error = last_error.take().unwrap();
                        return self
                            .finish_failure(
                                page,
                                session_id,
                                action_name,
                                &error,
                                attempts_performed.saturating_sub(1),
                                start,
                                &last_trace_meta,
                                options.screenshot_on_failure,
                            )
                            .await;
                    }

                    let backoff_ms = (100u64.saturating_mul(1u64 << attempt.min(20))).min(2000);
                    let jitter_ms = rand::thread_rng().gen_range(0..500);
                    tokio::time::sleep(Duration::from_millis(backoff_ms + jitter_ms)).await;
                }
            }
        }

        let error = last_error.unwrap_or_else(|| RuntimeError::other("action exhausted retries"));
        self.finish_failure(
            page,
            session_id,
            action_name,
            &error,
            attempts_performed.saturating_sub(1),
            start,
            &last_trace_meta,
            options.screenshot_on_failure,
        )
        .await
    }

    fn emit_trace_success(
        &self,
        session_id: &SessionId,
        action_name: &str,
        meta: &TraceMeta,
        retries: u32,
        start: Instant,
    ) {
        self.trace.record(
            session_id,
            TraceEntry {
                action: action_name.to_string(),
                selector: meta.selector.clone(),
                timestamp: Utc::now(),
                duration_ms: start.elapsed().as_millis() as u64,
                ok: true,
                error: None,
                retries,
                selector_resolved: meta.selector_resolved.clone(),
                events_dispatched: meta.events_dispatched.clone(),
                waits_performed: meta.waits_performed.clone(),
                assertions_checked: meta.assertions_checked.clone(),
            },
        );
    }

    #[allow(clippy::too_many_arguments)]
    async fn finish_failure<T>(
        &self,
        page: &dyn Page,
        session_id: &SessionId,
        action_name: &str,
        error: &RuntimeError,
        retries: u32,
        start: Instant,
        meta: &TraceMeta,
        screenshot_on_failure: bool,
    ) -> ActionResult<T> {
        let screenshot = if screenshot_on_failure {
            match page.screenshot().await {
                Ok(bytes) => {
                    let label = format!("{action_name}-failure");
                    self.artifact_sink.write_screenshot(bytes, &label).await.ok()
                }
                Err(_) => {
                    warn!(action = action_name, "screenshot on failure could not be captured");
                    None
                }
            }
        } else {
            None
        };

        self.trace.record(
            session_id,
            TraceEntry {
                action: action_name.to_string(),
                selector: meta.selector.clone(),
                timestamp: Utc::now(),
                duration_ms: start.elapsed().as_millis() as u64,
                ok: false,
                error: error.structured(),
                retries,
                selector_resolved: meta.selector_resolved.clone(),
                events_dispatched: meta.events_dispatched.clone(),
                waits_performed: meta.waits_performed.clone(),
                assertions_checked: meta.assertions_checked.clone(),
            },
        );

        ActionResult::failure(error, retries, start.elapsed().as_millis() as u64, screenshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NoopArtifactSink;
    use browser_driver::fake::{FakeElement, FakePage};
    use browser_resilience::PopupDismisserConfig;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn engine() -> ActionEngine {
        ActionEngine::new(
            Arc::new(ActionTrace::new()),
            Arc::new(PopupDismisser::new(PopupDismisserConfig::default())),
            Arc::new(NoopArtifactSink),
        )
    }

    #[tokio::test]
    async fn succeeds_on_first_attempt_with_zero_retries_reported() {
        let page = FakePage::new();
        let engine = engine();
        let result = engine
            .execute_action(page.clone(), &SessionId::new(), "noop", ActionOptions::default(), |_ctx| async {
                Ok::<_, RuntimeError>(42)
            })
            .await;
        assert!(result.ok);
        assert_eq!(result.data, Some(42));
        assert_eq!(result.retries, 0);
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let page = FakePage::new();
        let engine = engine();
        let attempts = Arc::new(AtomicU32::new(0));
        let result = engine
            .execute_action(page.clone(), &SessionId::new(), "flaky", ActionOptions::default(), {
                let attempts = Arc::clone(&attempts);
                move |_ctx| {
                    let attempts = Arc::clone(&attempts);
                    async move {
                        if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                            Err(RuntimeError::target_not_found("not yet"))
                        } else {
                            Ok::<_, RuntimeError>("done")
                        }
                    }
                }
            })
            .await;
        assert!(result.ok);
        assert_eq!(result.retries, 2);
    }

    #[tokio::test]
    async fn navigation_interrupted_aborts_immediately_and_is_not_retried() {
        let page = FakePage::new();
        let engine = engine();
        let attempts = Arc::new(AtomicU32::new(0));
        let page_for_body = page.clone();
        let result = engine
            .execute_action(page.clone(), &SessionId::new(), "nav", ActionOptions::default(), {
                let attempts = Arc::clone(&attempts);
                move |_ctx| {
                    let attempts = Arc::clone(&attempts);
                    let page = page_for_body.clone();
                    async move {
                        if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                            page.goto("https://example.com/elsewhere").await.unwrap();
                        }
                        Err::<(), _>(RuntimeError::target_not_found("still missing"))
                    }
                }
            })
            .await;
        assert!(!result.ok);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(result.structured_error.unwrap().code, "NAVIGATION_INTERRUPTED");
    }

    #[tokio::test]
    async fn session_unhealthy_is_never_retried() {
        let page = FakePage::new();
        let engine = engine();
        let attempts = Arc::new(AtomicU32::new(0));
        let result = engine
            .execute_action(page.clone(), &SessionId::new(), "doomed", ActionOptions::default(), {
                let attempts = Arc::clone(&attempts);
                move |_ctx| {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    async move { Err::<(), _>(RuntimeError::session_unhealthy("browser gone")) }
                }
            })
            .await;
        assert!(!result.ok);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn target_not_found_rotates_selector_chain() {
        use browser_selector_resolver::SelectorStrategy;
        let page = FakePage::new();
        page.seed(vec![FakeElement::new("button").attr("id", "real")]);
        let engine = engine();
        let chain = Arc::new(Mutex::new(vec![
            SelectorStrategy::Css {
                selector: "#missing".to_string(),
            },
            SelectorStrategy::Css {
                selector: "#real".to_string(),
            },
        ]));
        let options = ActionOptions {
            selector_strategies: Some(Arc::clone(&chain)),
            ..ActionOptions::default()
        };
        let result = engine
            .execute_action(page.clone(), &SessionId::new(), "rotate", options, {
                let chain = Arc::clone(&chain);
                move |_ctx| {
                    let chain = Arc::clone(&chain);
                    async move {
                        let head = chain.lock()[0].clone();
                        match head {
                            SelectorStrategy::Css { selector } if selector == "#real" => Ok(()),
                            _ => Err(RuntimeError::target_not_found("head still missing")),
                        }
                    }
                }
            })
            .await;
        assert!(result.ok);
        assert_eq!(result.retries, 1);
    }
}
