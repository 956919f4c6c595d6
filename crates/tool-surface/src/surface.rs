//! Dispatches the 26 `browser_*` tools onto the engine, pool, handle
//! registries, and persistence stores (spec §6).

use crate::approval::{resolve_approval, ApprovalConfig, ApprovalProvider};
use crate::args::{obj, opt_bool, opt_str, opt_u64, parse_action_options, parse_selector, parse_wait_state, require_field, require_str};
use crate::outcome::ToolOutcome;
use crate::redaction::{redact_input, RedactionConfig};
use browser_action_engine::{ActionEngine, ActionOptions, ActionResult, DedupGuard};
use browser_action_trace::ActionTrace;
use browser_actions::{
    self, apply_filter, click, extract_structured, fill_map, get_all, get_page_content, get_page_state, get_text, navigate, screenshot, scroll,
    select, set_field, submit_form, wait_for_network_idle, wait_for_selector, wait_for_url, ExtractionSchema, FieldType, SchemaField,
    ScrollDirection, Target, TypeMode,
};
use browser_core_types::{HandleId, RuntimeError, SessionId};
use browser_handle_registry::HandleRegistry;
use browser_persistence::{ActionLogEntry, ActionLogStore, ArtifactWriter, SessionRecord, SessionStatus, SessionStore};
use browser_session::{BrowserSession, SessionSnapshot};
use browser_session_pool::{AcquireOptions, SessionPool};
use chrono::Utc;
use dashmap::DashMap;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub struct ToolSurfaceConfig {
    pub approval: ApprovalConfig,
    pub redaction: RedactionConfig,
}

impl Default for ToolSurfaceConfig {
    fn default() -> Self {
        Self {
            approval: ApprovalConfig::default(),
            redaction: RedactionConfig::default(),
        }
    }
}

pub struct ToolSurface {
    pool: Arc<SessionPool>,
    engine: Arc<ActionEngine>,
    trace: Arc<ActionTrace>,
    artifact_writer: Arc<dyn ArtifactWriter>,
    action_log: Arc<dyn ActionLogStore>,
    session_store: Arc<dyn SessionStore>,
    approval_provider: Option<Arc<dyn ApprovalProvider>>,
    config: ToolSurfaceConfig,
    registries: DashMap<SessionId, Arc<HandleRegistry>>,
    dedups: DashMap<SessionId, Arc<DedupGuard>>,
}

impl ToolSurface {
    pub fn new(
        pool: Arc<SessionPool>,
        engine: Arc<ActionEngine>,
        trace: Arc<ActionTrace>,
        artifact_writer: Arc<dyn ArtifactWriter>,
        action_log: Arc<dyn ActionLogStore>,
        session_store: Arc<dyn SessionStore>,
        approval_provider: Option<Arc<dyn ApprovalProvider>>,
        config: ToolSurfaceConfig,
    ) -> Self {
        Self {
            pool,
            engine,
            trace,
            artifact_writer,
            action_log,
            session_store,
            approval_provider,
            config,
            registries: DashMap::new(),
            dedups: DashMap::new(),
        }
    }

    pub async fn call(&self, name: &str, args: Value) -> Result<ToolOutcome, RuntimeError> {
        match name {
            "open" => self.open(args).await,
            "close" => self.close(args).await,
            "list" => self.list(args).await,
            "restore" => self.restore(args).await,
            "state" => self.state(args).await,
            "navigate" => self.navigate(args).await,
            "click" => self.click(args).await,
            "type" => self.type_text(args).await,
            "select" => self.select(args).await,
            "fill_form" => self.fill_form(args).await,
            "extract_text" => self.extract_text(args).await,
            "extract_all" => self.extract_all(args).await,
            "extract_structured" => self.extract_structured(args).await,
            "wait" => self.wait(args).await,
            "get_content" => self.get_content(args).await,
            "screenshot" => self.screenshot(args).await,
            "evaluate" => self.evaluate(args).await,
            "scroll" => self.scroll(args).await,
            "session_trace" => self.session_trace(args).await,
            "register_element" => self.register_element(args).await,
            "resolve_element" => self.resolve_element(args).await,
            "release_element" => self.release_element(args).await,
            "set_field" => self.set_field(args).await,
            "submit_form" => self.submit_form(args).await,
            "apply_filter" => self.apply_filter(args).await,
            "request_approval" => self.request_approval(args).await,
            other => Err(RuntimeError::other(format!("unknown tool '{other}'"))),
        }
    }

    fn session(&self, id: &str) -> Result<Arc<BrowserSession>, RuntimeError> {
        self.pool
            .get(&SessionId::from(id))
            .ok_or_else(|| RuntimeError::other(format!("unknown session '{id}'")))
    }

    fn registry_for(&self, id: &SessionId) -> Arc<HandleRegistry> {
        Arc::clone(
            self.registries
                .entry(id.clone())
                .or_insert_with(|| Arc::new(HandleRegistry::new()))
                .value(),
        )
    }

    fn dedup_for(&self, id: &SessionId) -> Arc<DedupGuard> {
        Arc::clone(self.dedups.entry(id.clone()).or_insert_with(|| Arc::new(DedupGuard::new())).value())
    }

    fn context(&self, session: Arc<BrowserSession>) -> browser_actions::ActionContext {
        let registry = self.registry_for(session.id());
        let dedup = self.dedup_for(session.id());
        browser_actions::ActionContext::with_dedup(session, Arc::clone(&self.engine), registry, dedup)
    }

    async fn log<T>(&self, session_id: &SessionId, action: &str, selector: Option<String>, input: Option<Value>, result: &ActionResult<T>) {
        let sanitised_input = input.map(|v| redact_input(&v, &self.config.redaction));
        let entry = ActionLogEntry {
            id: browser_core_types::ActionId::new().to_string(),
            session_id: session_id.to_string(),
            action: action.to_string(),
            selector,
            input: sanitised_input,
            ok: result.ok,
            error_code: result.structured_error.as_ref().map(|e| e.code.clone()),
            screenshot_path: result.screenshot.clone(),
            duration_ms: result.duration_ms,
            retries: result.retries,
            created_at: Utc::now(),
        };
        if let Err(err) = self.action_log.append(entry).await {
            tracing::warn!(error = %err, "failed to append action log entry");
        }
    }

    fn into_outcome<T: serde::Serialize>(result: ActionResult<T>) -> Result<ToolOutcome, RuntimeError> {
        if result.ok {
            let details = serde_json::to_value(&result.data).unwrap_or(Value::Null);
            Ok(ToolOutcome::new(details.to_string(), json!({"ok": true, "retries": result.retries, "durationMs": result.duration_ms, "data": details})))
        } else {
            Err(result
                .structured_error
                .map(|e| match e.code.as_str() {
                    "TARGET_NOT_FOUND" => RuntimeError::target_not_found(e.message),
                    "STALE_ELEMENT" => RuntimeError::stale_element(e.message),
                    "ASSERTION_FAILED" => RuntimeError::assertion_failed(e.message),
                    "NAVIGATION_INTERRUPTED" => RuntimeError::navigation_interrupted(e.message),
                    "TIMEOUT_EXCEEDED" => RuntimeError::timeout_exceeded(e.message),
                    "SESSION_UNHEALTHY" => RuntimeError::session_unhealthy(e.message),
                    _ => RuntimeError::other(e.message),
                })
                .unwrap_or_else(|| RuntimeError::other(result.error.unwrap_or_else(|| "action failed".to_string()))))
        }
    }

    // ---- Session (5) ----

    async fn open(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let options = AcquireOptions {
            profile: opt_str(map, "profile").map(str::to_string),
            url: opt_str(map, "url").map(str::to_string),
        };
        let session = self.pool.acquire(options).await?;
        let url = session.current_url().await;
        let now = Utc::now();
        let record = SessionRecord {
            id: session.id().to_string(),
            profile: session.profile().map(str::to_string),
            status: SessionStatus::Active,
            last_url: Some(url.clone()),
            snapshot: None,
            created_at: now,
            updated_at: now,
        };
        if let Err(err) = self.session_store.put(record).await {
            tracing::warn!(error = %err, "failed to persist session record");
        }
        Ok(ToolOutcome::from_details(json!({"sessionId": session.id().to_string(), "url": url})))
    }

    async fn close(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let session_id = SessionId::from(id);
        // Capture a durable snapshot before the pool tears the session down,
        // so `restore` still has something to work with after a process
        // restart loses the in-memory `BrowserSession::last_snapshot`.
        if let Some(session) = self.pool.get(&session_id) {
            let snapshot = session.snapshot().await;
            if let Ok(value) = serde_json::to_value(&snapshot) {
                if let Err(err) = self.session_store.save_snapshot(id, value).await {
                    tracing::warn!(error = %err, "failed to persist session snapshot on close");
                }
            }
        }
        self.pool.release(&session_id).await?;
        self.registries.remove(&session_id);
        self.dedups.remove(&session_id);
        self.trace.clear_session(&session_id);
        if let Err(err) = self.session_store.update_status(id, SessionStatus::Closed).await {
            tracing::warn!(error = %err, "failed to persist session closure");
        }
        Ok(ToolOutcome::from_details(json!({"sessionId": id, "closed": true})))
    }

    async fn list(&self, _args: Value) -> Result<ToolOutcome, RuntimeError> {
        let live = self.pool.list();
        let live_ids: std::collections::HashSet<String> = live.iter().map(|s| s.id().to_string()).collect();
        let mut sessions = Vec::new();
        for session in &live {
            sessions.push(json!({
                "sessionId": session.id().to_string(),
                "status": if session.is_healthy() { "active" } else { "suspended" },
                "url": session.current_url().await,
            }));
        }
        for record in self.session_store.list().await.unwrap_or_default() {
            if !live_ids.contains(&record.id) {
                sessions.push(json!({
                    "sessionId": record.id,
                    "status": record.status,
                    "url": record.last_url,
                }));
            }
        }
        Ok(ToolOutcome::from_details(json!({"sessions": sessions})))
    }

    async fn restore(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let session = self.session(id)?;
        let snapshot = match session.last_snapshot() {
            Some(snapshot) => snapshot,
            None => {
                let record = self
                    .session_store
                    .get(id)
                    .await
                    .unwrap_or(None)
                    .ok_or_else(|| RuntimeError::other("no snapshot recorded for this session yet"))?;
                let raw = record
                    .snapshot
                    .ok_or_else(|| RuntimeError::other("no snapshot recorded for this session yet"))?;
                serde_json::from_value::<SessionSnapshot>(raw).map_err(|e| RuntimeError::other(format!("stored snapshot is corrupt: {e}")))?
            }
        };
        session.restore(&snapshot).await?;
        if let Some(mut record) = self.session_store.get(id).await.unwrap_or(None) {
            record.status = SessionStatus::Active;
            record.last_url = Some(snapshot.url.clone());
            record.updated_at = Utc::now();
            let _ = self.session_store.put(record).await;
        }
        Ok(ToolOutcome::from_details(json!({"sessionId": id, "restoredTo": snapshot.url})))
    }

    async fn state(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let session = self.session(id)?;
        let ctx = self.context(Arc::clone(&session));
        let result = get_page_state(&ctx, ActionOptions::default()).await;
        self.log(session.id(), "state", None, None, &result).await;
        Self::into_outcome(result)
    }

    // ---- Action (10) ----

    async fn navigate(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let url = require_str(map, "url")?;
        let session = self.session(id)?;
        let ctx = self.context(Arc::clone(&session));
        let result = navigate(&ctx, url, parse_action_options(map)).await;
        self.log(session.id(), "navigate", None, Some(json!({"url": url})), &result).await;
        Self::into_outcome(result)
    }

    async fn click(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let target = parse_target(map)?;
        let session = self.session(id)?;
        let ctx = self.context(Arc::clone(&session));
        let result = click(&ctx, target, parse_action_options(map)).await;
        self.log(session.id(), "click", target_label(map), None, &result).await;
        Self::into_outcome(result)
    }

    async fn type_text(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let text = require_str(map, "text")?;
        let target = parse_target(map)?;
        let mode = parse_type_mode(map)?;
        let session = self.session(id)?;
        let ctx = self.context(Arc::clone(&session));
        let result = browser_actions::type_text(&ctx, target, text, mode, parse_action_options(map)).await;
        self.log(session.id(), "type", target_label(map), Some(json!({"text": text})), &result).await;
        Self::into_outcome(result)
    }

    async fn select(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let value = require_str(map, "value")?;
        let target = parse_target(map)?;
        let session = self.session(id)?;
        let ctx = self.context(Arc::clone(&session));
        let result = select(&ctx, target, value, parse_action_options(map)).await;
        self.log(session.id(), "select", target_label(map), Some(json!({"value": value})), &result).await;
        Self::into_outcome(result)
    }

    async fn fill_form(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let entries_value = require_field(map, "entries")?;
        let entries_json = entries_value
            .as_array()
            .ok_or_else(|| RuntimeError::other("'entries' must be an array"))?;
        let mut entries = Vec::with_capacity(entries_json.len());
        for entry in entries_json {
            let entry_map = obj(entry)?;
            let target = parse_target(entry_map)?;
            let value = require_str(entry_map, "value")?.to_string();
            entries.push((target, value));
        }
        let session = self.session(id)?;
        let ctx = self.context(Arc::clone(&session));
        let result = fill_map(&ctx, entries, parse_action_options(map)).await;
        self.log(session.id(), "fillMap", None, None, &result).await;
        Self::into_outcome(result)
    }

    async fn extract_text(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let target = parse_target(map)?;
        let session = self.session(id)?;
        let ctx = self.context(Arc::clone(&session));
        let result = get_text(&ctx, target, parse_action_options(map)).await;
        self.log(session.id(), "extractText", target_label(map), None, &result).await;
        Self::into_outcome(result)
    }

    async fn extract_all(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let selector = require_str(map, "selector")?;
        let keys = require_field(map, "keys")?
            .as_array()
            .ok_or_else(|| RuntimeError::other("'keys' must be an array of strings"))?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| RuntimeError::other("'keys' must be an array of strings"))?;
        let session = self.session(id)?;
        let ctx = self.context(Arc::clone(&session));
        let result = get_all(&ctx, selector, keys, parse_action_options(map)).await;
        self.log(session.id(), "extractAll", Some(selector.to_string()), None, &result).await;
        Self::into_outcome(result)
    }

    async fn extract_structured(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let selector = require_str(map, "selector")?;
        let fields_map = require_field(map, "fields")?
            .as_object()
            .ok_or_else(|| RuntimeError::other("'fields' must be an object"))?;
        let mut fields = HashMap::with_capacity(fields_map.len());
        for (key, spec) in fields_map {
            let spec_map = obj(spec)?;
            let source = require_str(spec_map, "source")?.to_string();
            let field_type = match opt_str(spec_map, "type").unwrap_or("string") {
                "string" => FieldType::String,
                "number" => FieldType::Number,
                "integer" => FieldType::Integer,
                "boolean" => FieldType::Boolean,
                other => return Err(RuntimeError::other(format!("unknown field type '{other}'"))),
            };
            fields.insert(key.clone(), SchemaField { source, field_type });
        }
        let limit = opt_u64(map, "limit").unwrap_or(100) as usize;
        let session = self.session(id)?;
        let ctx = self.context(Arc::clone(&session));
        let result = extract_structured(&ctx, selector, ExtractionSchema { fields }, limit, parse_action_options(map)).await;
        self.log(session.id(), "extractStructured", Some(selector.to_string()), None, &result).await;
        Self::into_outcome(result)
    }

    async fn wait(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let has_selector = map.contains_key("selector");
        let has_condition = map.contains_key("condition");
        if has_selector == has_condition {
            return Err(RuntimeError::other("'wait' requires exactly one of 'selector' or 'condition'"));
        }
        let timeout = Duration::from_millis(opt_u64(map, "timeoutMs").unwrap_or(15_000));
        let session = self.session(id)?;
        let ctx = self.context(Arc::clone(&session));
        let options = parse_action_options(map);
        if has_selector {
            let target = parse_target(map)?;
            let wait_state = parse_wait_state(map)?;
            let result = wait_for_selector(&ctx, target, wait_state, timeout, options).await;
            self.log(session.id(), "waitForSelector", target_label(map), None, &result).await;
            return Self::into_outcome(result);
        }
        let condition = require_str(map, "condition")?;
        if condition == "networkIdle" {
            let result = wait_for_network_idle(&ctx, timeout, options).await;
            self.log(session.id(), "waitForNetworkIdle", None, None, &result).await;
            return Self::into_outcome(result);
        }
        if let Some(substring) = condition.strip_prefix("urlContains:") {
            let result = wait_for_url(&ctx, substring, timeout, options).await;
            self.log(session.id(), "waitForUrl", None, Some(json!({"condition": condition})), &result).await;
            return Self::into_outcome(result);
        }
        Err(RuntimeError::other(format!("unknown wait condition '{condition}'")))
    }

    async fn get_content(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let session = self.session(id)?;
        let ctx = self.context(Arc::clone(&session));
        let result = get_page_content(&ctx, parse_action_options(map)).await;
        self.log(session.id(), "getContent", None, None, &result).await;
        Self::into_outcome(result)
    }

    // ---- Page (4) ----

    async fn screenshot(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let label = opt_str(map, "label").unwrap_or("manual");
        let session = self.session(id)?;
        let ctx = self.context(Arc::clone(&session));
        let result = screenshot(&ctx, &self.artifact_writer, label, parse_action_options(map)).await;
        self.log(session.id(), "screenshot", None, None, &result).await;
        Self::into_outcome(result)
    }

    async fn evaluate(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let script = require_str(map, "script")?.to_string();
        let session = self.session(id)?;
        let page = session.page();
        let engine = Arc::clone(&self.engine);
        let session_id = session.id().clone();
        let result = engine
            .execute_action(page.clone(), &session_id, "evaluate", parse_action_options(map), |_attempt| {
                let page = session.page();
                let script = script.clone();
                async move { page.evaluate(&script).await }
            })
            .await;
        self.log(&session_id, "evaluate", None, Some(json!({"script": script})), &result).await;
        Self::into_outcome(result)
    }

    async fn scroll(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let direction = match require_str(map, "direction")? {
            "up" => ScrollDirection::Up,
            "down" => ScrollDirection::Down,
            "left" => ScrollDirection::Left,
            "right" => ScrollDirection::Right,
            other => return Err(RuntimeError::other(format!("unknown scroll direction '{other}'"))),
        };
        let amount = opt_u64(map, "amount").unwrap_or(400) as i64;
        let session = self.session(id)?;
        let ctx = self.context(Arc::clone(&session));
        let result = scroll(&ctx, direction, amount, parse_action_options(map)).await;
        self.log(session.id(), "scroll", None, None, &result).await;
        Self::into_outcome(result)
    }

    async fn session_trace(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let entries = self.trace.session_entries(&SessionId::from(id));
        let stats = self.trace.stats();
        Ok(ToolOutcome::from_details(json!({
            "entries": entries.iter().map(|e| json!({
                "action": e.action,
                "selector": e.selector,
                "ok": e.ok,
                "durationMs": e.duration_ms,
                "retries": e.retries,
                "error": e.error,
            })).collect::<Vec<_>>(),
            "stats": {
                "total": stats.total,
                "ok": stats.ok,
                "failed": stats.failed,
                "p50DurationMs": stats.p50_duration_ms,
                "p95DurationMs": stats.p95_duration_ms,
            },
        })))
    }

    // ---- Handle (3) ----

    async fn register_element(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let selector = parse_selector(require_field(map, "selector")?)?;
        let budget_ms = opt_u64(map, "timeoutMs").unwrap_or(5000);
        let session = self.session(id)?;
        let registry = self.registry_for(session.id());
        let page = session.page();
        let (handle_id, resolution) = registry.register(page.as_ref(), selector, budget_ms).await?;
        Ok(ToolOutcome::from_details(json!({
            "handleId": handle_id.to_string(),
            "strategy": resolution.strategy.name(),
        })))
    }

    async fn resolve_element(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let handle_id = HandleId::from(require_str(map, "handleId")?);
        let wait_state = parse_wait_state(map)?;
        let budget_ms = opt_u64(map, "timeoutMs").unwrap_or(2000);
        let session = self.session(id)?;
        let registry = self.registry_for(session.id());
        let page = session.page();
        let outcome = registry.resolve(page.as_ref(), &handle_id, wait_state, budget_ms).await?;
        Ok(ToolOutcome::from_details(json!({
            "handleId": handle_id.to_string(),
            "strategy": outcome.resolution.strategy.name(),
            "remapped": outcome.remapped,
        })))
    }

    async fn release_element(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let handle_id = HandleId::from(require_str(map, "handleId")?);
        let session = self.session(id)?;
        self.registry_for(session.id()).release(&handle_id);
        Ok(ToolOutcome::from_details(json!({"handleId": handle_id.to_string(), "released": true})))
    }

    // ---- Semantic (3) ----

    async fn set_field(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let identifier = require_str(map, "identifier")?;
        let value = require_str(map, "value")?;
        let session = self.session(id)?;
        let ctx = self.context(Arc::clone(&session));
        let result = set_field(&ctx, identifier, value, parse_action_options(map)).await;
        self.log(session.id(), "setField", Some(identifier.to_string()), Some(json!({"value": value})), &result).await;
        Self::into_outcome(result)
    }

    async fn submit_form(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let scope = opt_str(map, "scope");
        let session = self.session(id)?;
        let ctx = self.context(Arc::clone(&session));
        let result = submit_form(&ctx, scope, parse_action_options(map)).await;
        self.log(session.id(), "submitForm", scope.map(str::to_string), None, &result).await;
        Self::into_outcome(result)
    }

    async fn apply_filter(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let identifier = require_str(map, "identifier")?;
        let value = require_str(map, "value")?;
        let apply_selector = opt_str(map, "applySelector");
        let skip_apply = opt_bool(map, "skipApply").unwrap_or(false);
        let session = self.session(id)?;
        let ctx = self.context(Arc::clone(&session));
        let result = apply_filter(&ctx, identifier, value, apply_selector, skip_apply, parse_action_options(map)).await;
        self.log(session.id(), "applyFilter", Some(identifier.to_string()), Some(json!({"value": value})), &result).await;
        Self::into_outcome(result)
    }

    // ---- Approval (1) ----

    async fn request_approval(&self, args: Value) -> Result<ToolOutcome, RuntimeError> {
        let map = obj(&args)?;
        let id = require_str(map, "sessionId")?;
        let message = require_str(map, "message")?;
        let approved = resolve_approval(self.approval_provider.as_deref(), self.config.approval, id, message).await;
        Ok(ToolOutcome::from_details(json!({"sessionId": id, "approved": approved})))
    }
}

fn parse_target(map: &serde_json::Map<String, Value>) -> Result<Target, RuntimeError> {
    if let Some(handle_id) = opt_str(map, "handleId") {
        return Ok(Target::Handle(HandleId::from(handle_id)));
    }
    Ok(Target::Selector(parse_selector(require_field(map, "selector")?)?))
}

fn target_label(map: &serde_json::Map<String, Value>) -> Option<String> {
    opt_str(map, "handleId")
        .map(|h| format!("handle:{h}"))
        .or_else(|| map.get("selector").map(|s| s.to_string()))
}

fn parse_type_mode(map: &serde_json::Map<String, Value>) -> Result<TypeMode, RuntimeError> {
    match opt_str(map, "mode").unwrap_or("fill") {
        "fill" => Ok(TypeMode::Fill),
        "paste" => Ok(TypeMode::Paste),
        "nativeSetter" => Ok(TypeMode::NativeSetter),
        "sequential" => Ok(TypeMode::Sequential {
            delay_ms: opt_u64(map, "delayMs").unwrap_or(20),
        }),
        other => Err(RuntimeError::other(format!("unknown type mode '{other}'"))),
    }
}
