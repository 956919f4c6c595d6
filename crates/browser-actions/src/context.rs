//! Wires a session to the engine, handle registry, and dedup guard every
//! primitive in this crate needs (spec §4.5's "every primitive ... runs
//! inside the engine envelope").

use crate::types::Target;
use browser_action_engine::{ActionEngine, AttemptContext, DedupGuard};
use browser_action_trace::SelectorResolvedMeta;
use browser_core_types::RuntimeError;
use browser_driver::{ElementHandle, Page};
use browser_handle_registry::HandleRegistry;
use browser_resilience::{wait_for_dom_stability, StabilityConfig};
use browser_selector_resolver::{resolve as resolve_selector, Selector, WaitState};
use browser_session::BrowserSession;
use std::sync::Arc;

pub struct ActionContext {
    pub session: Arc<BrowserSession>,
    pub engine: Arc<ActionEngine>,
    pub registry: Arc<HandleRegistry>,
    pub dedup: Arc<DedupGuard>,
    pub stability: StabilityConfig,
}

impl ActionContext {
    pub fn new(session: Arc<BrowserSession>, engine: Arc<ActionEngine>, registry: Arc<HandleRegistry>) -> Self {
        Self::with_dedup(session, engine, registry, Arc::new(DedupGuard::new()))
    }

    /// Like [`Self::new`], but reuses a dedup guard kept alive across calls
    /// so the duplicate-click window (spec §4.5) spans separate tool
    /// invocations rather than resetting every time.
    pub fn with_dedup(session: Arc<BrowserSession>, engine: Arc<ActionEngine>, registry: Arc<HandleRegistry>, dedup: Arc<DedupGuard>) -> Self {
        Self {
            session,
            engine,
            registry,
            dedup,
            stability: StabilityConfig::default(),
        }
    }

    pub fn page(&self) -> Arc<dyn Page> {
        self.session.page()
    }

    pub async fn wait_stable(&self) {
        wait_for_dom_stability(self.page().as_ref(), &self.stability).await;
    }

    /// Resolves `target` against the current page, recording the selector
    /// string and resolution metadata onto `ctx`'s trace scratch space.
    pub async fn resolve(
        &self,
        ctx: &AttemptContext,
        target: &Target,
        wait_state: WaitState,
        budget_ms: u64,
    ) -> Result<ElementHandle, RuntimeError> {
        let page = self.page();
        let (locator, selector_label, meta) = match target {
            Target::Selector(selector) => {
                let resolution = resolve_selector(page.as_ref(), selector, wait_state, budget_ms).await?;
                let meta = SelectorResolvedMeta {
                    strategy: resolution.strategy.name().to_string(),
                    strategy_index: resolution.strategy_index,
                    chain_length: resolution.chain_length,
                    resolution_ms: resolution.resolution_ms,
                };
                (resolution.locator, selector_label(selector), meta)
            }
            Target::Handle(handle_id) => {
                let outcome = self.registry.resolve(page.as_ref(), handle_id, wait_state, budget_ms).await?;
                let meta = SelectorResolvedMeta {
                    strategy: outcome.resolution.strategy.name().to_string(),
                    strategy_index: outcome.resolution.strategy_index,
                    chain_length: outcome.resolution.chain_length,
                    resolution_ms: outcome.resolution.resolution_ms,
                };
                (outcome.resolution.locator, format!("#handle:{handle_id}"), meta)
            }
        };
        let mut trace_meta = ctx.trace_meta.lock();
        trace_meta.selector = Some(selector_label);
        trace_meta.selector_resolved = Some(meta);
        Ok(locator)
    }

    pub fn record_wait(&self, ctx: &AttemptContext, label: impl Into<String>) {
        ctx.trace_meta.lock().waits_performed.push(label.into());
    }

    pub fn record_event(&self, ctx: &AttemptContext, label: impl Into<String>) {
        ctx.trace_meta.lock().events_dispatched.push(label.into());
    }

    pub fn record_assertion(&self, ctx: &AttemptContext, label: impl Into<String>) {
        ctx.trace_meta.lock().assertions_checked.push(label.into());
    }
}

fn selector_label(selector: &Selector) -> String {
    match selector {
        Selector::Css(s) => s.clone(),
        Selector::Single(strategy) => strategy.name().to_string(),
        Selector::Chain(strategies) => strategies
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(" -> "),
    }
}
