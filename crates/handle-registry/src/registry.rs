//! Per-session handle registry (spec §4.6): stable IDs over selector
//! strategies, with last-winning-strategy memoisation so the steady-state
//! path costs one resolution attempt.

use browser_core_types::{HandleId, RuntimeError};
use browser_driver::Page;
use browser_selector_resolver::{resolve, Selector, SelectorResolution, SelectorStrategy, WaitState};
use dashmap::DashMap;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct HandleRecord {
    pub original_selector: Selector,
    pub last_winning_strategy: SelectorStrategy,
    pub remap_count: u32,
}

pub struct ResolveOutcome {
    pub resolution: SelectorResolution,
    pub remapped: bool,
}

pub struct HandleRegistry {
    entries: DashMap<HandleId, HandleRecord>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Resolves once (for `attached` presence) and stores the winning
    /// strategy as the record's `last_winning_strategy`.
    pub async fn register(
        &self,
        page: &dyn Page,
        selector: Selector,
        budget_ms: u64,
    ) -> Result<(HandleId, SelectorResolution), RuntimeError> {
        let resolution = resolve(page, &selector, WaitState::Attached, budget_ms).await?;
        let handle_id = HandleId::new();
        self.entries.insert(
            handle_id.clone(),
            HandleRecord {
                original_selector: selector,
                last_winning_strategy: resolution.strategy.clone(),
                remap_count: 0,
            },
        );
        Ok((handle_id, resolution))
    }

    /// Re-resolves a handle, trying its last-winning strategy first. If the
    /// strategy that wins this time differs from the stored one, stores the
    /// new one and bumps `remap_count`; the caller learns `remapped=true`.
    pub async fn resolve(
        &self,
        page: &dyn Page,
        handle_id: &HandleId,
        wait_state: WaitState,
        budget_ms: u64,
    ) -> Result<ResolveOutcome, RuntimeError> {
        let record = self
            .entries
            .get(handle_id)
            .map(|r| r.clone())
            .ok_or_else(|| RuntimeError::stale_element(format!("unknown handle {handle_id}")))?;

        let prioritised = prioritise(&record);
        let selector = Selector::chain(prioritised).unwrap_or(record.original_selector.clone());

        let resolution = resolve(page, &selector, wait_state, budget_ms).await?;

        let remapped = resolution.strategy != record.last_winning_strategy;
        if remapped {
            debug!(
                handle = handle_id.as_str(),
                old = record.last_winning_strategy.name(),
                new = resolution.strategy.name(),
                "handle remapped to a new winning strategy"
            );
            if let Some(mut entry) = self.entries.get_mut(handle_id) {
                entry.last_winning_strategy = resolution.strategy.clone();
                entry.remap_count += 1;
            }
        }

        Ok(ResolveOutcome { resolution, remapped })
    }

    pub fn release(&self, handle_id: &HandleId) {
        self.entries.remove(handle_id);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn get(&self, handle_id: &HandleId) -> Option<HandleRecord> {
        self.entries.get(handle_id).map(|r| r.clone())
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// `[lastWinningStrategy, ...original \ lastWinningStrategy]`
fn prioritise(record: &HandleRecord) -> Vec<SelectorStrategy> {
    let mut ordered = vec![record.last_winning_strategy.clone()];
    for strategy in record.original_selector.strategies() {
        if strategy != record.last_winning_strategy {
            ordered.push(strategy);
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_driver::fake::{FakeElement, FakePage};

    #[tokio::test]
    async fn register_then_resolve_reuses_winning_strategy() {
        let page = FakePage::new();
        page.seed(vec![FakeElement::new("button").attr("id", "go")]);
        let registry = HandleRegistry::new();
        let (handle, _) = registry
            .register(page.as_ref(), "#go".into(), 1000)
            .await
            .unwrap();

        let outcome = registry
            .resolve(page.as_ref(), &handle, WaitState::Visible, 1000)
            .await
            .unwrap();
        assert!(!outcome.remapped);
        assert_eq!(registry.get(&handle).unwrap().remap_count, 0);
    }

    #[tokio::test]
    async fn remap_increments_when_winning_strategy_changes() {
        let page = FakePage::new();
        page.seed(vec![FakeElement::new("button")
            .attr("id", "go")
            .aria_label("Go")
            .role("button")]);
        let registry = HandleRegistry::new();
        let selector = Selector::chain(vec![
            SelectorStrategy::Css {
                selector: "#go".to_string(),
            },
            SelectorStrategy::Aria {
                role: "button".to_string(),
                name: Some("Go".to_string()),
            },
        ])
        .unwrap();
        let (handle, _) = registry.register(page.as_ref(), selector, 1000).await.unwrap();

        page.remove("#go");
        page.seed(vec![FakeElement::new("button").aria_label("Go").role("button")]);

        let outcome = registry
            .resolve(page.as_ref(), &handle, WaitState::Visible, 1000)
            .await
            .unwrap();
        assert!(outcome.remapped);
        assert_eq!(registry.get(&handle).unwrap().remap_count, 1);
    }

    #[tokio::test]
    async fn unknown_handle_is_stale() {
        let page = FakePage::new();
        let registry = HandleRegistry::new();
        let err = registry
            .resolve(page.as_ref(), &HandleId::new(), WaitState::Visible, 100)
            .await
            .unwrap_err();
        assert_eq!(err.kind().unwrap().code(), "STALE_ELEMENT");
    }
}
