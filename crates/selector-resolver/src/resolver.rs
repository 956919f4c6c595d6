//! Fallback-chain resolution with per-strategy wait capping (spec §4.2).

use crate::types::{Selector, SelectorResolution, SelectorStrategy, WaitState};
use browser_core_types::RuntimeError;
use browser_driver::{ElementHandle, Page};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const PER_STRATEGY_CAP_MS: u64 = 2000;

async fn query_once(page: &dyn Page, strategy: &SelectorStrategy) -> Vec<ElementHandle> {
    match strategy {
        SelectorStrategy::Css { selector } => page.query_css(selector).await,
        SelectorStrategy::XPath { expression } => page.query_xpath(expression).await,
        SelectorStrategy::Aria { role, name } => page.get_by_role(role, name.as_deref()).await,
        SelectorStrategy::Label { text } => page.get_by_label(text).await,
        SelectorStrategy::Text { text, exact } => page.get_by_text(text, *exact).await,
        SelectorStrategy::TestId { id } => page.get_by_test_id(id).await,
    }
}

async fn matches_presence(page: &dyn Page, handle: &ElementHandle, wait_state: WaitState) -> bool {
    let snapshot = match page.element_snapshot(handle).await {
        Some(s) => s,
        None => return false,
    };
    match wait_state {
        WaitState::Visible => snapshot.attached && snapshot.visible,
        WaitState::Attached => snapshot.attached,
        WaitState::Hidden | WaitState::Detached => false,
    }
}

async fn matches_absence(page: &dyn Page, handle: &ElementHandle, wait_state: WaitState) -> bool {
    match page.element_snapshot(handle).await {
        None => true,
        Some(snapshot) => match wait_state {
            WaitState::Detached => !snapshot.attached,
            WaitState::Hidden => !snapshot.attached || !snapshot.visible,
            _ => false,
        },
    }
}

/// Resolves `selector` against `page`, honoring `wait_state` and an overall
/// `budget_ms`. Returns the winning strategy's index and elapsed time so
/// callers (the handle registry, the action engine) can reason about which
/// fallback actually fired.
pub async fn resolve(
    page: &dyn Page,
    selector: &Selector,
    wait_state: WaitState,
    budget_ms: u64,
) -> Result<SelectorResolution, RuntimeError> {
    let strategies = selector.strategies();
    let chain_length = strategies.len();
    if chain_length == 0 {
        return Err(RuntimeError::target_not_found("selector chain is empty"));
    }

    let start = Instant::now();
    let deadline = start + Duration::from_millis(budget_ms);

    if !wait_state.is_presence() {
        let strategy = &strategies[0];
        loop {
            let candidates = query_once(page, strategy).await;
            let mut all_absent = true;
            for handle in &candidates {
                if !matches_absence(page, handle, wait_state).await {
                    all_absent = false;
                    break;
                }
            }
            if all_absent {
                return Ok(SelectorResolution {
                    locator: candidates
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| ElementHandle("__absent__".to_string())),
                    strategy: strategy.clone(),
                    strategy_index: 0,
                    resolution_ms: start.elapsed().as_millis() as u64,
                    chain_length,
                });
            }
            if Instant::now() >= deadline {
                return Err(RuntimeError::target_not_found(format!(
                    "element still present for {} wait",
                    strategy.name()
                )));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    for (index, strategy) in strategies.iter().enumerate() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        let per_strategy_cap = remaining.min(Duration::from_millis(PER_STRATEGY_CAP_MS));
        let strategy_deadline = Instant::now() + per_strategy_cap;

        loop {
            let candidates = query_once(page, strategy).await;
            for handle in &candidates {
                if matches_presence(page, handle, wait_state).await {
                    debug!(strategy = strategy.name(), index, "selector resolved");
                    return Ok(SelectorResolution {
                        locator: handle.clone(),
                        strategy: strategy.clone(),
                        strategy_index: index,
                        resolution_ms: start.elapsed().as_millis() as u64,
                        chain_length,
                    });
                }
            }
            if Instant::now() >= strategy_deadline {
                break;
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    Err(RuntimeError::target_not_found(format!(
        "no strategy in a chain of {chain_length} matched within {budget_ms}ms"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_driver::fake::{FakeElement, FakePage};

    #[tokio::test]
    async fn plain_css_resolves_immediately() {
        let page = FakePage::new();
        page.seed(vec![FakeElement::new("button").attr("id", "go")]);
        let selector: Selector = "#go".into();
        let res = resolve(page.as_ref(), &selector, WaitState::Visible, 1000)
            .await
            .unwrap();
        assert_eq!(res.strategy_index, 0);
        assert_eq!(res.chain_length, 1);
    }

    #[tokio::test]
    async fn chain_falls_back_to_second_strategy() {
        let page = FakePage::new();
        page.seed(vec![FakeElement::new("button").aria_label("Submit").role("button")]);
        let selector = Selector::chain(vec![
            SelectorStrategy::Css {
                selector: "#missing".to_string(),
            },
            SelectorStrategy::Aria {
                role: "button".to_string(),
                name: Some("Submit".to_string()),
            },
        ])
        .unwrap();
        let res = resolve(page.as_ref(), &selector, WaitState::Visible, 1000)
            .await
            .unwrap();
        assert_eq!(res.strategy_index, 1);
        assert_eq!(res.chain_length, 2);
    }

    #[tokio::test]
    async fn empty_budget_exhausted_fails() {
        let page = FakePage::new();
        let selector: Selector = "#nope".into();
        let err = resolve(page.as_ref(), &selector, WaitState::Visible, 20)
            .await
            .unwrap_err();
        assert_eq!(err.kind().unwrap().code(), "TARGET_NOT_FOUND");
    }

    #[tokio::test]
    async fn waiting_for_hidden_probes_only_first_strategy() {
        let page = FakePage::new();
        page.seed(vec![FakeElement::new("div").attr("id", "modal").hidden()]);
        let selector = Selector::chain(vec![
            SelectorStrategy::Css {
                selector: "#modal".to_string(),
            },
            SelectorStrategy::Text {
                text: "unused".to_string(),
                exact: false,
            },
        ])
        .unwrap();
        let res = resolve(page.as_ref(), &selector, WaitState::Hidden, 200)
            .await
            .unwrap();
        assert_eq!(res.strategy_index, 0);
    }
}
