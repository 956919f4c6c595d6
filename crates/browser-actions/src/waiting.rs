//! Thin adapters over the driver's waits; each records a `waitsPerformed`
//! trace entry (spec §4.5).

use crate::context::ActionContext;
use crate::types::Target;
use browser_action_engine::{ActionOptions, ActionResult};
use browser_core_types::RuntimeError;
use browser_driver::Page;
use browser_selector_resolver::WaitState;
use std::time::{Duration, Instant};

pub async fn wait_for_selector(ctx: &ActionContext, target: Target, wait_state: WaitState, timeout: Duration, options: ActionOptions) -> ActionResult<()> {
    let page = ctx.page();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "waitForSelector", options, |attempt| {
            let target = target.clone();
            async move {
                ctx.resolve(&attempt, &target, wait_state, timeout.as_millis() as u64).await?;
                ctx.record_wait(&attempt, format!("selector {wait_state:?}"));
                Ok(())
            }
        })
        .await
}

/// Polls a caller-supplied predicate until it returns `true` or `timeout`
/// elapses.
pub async fn wait_for_condition<F, Fut>(ctx: &ActionContext, label: &str, timeout: Duration, predicate: F, options: ActionOptions) -> ActionResult<()>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: std::future::Future<Output = bool> + Send,
{
    let page = ctx.page();
    let label = label.to_string();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "waitForCondition", options, |attempt| {
            let label = label.clone();
            let predicate = &predicate;
            async move {
                let deadline = Instant::now() + timeout;
                loop {
                    if predicate().await {
                        ctx.record_wait(&attempt, format!("condition '{label}'"));
                        return Ok(());
                    }
                    if Instant::now() >= deadline {
                        return Err(RuntimeError::timeout_exceeded(format!("condition '{label}' never became true")));
                    }
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
            }
        })
        .await
}

pub async fn wait_for_network_idle(ctx: &ActionContext, timeout: Duration, options: ActionOptions) -> ActionResult<()> {
    let page = ctx.page();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "waitForNetworkIdle", options, |attempt| async move {
            ctx.page().wait_for_network_idle(timeout).await?;
            ctx.record_wait(&attempt, "network idle");
            Ok(())
        })
        .await
}

pub async fn wait_for_url(ctx: &ActionContext, substring: &str, timeout: Duration, options: ActionOptions) -> ActionResult<()> {
    let page = ctx.page();
    let substring = substring.to_string();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "waitForUrl", options, |attempt| {
            let substring = substring.clone();
            async move {
                ctx.page().wait_for_url(&substring, timeout).await?;
                ctx.record_wait(&attempt, format!("url contains '{substring}'"));
                Ok(())
            }
        })
        .await
}
