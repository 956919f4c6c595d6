//! Navigate/reload/back/forward/waitForNavigation (spec §4.5).

use crate::assertions::assert_url_contains;
use crate::context::ActionContext;
use crate::types::NavigateOutcome;
use browser_action_engine::{ActionOptions, ActionResult};
use browser_core_types::RuntimeError;
use std::time::Duration;

fn translate(err: RuntimeError, what: &str) -> RuntimeError {
    match err {
        RuntimeError::Other(message) => RuntimeError::navigation_interrupted(format!("{what}: {message}")),
        other => other,
    }
}

pub async fn navigate(ctx: &ActionContext, url: &str, options: ActionOptions) -> ActionResult<NavigateOutcome> {
    let page = ctx.page();
    let url = url.to_string();
    // Postcondition (spec §4.4/§4.5): the page must actually have landed on
    // the requested url before the attempt counts as successful.
    let options = ActionOptions {
        postcondition: Some(assert_url_contains(url.clone())),
        ..options
    };
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "navigate", options, |_attempt| {
            let page = ctx.page();
            let url = url.clone();
            async move {
                page.goto(&url).await.map_err(|e| translate(e, "navigate"))?;
                page.wait_for_load_state(browser_driver::LoadState::Load, Duration::from_secs(30))
                    .await
                    .map_err(|e| translate(e, "navigate"))?;
                Ok(NavigateOutcome {
                    url: page.url().await,
                    status: None,
                })
            }
        })
        .await
}

pub async fn reload(ctx: &ActionContext, options: ActionOptions) -> ActionResult<NavigateOutcome> {
    let page = ctx.page();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "reload", options, |_attempt| {
            let page = ctx.page();
            async move {
                page.reload().await.map_err(|e| translate(e, "reload"))?;
                Ok(NavigateOutcome {
                    url: page.url().await,
                    status: None,
                })
            }
        })
        .await
}

pub async fn go_back(ctx: &ActionContext, options: ActionOptions) -> ActionResult<NavigateOutcome> {
    let page = ctx.page();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "back", options, |_attempt| {
            let page = ctx.page();
            async move {
                page.go_back().await.map_err(|e| translate(e, "back"))?;
                Ok(NavigateOutcome {
                    url: page.url().await,
                    status: None,
                })
            }
        })
        .await
}

pub async fn go_forward(ctx: &ActionContext, options: ActionOptions) -> ActionResult<NavigateOutcome> {
    let page = ctx.page();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "forward", options, |_attempt| {
            let page = ctx.page();
            async move {
                page.go_forward().await.map_err(|e| translate(e, "forward"))?;
                Ok(NavigateOutcome {
                    url: page.url().await,
                    status: None,
                })
            }
        })
        .await
}

pub async fn wait_for_navigation(ctx: &ActionContext, url_substring: &str, timeout: Duration, options: ActionOptions) -> ActionResult<NavigateOutcome> {
    let page = ctx.page();
    let url_substring = url_substring.to_string();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "waitForNavigation", options, |attempt| {
            let page = ctx.page();
            let url_substring = url_substring.clone();
            async move {
                page.wait_for_url(&url_substring, timeout).await?;
                ctx.record_wait(&attempt, format!("url contains '{url_substring}'"));
                Ok(NavigateOutcome {
                    url: page.url().await,
                    status: None,
                })
            }
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_action_engine::{ActionEngine, NoopArtifactSink};
    use browser_action_trace::ActionTrace;
    use browser_driver::fake::FakeBrowser;
    use browser_handle_registry::HandleRegistry;
    use browser_resilience::{PopupDismisser, PopupDismisserConfig};
    use browser_session::BrowserSession;
    use browser_core_types::SessionId;
    use std::sync::Arc;

    async fn context() -> ActionContext {
        let browser = FakeBrowser::new();
        let context = browser.new_context().await.unwrap();
        let page = context.new_page().await.unwrap();
        let session = Arc::new(BrowserSession::new(SessionId::new(), context, page, None));
        let engine = Arc::new(ActionEngine::new(
            Arc::new(ActionTrace::new()),
            Arc::new(PopupDismisser::new(PopupDismisserConfig::default())),
            Arc::new(NoopArtifactSink),
        ));
        ActionContext::new(session, engine, Arc::new(HandleRegistry::new()))
    }

    #[tokio::test]
    async fn navigate_updates_url() {
        let ctx = context().await;
        let result = navigate(&ctx, "https://example.com", ActionOptions::default()).await;
        assert!(result.ok);
        assert_eq!(result.data.unwrap().url, "https://example.com");
    }
}
