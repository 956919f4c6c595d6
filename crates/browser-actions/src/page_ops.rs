//! screenshot/pdf/scroll/getPageState (spec §4.5): artifacts are written as
//! `{sessionId}/{epochMs}-{label}.{ext}`.

use crate::context::ActionContext;
use crate::types::{PageState, ScrollDirection};
use browser_action_engine::{ActionOptions, ActionResult};
use browser_core_types::RuntimeError;
use browser_persistence::ArtifactWriter;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

pub async fn screenshot(ctx: &ActionContext, writer: &Arc<dyn ArtifactWriter>, label: &str, options: ActionOptions) -> ActionResult<String> {
    let page = ctx.page();
    let label = label.to_string();
    let writer = Arc::clone(writer);
    let session_id = ctx.session.id().to_string();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "screenshot", options, |_attempt| {
            let label = label.clone();
            let writer = Arc::clone(&writer);
            let session_id = session_id.clone();
            async move {
                let bytes = ctx.page().screenshot().await?;
                writer.write(&session_id, bytes, &label, "png", epoch_ms()).await
            }
        })
        .await
}

pub async fn pdf(ctx: &ActionContext, writer: &Arc<dyn ArtifactWriter>, label: &str, options: ActionOptions) -> ActionResult<String> {
    let page = ctx.page();
    let label = label.to_string();
    let writer = Arc::clone(writer);
    let session_id = ctx.session.id().to_string();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "pdf", options, |_attempt| {
            let label = label.clone();
            let writer = Arc::clone(&writer);
            let session_id = session_id.clone();
            async move {
                let bytes = ctx.page().pdf().await?;
                writer.write(&session_id, bytes, &label, "pdf", epoch_ms()).await
            }
        })
        .await
}

pub async fn scroll(ctx: &ActionContext, direction: ScrollDirection, amount: i64, options: ActionOptions) -> ActionResult<()> {
    let page = ctx.page();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "scroll", options, |_attempt| async move {
            let (dx, dy) = direction.delta(amount);
            ctx.page().scroll_by(dx, dy).await?;
            Ok::<_, RuntimeError>(())
        })
        .await
}

pub async fn get_page_state(ctx: &ActionContext, options: ActionOptions) -> ActionResult<PageState> {
    let page = ctx.page();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "getPageState", options, |_attempt| async move {
            let page = ctx.page();
            let ready_state = page.ready_state().await;
            Ok::<_, RuntimeError>(PageState {
                url: page.url().await,
                title: page.title().await,
                is_loading: ready_state != "complete",
                ready_state,
            })
        })
        .await
}
