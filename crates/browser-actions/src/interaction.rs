//! Click/type/select/check/hover/dragAndDrop/fill(map) (spec §4.5).

use crate::context::ActionContext;
use crate::types::{FillMapOutcome, Target, TypeMode};
use browser_action_engine::{ActionOptions, ActionResult};
use browser_core_types::RuntimeError;
use browser_driver::SetValueMode;
use browser_selector_resolver::WaitState;
use std::time::Duration;

const DEDUP_WINDOW: Duration = Duration::from_millis(500);

fn selector_key(target: &Target) -> String {
    match target {
        Target::Selector(selector) => format!("{selector:?}"),
        Target::Handle(id) => format!("handle:{id}"),
    }
}

pub async fn click(ctx: &ActionContext, target: Target, options: ActionOptions) -> ActionResult<()> {
    let page = ctx.page();
    let key = selector_key(&target);
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "click", options, |attempt| {
            let target = target.clone();
            let key = key.clone();
            async move {
                if ctx.dedup.check_and_record(&key, DEDUP_WINDOW) {
                    return Ok(());
                }
                ctx.wait_stable().await;
                let handle = ctx.resolve(&attempt, &target, WaitState::Visible, 5000).await?;
                ctx.page().scroll_into_view(&handle).await?;
                ctx.page().click(&handle).await?;
                ctx.record_event(&attempt, "click");
                ctx.wait_stable().await;
                Ok(())
            }
        })
        .await
}

pub async fn type_text(ctx: &ActionContext, target: Target, text: &str, mode: TypeMode, options: ActionOptions) -> ActionResult<()> {
    let page = ctx.page();
    let text = text.to_string();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "type", options, |attempt| {
            let target = target.clone();
            let text = text.clone();
            async move {
                let handle = ctx.resolve(&attempt, &target, WaitState::Visible, 5000).await?;
                let page = ctx.page();
                match mode {
                    TypeMode::Fill => {
                        page.set_value(&handle, &text, SetValueMode::Fill).await?;
                        ctx.record_event(&attempt, "input");
                        ctx.record_event(&attempt, "change");
                        let actual = page.get_attribute(&handle, "value").await.or(page.text_content(&handle).await);
                        ctx.record_assertion(&attempt, "fillReadback");
                        if actual.as_deref() != Some(text.as_str()) {
                            return Err(RuntimeError::assertion_failed(format!(
                                "fill readback mismatch: expected '{text}'"
                            )));
                        }
                    }
                    TypeMode::Sequential { delay_ms } => {
                        page.type_sequential(&handle, &text, delay_ms).await?;
                        ctx.record_event(&attempt, "keydown");
                    }
                    TypeMode::Paste => {
                        let result = page.set_value(&handle, &text, SetValueMode::Paste).await;
                        if result.is_err() {
                            page.set_value(&handle, &text, SetValueMode::Fill).await?;
                            ctx.record_event(&attempt, "input");
                            ctx.record_event(&attempt, "change");
                        } else {
                            ctx.record_event(&attempt, "paste");
                        }
                    }
                    TypeMode::NativeSetter => {
                        page.set_value(&handle, &text, SetValueMode::NativeSetter).await?;
                        ctx.record_event(&attempt, "input");
                        ctx.record_event(&attempt, "change");
                        ctx.record_event(&attempt, "blur");
                    }
                }
                Ok(())
            }
        })
        .await
}

pub async fn select(ctx: &ActionContext, target: Target, value: &str, options: ActionOptions) -> ActionResult<String> {
    let page = ctx.page();
    let value = value.to_string();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "select", options, |attempt| {
            let target = target.clone();
            let value = value.clone();
            async move {
                let handle = ctx.resolve(&attempt, &target, WaitState::Visible, 5000).await?;
                let page = ctx.page();
                let label = page.select_option(&handle, &value).await?;
                let readback = page.get_attribute(&handle, "value").await;
                ctx.record_assertion(&attempt, "selectReadback");
                if readback.as_deref() != Some(value.as_str()) {
                    return Err(RuntimeError::assertion_failed("select readback mismatch"));
                }
                Ok(label)
            }
        })
        .await
}

async fn set_checked(ctx: &ActionContext, target: Target, checked: bool, action_name: &'static str, options: ActionOptions) -> ActionResult<()> {
    let page = ctx.page();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), action_name, options, |attempt| {
            let target = target.clone();
            async move {
                let handle = ctx.resolve(&attempt, &target, WaitState::Visible, 5000).await?;
                let page = ctx.page();
                page.set_checked(&handle, checked).await?;
                let observed = page.element_snapshot(&handle).await.map(|s| s.attached).unwrap_or(false);
                ctx.record_assertion(&attempt, "checkedReadback");
                if !observed {
                    return Err(RuntimeError::assertion_failed("element vanished after set_checked"));
                }
                Ok(())
            }
        })
        .await
}

pub async fn check(ctx: &ActionContext, target: Target, options: ActionOptions) -> ActionResult<()> {
    set_checked(ctx, target, true, "check", options).await
}

pub async fn uncheck(ctx: &ActionContext, target: Target, options: ActionOptions) -> ActionResult<()> {
    set_checked(ctx, target, false, "uncheck", options).await
}

pub async fn hover(ctx: &ActionContext, target: Target, options: ActionOptions) -> ActionResult<()> {
    let page = ctx.page();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "hover", options, |attempt| {
            let target = target.clone();
            async move {
                ctx.wait_stable().await;
                let handle = ctx.resolve(&attempt, &target, WaitState::Visible, 5000).await?;
                ctx.page().hover(&handle).await?;
                ctx.wait_stable().await;
                Ok(())
            }
        })
        .await
}

pub async fn drag_and_drop(ctx: &ActionContext, from: Target, to: Target, options: ActionOptions) -> ActionResult<()> {
    let page = ctx.page();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "dragAndDrop", options, |attempt| {
            let from = from.clone();
            let to = to.clone();
            async move {
                ctx.wait_stable().await;
                let from_handle = ctx.resolve(&attempt, &from, WaitState::Visible, 5000).await?;
                let to_handle = ctx.resolve(&attempt, &to, WaitState::Visible, 5000).await?;
                ctx.page().drag_and_drop(&from_handle, &to_handle).await?;
                ctx.wait_stable().await;
                Ok(())
            }
        })
        .await
}

/// Fills each `(target, value)` pair; any single failure aborts the whole
/// batch so the engine retries it from the start (spec §4.5, Fill(map)).
pub async fn fill_map(ctx: &ActionContext, entries: Vec<(Target, String)>, options: ActionOptions) -> ActionResult<FillMapOutcome> {
    let page = ctx.page();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "fillMap", options, |attempt| {
            let entries = entries.clone();
            async move {
                let mut filled = Vec::new();
                for (target, value) in &entries {
                    let handle = ctx.resolve(&attempt, target, WaitState::Visible, 5000).await?;
                    let page = ctx.page();
                    page.set_value(&handle, value, SetValueMode::Fill).await?;
                    let actual = page.get_attribute(&handle, "value").await;
                    ctx.record_assertion(&attempt, "fillMapReadback");
                    if actual.as_deref() != Some(value.as_str()) {
                        return Err(RuntimeError::assertion_failed(format!(
                            "fill_map readback mismatch for entry {}",
                            filled.len()
                        )));
                    }
                    filled.push(selector_key(target));
                }
                Ok(FillMapOutcome { filled, failed: Vec::new() })
            }
        })
        .await
}
