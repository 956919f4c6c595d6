//! Semantic actions: fallback-chain primitives built on top of the
//! selector/action primitives below (spec §4.5).

use crate::context::ActionContext;
use crate::interaction::{click, type_text};
use crate::types::{Target, TypeMode};
use browser_action_engine::{ActionOptions, ActionResult};
use browser_core_types::RuntimeError;
use browser_selector_resolver::{Selector, SelectorStrategy, WaitState};

fn escape(value: &str) -> String {
    value.replace('"', "\\\"")
}

/// `input/textarea/select[name=X]` -> `[placeholder=X]` -> `[aria-label=X]`
/// -> `label(X)`, first candidate with `count()>0` wins.
async fn resolve_field_chain(ctx: &ActionContext, identifier: &str) -> Result<Target, RuntimeError> {
    let page = ctx.page();
    let escaped = escape(identifier);
    let candidates = [
        format!("input[name=\"{escaped}\"], textarea[name=\"{escaped}\"], select[name=\"{escaped}\"]"),
        format!("[placeholder=\"{escaped}\"]"),
        format!("[aria-label=\"{escaped}\"]"),
    ];
    for candidate in &candidates {
        if !page.query_css(candidate).await.is_empty() {
            return Ok(Target::Selector(candidate.as_str().into()));
        }
    }
    if !page.get_by_label(identifier).await.is_empty() {
        return Ok(Target::Selector(Selector::Single(SelectorStrategy::Label {
            text: identifier.to_string(),
        })));
    }
    Ok(Target::Selector(
        Selector::chain(vec![
            SelectorStrategy::Css {
                selector: candidates[0].clone(),
            },
            SelectorStrategy::Css {
                selector: candidates[1].clone(),
            },
            SelectorStrategy::Css {
                selector: candidates[2].clone(),
            },
            SelectorStrategy::Label {
                text: identifier.to_string(),
            },
        ])
        .expect("non-empty chain"),
    ))
}

pub async fn set_field(ctx: &ActionContext, identifier: &str, value: &str, options: ActionOptions) -> ActionResult<()> {
    match resolve_field_chain(ctx, identifier).await {
        Ok(target) => type_text(ctx, target, value, TypeMode::Fill, options).await,
        Err(err) => ActionResult::failure(&err, 0, 0, None),
    }
}

fn default_submit_chain() -> Target {
    Target::Selector(
        Selector::chain(vec![
            SelectorStrategy::Css {
                selector: "button[type=submit]".to_string(),
            },
            SelectorStrategy::Css {
                selector: "input[type=submit]".to_string(),
            },
            SelectorStrategy::Aria {
                role: "button".to_string(),
                name: Some("Submit".to_string()),
            },
            SelectorStrategy::Css {
                selector: "button".to_string(),
            },
        ])
        .expect("non-empty chain"),
    )
}

pub async fn submit_form(ctx: &ActionContext, scope: Option<&str>, options: ActionOptions) -> ActionResult<()> {
    let target = match scope {
        Some(selector) => Target::Selector(format!("{selector} button[type=submit]").as_str().into()),
        None => default_submit_chain(),
    };
    click(ctx, target, options).await
}

fn default_apply_chain() -> Target {
    Target::Selector(
        Selector::chain(vec![
            SelectorStrategy::Css {
                selector: "button[type=submit]".to_string(),
            },
            SelectorStrategy::Aria {
                role: "button".to_string(),
                name: Some("Apply".to_string()),
            },
            SelectorStrategy::Aria {
                role: "button".to_string(),
                name: Some("Search".to_string()),
            },
            SelectorStrategy::Aria {
                role: "button".to_string(),
                name: Some("Filter".to_string()),
            },
        ])
        .expect("non-empty chain"),
    )
}

/// `setField` then an apply click, unless `skip_apply` opts out.
pub async fn apply_filter(ctx: &ActionContext, identifier: &str, value: &str, apply_selector: Option<&str>, skip_apply: bool, options: ActionOptions) -> ActionResult<()> {
    let fill_result = set_field(ctx, identifier, value, options.clone()).await;
    if !fill_result.ok || skip_apply {
        return fill_result;
    }
    let target = match apply_selector {
        Some(selector) => Target::Selector(selector.into()),
        None => default_apply_chain(),
    };
    click(ctx, target, options).await
}

/// Types `query` sequentially, then clicks the matching option via a
/// fallback chain: aria role `option` -> exact text -> listbox option ->
/// generic list item.
pub async fn select_autocomplete(ctx: &ActionContext, input: Target, query: &str, options: ActionOptions) -> ActionResult<()> {
    let typed = type_text(ctx, input, query, TypeMode::Sequential { delay_ms: 20 }, options.clone()).await;
    if !typed.ok {
        return ActionResult::failure(&RuntimeError::other(typed.error.unwrap_or_default()), typed.retries, typed.duration_ms, None);
    }
    let option_target = Target::Selector(
        Selector::chain(vec![
            SelectorStrategy::Aria {
                role: "option".to_string(),
                name: Some(query.to_string()),
            },
            SelectorStrategy::Text {
                text: query.to_string(),
                exact: true,
            },
            SelectorStrategy::Css {
                selector: "[role=listbox] [role=option]".to_string(),
            },
            SelectorStrategy::Css {
                selector: "li".to_string(),
            },
        ])
        .expect("non-empty chain"),
    );
    click(ctx, option_target, options).await
}

/// Sets the value with the native setter, presses `Enter` then `Escape` to
/// close date popovers, and verifies the input ends up non-empty.
pub async fn set_date_field(ctx: &ActionContext, target: Target, value: &str, options: ActionOptions) -> ActionResult<()> {
    let page = ctx.page();
    let value = value.to_string();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "setDateField", options, |attempt| {
            let target = target.clone();
            let value = value.clone();
            async move {
                let handle = ctx.resolve(&attempt, &target, WaitState::Visible, 5000).await?;
                let page = ctx.page();
                page.set_value(&handle, &value, browser_driver::SetValueMode::NativeSetter).await?;
                page.press_key(Some(&handle), "Enter").await?;
                page.press_key(Some(&handle), "Escape").await?;
                let actual = page.get_attribute(&handle, "value").await.unwrap_or_default();
                if actual.is_empty() {
                    return Err(RuntimeError::assertion_failed("date field is empty after set"));
                }
                Ok(())
            }
        })
        .await
}
