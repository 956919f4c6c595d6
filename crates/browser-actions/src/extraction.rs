//! getText/getAttribute/getAll/getPageContent and structured extraction
//! (spec §4.5).

use crate::context::ActionContext;
use crate::types::{ExtractionSchema, FieldType, Provenance, StructuredExtraction, Target};
use browser_action_engine::{ActionOptions, ActionResult};
use browser_core_types::RuntimeError;
use browser_selector_resolver::WaitState;
use std::collections::HashMap;

async fn read_source(page: &dyn browser_driver::Page, handle: &browser_driver::ElementHandle, source: &str) -> Option<String> {
    match source {
        "textContent" => page.text_content(handle).await,
        "innerHTML" => page.inner_html(handle).await,
        attr => page.get_attribute(handle, attr).await,
    }
}

fn coerce(raw: Option<String>, field_type: FieldType) -> Result<serde_json::Value, RuntimeError> {
    let raw = raw.unwrap_or_default();
    match field_type {
        FieldType::String => Ok(serde_json::Value::String(raw)),
        FieldType::Boolean => Ok(serde_json::Value::Bool(matches!(raw.as_str(), "true" | "1" | "checked" | "on"))),
        FieldType::Number => raw
            .parse::<f64>()
            .map(|n| serde_json::json!(n))
            .map_err(|_| RuntimeError::assertion_failed(format!("'{raw}' is not a valid number"))),
        FieldType::Integer => raw
            .parse::<i64>()
            .map(|n| serde_json::json!(n))
            .map_err(|_| RuntimeError::assertion_failed(format!("'{raw}' is not a valid integer"))),
    }
}

pub async fn get_text(ctx: &ActionContext, target: Target, options: ActionOptions) -> ActionResult<Option<String>> {
    let page = ctx.page();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "extractText", options, |attempt| {
            let target = target.clone();
            async move {
                ctx.wait_stable().await;
                let handle = ctx.resolve(&attempt, &target, WaitState::Attached, 5000).await?;
                Ok(ctx.page().text_content(&handle).await)
            }
        })
        .await
}

pub async fn get_attribute(ctx: &ActionContext, target: Target, name: &str, options: ActionOptions) -> ActionResult<Option<String>> {
    let page = ctx.page();
    let name = name.to_string();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "extractAttribute", options, |attempt| {
            let target = target.clone();
            let name = name.clone();
            async move {
                ctx.wait_stable().await;
                let handle = ctx.resolve(&attempt, &target, WaitState::Attached, 5000).await?;
                Ok(ctx.page().get_attribute(&handle, &name).await)
            }
        })
        .await
}

/// `getAll`: runs `selector` through plain CSS and reads `keys` off each
/// matching element (spec §4.5's "list of `{textContent|innerHTML|attr}`
/// maps").
pub async fn get_all(ctx: &ActionContext, selector: &str, keys: Vec<String>, options: ActionOptions) -> ActionResult<Vec<HashMap<String, Option<String>>>> {
    let page = ctx.page();
    let selector = selector.to_string();
    let keys = keys;
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "extractAll", options, |_attempt| {
            let selector = selector.clone();
            let keys = keys.clone();
            async move {
                ctx.wait_stable().await;
                let page = ctx.page();
                let handles = page.query_css(&selector).await;
                let mut rows = Vec::with_capacity(handles.len());
                for handle in &handles {
                    let mut row = HashMap::new();
                    for key in &keys {
                        row.insert(key.clone(), read_source(page.as_ref(), handle, key).await);
                    }
                    rows.push(row);
                }
                Ok(rows)
            }
        })
        .await
}

pub async fn get_page_content(ctx: &ActionContext, options: ActionOptions) -> ActionResult<String> {
    let page = ctx.page();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "getContent", options, |_attempt| {
            async move {
                ctx.wait_stable().await;
                let raw = ctx.page().page_content().await;
                Ok(raw.split_whitespace().collect::<Vec<_>>().join(" "))
            }
        })
        .await
}

/// Iterates matches of `selector` up to `limit`, coercing each field per
/// `schema` and emitting provenance (spec §4.5, Structured extraction).
pub async fn extract_structured(ctx: &ActionContext, selector: &str, schema: ExtractionSchema, limit: usize, options: ActionOptions) -> ActionResult<StructuredExtraction> {
    let page = ctx.page();
    let selector = selector.to_string();
    ctx.engine
        .execute_action(page.clone(), ctx.session.id(), "extractStructured", options, |_attempt| {
            let selector = selector.clone();
            let schema = schema.clone();
            async move {
                ctx.wait_stable().await;
                let page = ctx.page();
                let handles = page.query_css(&selector).await;
                let mut data = Vec::new();
                let mut provenance = Vec::new();
                for (index, handle) in handles.iter().take(limit).enumerate() {
                    let snapshot = page
                        .element_snapshot(handle)
                        .await
                        .ok_or_else(|| RuntimeError::stale_element("row vanished during extraction"))?;
                    let mut row = HashMap::new();
                    for (key, field) in &schema.fields {
                        let raw = read_source(page.as_ref(), handle, &field.source).await;
                        row.insert(key.clone(), coerce(raw, field.field_type)?);
                    }
                    data.push(row);
                    provenance.push(Provenance {
                        index,
                        tag_name: snapshot.tag_name,
                        id: page.get_attribute(handle, "id").await,
                        class_name: page.get_attribute(handle, "class").await,
                        strategy: "css".to_string(),
                    });
                }
                Ok(StructuredExtraction { data, provenance })
            }
        })
        .await
}
