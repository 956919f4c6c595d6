//! JSON argument parsing shared by every tool (spec §6): tool inputs are
//! plain JSON objects, so each field access can fail with an
//! invalid-argument message rather than a typed taxonomy kind.

use browser_action_engine::{ActionOptions, TimeoutTier};
use browser_core_types::RuntimeError;
use browser_selector_resolver::{Selector, SelectorStrategy, WaitState};
use serde_json::{Map, Value};
use std::time::Duration;

pub fn obj(args: &Value) -> Result<&Map<String, Value>, RuntimeError> {
    args.as_object().ok_or_else(|| RuntimeError::other("tool arguments must be a JSON object"))
}

pub fn require_str<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a str, RuntimeError> {
    map.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::other(format!("missing required string field '{key}'")))
}

pub fn opt_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

pub fn opt_bool(map: &Map<String, Value>, key: &str) -> Option<bool> {
    map.get(key).and_then(Value::as_bool)
}

pub fn opt_u64(map: &Map<String, Value>, key: &str) -> Option<u64> {
    map.get(key).and_then(Value::as_u64)
}

pub fn opt_i64(map: &Map<String, Value>, key: &str) -> Option<i64> {
    map.get(key).and_then(Value::as_i64)
}

pub fn require_field<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a Value, RuntimeError> {
    map.get(key).ok_or_else(|| RuntimeError::other(format!("missing required field '{key}'")))
}

pub fn parse_selector(value: &Value) -> Result<Selector, RuntimeError> {
    match value {
        Value::String(s) => Ok(Selector::Css(s.clone())),
        Value::Object(_) => Ok(Selector::Single(parse_strategy(value)?)),
        Value::Array(items) => {
            let strategies = items.iter().map(parse_strategy).collect::<Result<Vec<_>, _>>()?;
            Selector::chain(strategies).ok_or_else(|| RuntimeError::other("selector chain must not be empty"))
        }
        _ => Err(RuntimeError::other("selector must be a string, strategy object, or array of strategies")),
    }
}

fn parse_strategy(value: &Value) -> Result<SelectorStrategy, RuntimeError> {
    let map = obj(value)?;
    let strategy = require_str(map, "strategy")?;
    match strategy {
        "css" => Ok(SelectorStrategy::Css {
            selector: require_str(map, "selector")?.to_string(),
        }),
        "aria" => Ok(SelectorStrategy::Aria {
            role: require_str(map, "role")?.to_string(),
            name: opt_str(map, "name").map(str::to_string),
        }),
        "text" => Ok(SelectorStrategy::Text {
            text: require_str(map, "text")?.to_string(),
            exact: opt_bool(map, "exact").unwrap_or(false),
        }),
        "label" => Ok(SelectorStrategy::Label {
            text: require_str(map, "text")?.to_string(),
        }),
        "testid" => Ok(SelectorStrategy::TestId {
            id: require_str(map, "id")?.to_string(),
        }),
        "xpath" => Ok(SelectorStrategy::XPath {
            expression: require_str(map, "expression")?.to_string(),
        }),
        other => Err(RuntimeError::other(format!("unknown selector strategy '{other}'"))),
    }
}

pub fn parse_wait_state(map: &Map<String, Value>) -> Result<WaitState, RuntimeError> {
    match opt_str(map, "state").unwrap_or("visible") {
        "visible" => Ok(WaitState::Visible),
        "hidden" => Ok(WaitState::Hidden),
        "attached" => Ok(WaitState::Attached),
        "detached" => Ok(WaitState::Detached),
        other => Err(RuntimeError::other(format!("unknown wait state '{other}'"))),
    }
}

pub fn parse_action_options(map: &Map<String, Value>) -> ActionOptions {
    let timeout = match map.get("timeoutMs").and_then(Value::as_u64) {
        Some(ms) => TimeoutTier::Explicit(Duration::from_millis(ms)),
        None => match opt_str(map, "timeout") {
            Some("short") => TimeoutTier::Short,
            Some("long") => TimeoutTier::Long,
            _ => TimeoutTier::Medium,
        },
    };
    ActionOptions {
        timeout,
        retries: opt_u64(map, "retries").map(|v| v as u32).unwrap_or(3),
        screenshot_on_failure: opt_bool(map, "screenshotOnFailure").unwrap_or(true),
        selector_strategies: None,
        precondition: None,
        postcondition: None,
    }
}
