//! Input redaction before persisting to the action log (spec §6).

use serde_json::Value;
use std::collections::HashSet;

const DEFAULT_SENSITIVE_KEYS: &[&str] = &["password", "token", "secret", "apikey", "api_key", "authorization", "cookie"];
const TYPED_TEXT_KEYS: &[&str] = &["text", "value", "fields", "script"];
const REDACTED: &str = "[REDACTED]";

#[derive(Clone, Debug)]
pub struct RedactionConfig {
    pub sensitive_keys: HashSet<String>,
    pub redact_typed_text: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            sensitive_keys: DEFAULT_SENSITIVE_KEYS.iter().map(|s| s.to_string()).collect(),
            redact_typed_text: true,
        }
    }
}

impl RedactionConfig {
    pub fn with_additional_keys(mut self, keys: impl IntoIterator<Item = String>) -> Self {
        self.sensitive_keys.extend(keys.into_iter().map(|k| k.to_lowercase()));
        self
    }

    fn is_sensitive(&self, key: &str) -> bool {
        self.sensitive_keys.contains(&key.to_lowercase())
    }

    fn is_typed_text(&self, key: &str) -> bool {
        self.redact_typed_text && TYPED_TEXT_KEYS.contains(&key.to_lowercase().as_str())
    }
}

/// Walks `input` and redacts values whose key matches the sensitive-keys
/// set, or (when the policy is on) any string under a typed-text key and
/// its nested children.
pub fn redact_input(input: &Value, config: &RedactionConfig) -> Value {
    walk(input, config, false)
}

fn walk(value: &Value, config: &RedactionConfig, force_redact: bool) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, v) in map {
                let redact_here = force_redact || config.is_sensitive(key);
                let under_typed_text = force_redact || config.is_typed_text(key);
                out.insert(key.clone(), redact_value(v, config, redact_here, under_typed_text));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| walk(v, config, force_redact)).collect()),
        other => other.clone(),
    }
}

fn redact_value(value: &Value, config: &RedactionConfig, redact_here: bool, propagate_typed_text: bool) -> Value {
    match value {
        Value::String(_) if redact_here || propagate_typed_text => Value::String(REDACTED.to_string()),
        Value::Object(_) | Value::Array(_) => {
            if redact_here {
                walk(value, config, true)
            } else {
                walk(value, config, propagate_typed_text)
            }
        }
        other => {
            if redact_here {
                Value::String(REDACTED.to_string())
            } else {
                other.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_sensitive_key_regardless_of_case() {
        let input = json!({"Password": "hunter2", "username": "ann"});
        let redacted = redact_input(&input, &RedactionConfig::default());
        assert_eq!(redacted["Password"], "[REDACTED]");
        assert_eq!(redacted["username"], "ann");
    }

    #[test]
    fn redacts_typed_text_values_and_nested_children() {
        let input = json!({"text": "secret note", "fields": {"email": "a@b.com"}});
        let redacted = redact_input(&input, &RedactionConfig::default());
        assert_eq!(redacted["text"], "[REDACTED]");
        assert_eq!(redacted["fields"]["email"], "[REDACTED]");
    }

    #[test]
    fn leaves_unrelated_values_untouched() {
        let input = json!({"selector": "#go", "count": 3});
        let redacted = redact_input(&input, &RedactionConfig::default());
        assert_eq!(redacted, input);
    }
}
