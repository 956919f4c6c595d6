//! The `{content:[{type:"text",text}], details:{...}}` envelope every tool
//! returns (spec §6).

use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Serialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ToolOutcome {
    pub content: Vec<ToolContent>,
    pub details: Value,
}

impl ToolOutcome {
    pub fn new(text: impl Into<String>, details: Value) -> Self {
        Self {
            content: vec![ToolContent {
                kind: "text".to_string(),
                text: text.into(),
            }],
            details,
        }
    }

    /// Renders `details` as the summary text too, for tools with no
    /// more natural human-readable line.
    pub fn from_details(details: Value) -> Self {
        Self::new(details.to_string(), details)
    }
}
