//! Shared value types for the per-action primitives (spec §4.5).

use browser_core_types::HandleId;
use browser_selector_resolver::Selector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What an action resolves against: a fresh selector, or a previously
/// registered handle re-resolved through the handle registry.
#[derive(Clone, Debug)]
pub enum Target {
    Selector(Selector),
    Handle(HandleId),
}

impl From<Selector> for Target {
    fn from(value: Selector) -> Self {
        Target::Selector(value)
    }
}

impl From<&str> for Target {
    fn from(value: &str) -> Self {
        Target::Selector(value.into())
    }
}

impl From<HandleId> for Target {
    fn from(value: HandleId) -> Self {
        Target::Handle(value)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeMode {
    Fill,
    Sequential { delay_ms: u64 },
    Paste,
    NativeSetter,
}

#[derive(Clone, Debug, Serialize)]
pub struct NavigateOutcome {
    pub url: String,
    pub status: Option<u16>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FillMapOutcome {
    pub filled: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PageState {
    pub url: String,
    pub title: String,
    pub ready_state: String,
    pub is_loading: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchemaField {
    /// `textContent` / `innerHTML` are special-cased; anything else is read
    /// as an HTML attribute of that name.
    pub source: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractionSchema {
    pub fields: HashMap<String, SchemaField>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Provenance {
    pub index: usize,
    pub tag_name: String,
    pub id: Option<String>,
    pub class_name: Option<String>,
    pub strategy: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct StructuredExtraction {
    pub data: Vec<HashMap<String, serde_json::Value>>,
    pub provenance: Vec<Provenance>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn delta(self, amount: i64) -> (i64, i64) {
        match self {
            ScrollDirection::Down => (0, amount),
            ScrollDirection::Up => (0, -amount),
            ScrollDirection::Right => (amount, 0),
            ScrollDirection::Left => (-amount, 0),
        }
    }
}
