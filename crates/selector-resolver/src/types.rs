//! Selector and resolution value types.

use browser_driver::ElementHandle;
use serde::{Deserialize, Serialize};

/// A single, tagged way of locating an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectorStrategy {
    Aria { role: String, name: Option<String> },
    Text { text: String, exact: bool },
    Label { text: String },
    TestId { id: String },
    Css { selector: String },
    XPath { expression: String },
}

impl SelectorStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            SelectorStrategy::Aria { .. } => "aria",
            SelectorStrategy::Text { .. } => "text",
            SelectorStrategy::Label { .. } => "label",
            SelectorStrategy::TestId { .. } => "testid",
            SelectorStrategy::Css { .. } => "css",
            SelectorStrategy::XPath { .. } => "xpath",
        }
    }
}

/// A plain CSS string, a single typed strategy, or a non-empty ordered
/// fallback chain. Construct chains through [`Selector::chain`] so an empty
/// chain can never reach the resolver.
#[derive(Debug, Clone)]
pub enum Selector {
    Css(String),
    Single(SelectorStrategy),
    Chain(Vec<SelectorStrategy>),
}

impl Selector {
    /// Builds a chain selector, rejecting an empty list up front so the
    /// resolver's own "empty chain" failure path is unreachable from here.
    pub fn chain(strategies: Vec<SelectorStrategy>) -> Option<Self> {
        if strategies.is_empty() {
            None
        } else {
            Some(Selector::Chain(strategies))
        }
    }

    pub fn strategies(&self) -> Vec<SelectorStrategy> {
        match self {
            Selector::Css(s) => vec![SelectorStrategy::Css { selector: s.clone() }],
            Selector::Single(s) => vec![s.clone()],
            Selector::Chain(chain) => chain.clone(),
        }
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Selector::Css(value.to_string())
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Self {
        Selector::Css(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn is_presence(&self) -> bool {
        matches!(self, WaitState::Visible | WaitState::Attached)
    }
}

/// A confidence resolution: not just a live locator, but which strategy in
/// the chain won, its index, and how long resolution took.
#[derive(Debug, Clone)]
pub struct SelectorResolution {
    pub locator: ElementHandle,
    pub strategy: SelectorStrategy,
    pub strategy_index: usize,
    pub resolution_ms: u64,
    pub chain_length: usize,
}
