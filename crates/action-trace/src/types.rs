//! Trace entry and aggregate stats shapes (spec §3, §4.9).

use browser_core_types::StructuredError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which strategy in a chain actually resolved an action's selector, for
/// the trace consumer to tell a clean CSS hit from a deep fallback.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectorResolvedMeta {
    pub strategy: String,
    pub strategy_index: usize,
    pub chain_length: usize,
    pub resolution_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceEntry {
    pub action: String,
    pub selector: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub ok: bool,
    pub error: Option<StructuredError>,
    pub retries: u32,
    pub selector_resolved: Option<SelectorResolvedMeta>,
    pub events_dispatched: Vec<String>,
    pub waits_performed: Vec<String>,
    pub assertions_checked: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActionStats {
    pub count: u64,
    pub ok: u64,
    pub failed: u64,
    pub retries_total: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TraceStats {
    pub total: u64,
    pub ok: u64,
    pub failed: u64,
    pub retries_total: u64,
    pub tracked_sessions: usize,
    pub per_action: std::collections::HashMap<String, ActionStats>,
    pub p50_duration_ms: u64,
    pub p95_duration_ms: u64,
}
