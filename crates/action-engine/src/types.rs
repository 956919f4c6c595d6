//! The action engine's public options, result, and per-attempt scratch
//! space (spec §4.4).

use async_trait::async_trait;
use browser_action_trace::SelectorResolvedMeta;
use browser_core_types::{RuntimeError, StructuredError};
use browser_driver::Page;
use browser_selector_resolver::SelectorStrategy;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// An async predicate over the page, evaluated by the engine itself (spec
/// §4.4's `precondition`/`postcondition` options). `false` is classified as
/// a retryable `AssertionFailed`, the same as a thrown error.
pub type Predicate = Arc<dyn for<'a> Fn(&'a dyn Page) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> + Send + Sync>;

#[derive(Clone, Copy, Debug)]
pub enum TimeoutTier {
    Short,
    Medium,
    Long,
    Explicit(Duration),
}

impl TimeoutTier {
    pub fn duration(&self) -> Duration {
        match self {
            TimeoutTier::Short => Duration::from_secs(5),
            TimeoutTier::Medium => Duration::from_secs(15),
            TimeoutTier::Long => Duration::from_secs(45),
            TimeoutTier::Explicit(d) => *d,
        }
    }
}

impl Default for TimeoutTier {
    fn default() -> Self {
        TimeoutTier::Medium
    }
}

#[derive(Clone)]
pub struct ActionOptions {
    pub timeout: TimeoutTier,
    pub retries: u32,
    pub screenshot_on_failure: bool,
    /// An internal, mutable fallback chain the engine rotates on
    /// `TargetNotFound`: the head strategy moves to the tail before the
    /// next attempt, changing which one resolution tries first.
    pub selector_strategies: Option<Arc<Mutex<Vec<SelectorStrategy>>>>,
    /// Evaluated before `body` on every attempt; `false` is a retryable
    /// "precondition failed" `AssertionFailed`, `body` is not invoked.
    pub precondition: Option<Predicate>,
    /// Evaluated after `body` succeeds; `false` is a retryable
    /// "postcondition failed" `AssertionFailed` and the attempt's value is
    /// discarded.
    pub postcondition: Option<Predicate>,
}

impl Default for ActionOptions {
    fn default() -> Self {
        Self {
            timeout: TimeoutTier::default(),
            retries: 3,
            screenshot_on_failure: true,
            selector_strategies: None,
            precondition: None,
            postcondition: None,
        }
    }
}

/// Metadata a `body` closure accumulates during a single attempt; folded
/// into the emitted `TraceEntry` on both success and terminal failure.
#[derive(Default)]
pub struct TraceMeta {
    pub selector: Option<String>,
    pub selector_resolved: Option<SelectorResolvedMeta>,
    pub events_dispatched: Vec<String>,
    pub waits_performed: Vec<String>,
    pub assertions_checked: Vec<String>,
}

/// What a `body` closure sees for one attempt: which attempt number this
/// is, and a place to record trace metadata as it works.
pub struct AttemptContext {
    pub attempt: u32,
    pub trace_meta: Arc<Mutex<TraceMeta>>,
}

pub struct ActionResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub structured_error: Option<StructuredError>,
    pub retries: u32,
    pub duration_ms: u64,
    pub screenshot: Option<String>,
}

impl<T> ActionResult<T> {
    pub fn success(data: T, retries: u32, duration_ms: u64) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            structured_error: None,
            retries,
            duration_ms,
            screenshot: None,
        }
    }

    pub fn failure(error: &RuntimeError, retries: u32, duration_ms: u64, screenshot: Option<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.to_string()),
            structured_error: error.structured(),
            retries,
            duration_ms,
            screenshot,
        }
    }
}

/// Where terminal-failure screenshots land. The core only needs a sink;
/// the concrete artifact store is an external collaborator (spec §1).
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn write_screenshot(&self, bytes: Vec<u8>, label: &str) -> Result<String, RuntimeError>;
}

pub struct NoopArtifactSink;

#[async_trait]
impl ArtifactSink for NoopArtifactSink {
    async fn write_screenshot(&self, _bytes: Vec<u8>, _label: &str) -> Result<String, RuntimeError> {
        Ok(String::new())
    }
}

/// Remembers `{selectorKey, lastClickTime}` so a click against the same
/// key within the guard window is skipped and reported as success (spec
/// §4.5, Click).
pub struct DedupGuard {
    last: Mutex<std::collections::HashMap<String, std::time::Instant>>,
}

impl DedupGuard {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(std::collections::HashMap::new()),
        }
    }

    /// Returns true (and does not update the timestamp) if `key` was seen
    /// within `window`; otherwise records now and returns false.
    pub fn check_and_record(&self, key: &str, window: Duration) -> bool {
        let mut map = self.last.lock();
        let now = std::time::Instant::now();
        if let Some(last) = map.get(key) {
            if now.duration_since(*last) < window {
                return true;
            }
        }
        map.insert(key.to_string(), now);
        false
    }
}

impl Default for DedupGuard {
    fn default() -> Self {
        Self::new()
    }
}
