//! Per-session health probing (spec §4.8).
//!
//! The monitor doesn't own sessions; it's handed a callback to invoke once a
//! session crosses `maxFailures` consecutive probe failures, and the pool
//! decides what recovery means.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Clone, Copy, Debug)]
pub struct HealthMonitorConfig {
    pub interval: Duration,
    pub probe_timeout: Duration,
    pub max_failures: u32,
}

impl Default for HealthMonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
            max_failures: 3,
        }
    }
}

const VALID_READY_STATES: [&str; 3] = ["loading", "interactive", "complete"];

/// Tracks each session's consecutive-failure count; a background task
/// ticks it and calls an `on_unhealthy` hook when a session trips over.
pub struct HealthMonitor {
    config: HealthMonitorConfig,
    failures: DashMap<browser_core_types::SessionId, u32>,
}

impl HealthMonitor {
    pub fn new(config: HealthMonitorConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            failures: DashMap::new(),
        })
    }

    pub fn track(&self, id: browser_core_types::SessionId) {
        self.failures.insert(id, 0);
    }

    pub fn untrack(&self, id: &browser_core_types::SessionId) {
        self.failures.remove(id);
    }

    /// Races `page.evaluate("document.readyState")` against `probe_timeout`.
    /// Returns `true` when the probe should reset the failure counter.
    async fn probe(&self, page: &Arc<dyn browser_driver::Page>) -> bool {
        let result = tokio::time::timeout(self.config.probe_timeout, page.evaluate("document.readyState")).await;
        match result {
            Ok(Ok(value)) => value
                .as_str()
                .map(|s| VALID_READY_STATES.contains(&s))
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Runs one probe pass over `sessions`, invoking `on_unhealthy(id)` for
    /// every session whose consecutive-failure count just reached the
    /// configured max. `sessions` is a snapshot the caller takes under its
    /// own lock; the monitor never reaches back into pool state directly.
    pub async fn tick<F>(&self, sessions: &[(browser_core_types::SessionId, Arc<dyn browser_driver::Page>)], on_unhealthy: F)
    where
        F: Fn(browser_core_types::SessionId),
    {
        for (id, page) in sessions {
            let healthy = self.probe(page).await;
            let mut entry = self.failures.entry(id.clone()).or_insert(0);
            if healthy {
                *entry = 0;
                continue;
            }
            *entry += 1;
            debug!(session = %id, failures = *entry, "health probe failed");
            if *entry >= self.config.max_failures {
                *entry = 0;
                drop(entry);
                on_unhealthy(id.clone());
            }
        }
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }
}
