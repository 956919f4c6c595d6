//! A bounded, process-local action trace: a per-session ring of
//! [`TraceEntry`] plus a global ring of duration samples for percentiles
//! (spec §4.9). Push-and-evict keeps memory bounded regardless of how long
//! a session runs; aggregates are maintained incrementally so `stats()` is
//! O(distinct actions), not O(entries).

use crate::types::{ActionStats, TraceEntry, TraceStats};
use browser_core_types::SessionId;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

const DEFAULT_SESSION_CAP: usize = 2000;
const DEFAULT_GLOBAL_SAMPLE_CAP: usize = 5000;

#[derive(Default)]
struct Aggregates {
    ok: u64,
    failed: u64,
    retries_total: u64,
    per_action: HashMap<String, ActionStats>,
}

impl Aggregates {
    fn add(&mut self, entry: &TraceEntry) {
        if entry.ok {
            self.ok += 1;
        } else {
            self.failed += 1;
        }
        self.retries_total += entry.retries as u64;
        let stat = self.per_action.entry(entry.action.clone()).or_default();
        stat.count += 1;
        if entry.ok {
            stat.ok += 1;
        } else {
            stat.failed += 1;
        }
        stat.retries_total += entry.retries as u64;
    }

    fn subtract(&mut self, entry: &TraceEntry) {
        if entry.ok {
            self.ok = self.ok.saturating_sub(1);
        } else {
            self.failed = self.failed.saturating_sub(1);
        }
        self.retries_total = self.retries_total.saturating_sub(entry.retries as u64);
        if let Some(stat) = self.per_action.get_mut(&entry.action) {
            stat.count = stat.count.saturating_sub(1);
            if entry.ok {
                stat.ok = stat.ok.saturating_sub(1);
            } else {
                stat.failed = stat.failed.saturating_sub(1);
            }
            stat.retries_total = stat.retries_total.saturating_sub(entry.retries as u64);
            if stat.count == 0 {
                self.per_action.remove(&entry.action);
            }
        }
    }
}

pub struct ActionTrace {
    session_cap: usize,
    global_sample_cap: usize,
    sessions: DashMap<SessionId, Mutex<VecDeque<TraceEntry>>>,
    duration_samples: Mutex<VecDeque<u64>>,
    aggregates: Mutex<Aggregates>,
}

impl ActionTrace {
    pub fn new() -> Self {
        Self::with_caps(DEFAULT_SESSION_CAP, DEFAULT_GLOBAL_SAMPLE_CAP)
    }

    pub fn with_caps(session_cap: usize, global_sample_cap: usize) -> Self {
        Self {
            session_cap,
            global_sample_cap,
            sessions: DashMap::new(),
            duration_samples: Mutex::new(VecDeque::new()),
            aggregates: Mutex::new(Aggregates::default()),
        }
    }

    pub fn record(&self, session_id: &SessionId, entry: TraceEntry) {
        {
            let mut samples = self.duration_samples.lock();
            if samples.len() >= self.global_sample_cap {
                samples.pop_front();
            }
            samples.push_back(entry.duration_ms);
        }

        self.aggregates.lock().add(&entry);

        let ring = self
            .sessions
            .entry(session_id.clone())
            .or_insert_with(|| Mutex::new(VecDeque::with_capacity(self.session_cap)));
        let mut guard = ring.lock();
        if guard.len() >= self.session_cap {
            if let Some(evicted) = guard.pop_front() {
                self.aggregates.lock().subtract(&evicted);
            }
        }
        guard.push_back(entry);
    }

    pub fn session_entries(&self, session_id: &SessionId) -> Vec<TraceEntry> {
        self.sessions
            .get(session_id)
            .map(|ring| ring.lock().iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Removes a session's ring entirely and recomputes aggregates
    /// deterministically by subtracting exactly what that ring held.
    pub fn clear_session(&self, session_id: &SessionId) {
        if let Some((_, ring)) = self.sessions.remove(session_id) {
            let entries = ring.into_inner();
            let mut aggregates = self.aggregates.lock();
            for entry in &entries {
                aggregates.subtract(entry);
            }
        }
    }

    pub fn stats(&self) -> TraceStats {
        let aggregates = self.aggregates.lock();
        let samples = self.duration_samples.lock();
        let mut sorted: Vec<u64> = samples.iter().copied().collect();
        sorted.sort_unstable();

        TraceStats {
            total: aggregates.ok + aggregates.failed,
            ok: aggregates.ok,
            failed: aggregates.failed,
            retries_total: aggregates.retries_total,
            tracked_sessions: self.sessions.len(),
            per_action: aggregates.per_action.clone(),
            p50_duration_ms: percentile(&sorted, 0.50),
            p95_duration_ms: percentile(&sorted, 0.95),
        }
    }
}

impl Default for ActionTrace {
    fn default() -> Self {
        Self::new()
    }
}

fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = (p * sorted.len() as f64).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(action: &str, ok: bool, duration_ms: u64, retries: u32) -> TraceEntry {
        TraceEntry {
            action: action.to_string(),
            selector: None,
            timestamp: Utc::now(),
            duration_ms,
            ok,
            error: None,
            retries,
            selector_resolved: None,
            events_dispatched: Vec::new(),
            waits_performed: Vec::new(),
            assertions_checked: Vec::new(),
        }
    }

    #[test]
    fn records_and_aggregates() {
        let trace = ActionTrace::new();
        let session = SessionId::from("s1");
        trace.record(&session, entry("click", true, 100, 0));
        trace.record(&session, entry("click", false, 200, 2));
        let stats = trace.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.ok, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.retries_total, 2);
        assert_eq!(stats.per_action["click"].count, 2);
    }

    #[test]
    fn eviction_subtracts_oldest_contribution() {
        let trace = ActionTrace::with_caps(2, 100);
        let session = SessionId::from("s1");
        trace.record(&session, entry("click", true, 10, 0));
        trace.record(&session, entry("click", false, 20, 1));
        trace.record(&session, entry("click", true, 30, 0));
        let stats = trace.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.ok, 2);
        assert_eq!(stats.failed, 0);
        assert_eq!(trace.session_entries(&session).len(), 2);
    }

    #[test]
    fn clear_session_recomputes_aggregates() {
        let trace = ActionTrace::new();
        let s1 = SessionId::from("s1");
        let s2 = SessionId::from("s2");
        trace.record(&s1, entry("click", true, 10, 0));
        trace.record(&s2, entry("type", true, 20, 0));
        trace.clear_session(&s1);
        let stats = trace.stats();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.tracked_sessions, 1);
        assert!(!stats.per_action.contains_key("click"));
    }

    #[test]
    fn percentiles_over_duration_samples() {
        let trace = ActionTrace::new();
        let session = SessionId::from("s1");
        for ms in [10, 20, 30, 40, 100] {
            trace.record(&session, entry("x", true, ms, 0));
        }
        let stats = trace.stats();
        assert_eq!(stats.p50_duration_ms, 30);
        assert_eq!(stats.p95_duration_ms, 100);
    }
}
