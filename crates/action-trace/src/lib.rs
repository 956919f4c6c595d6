//! Bounded per-session action trace with aggregate percentiles (spec §4.9).

mod trace;
mod types;

pub use trace::ActionTrace;
pub use types::{ActionStats, SelectorResolvedMeta, TraceEntry, TraceStats};
