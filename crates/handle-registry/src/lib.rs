//! Stable element handles that re-resolve across DOM mutations (spec §4.6).

mod registry;

pub use registry::{HandleRecord, HandleRegistry, ResolveOutcome};
