//! The action engine: a precondition/execute/postcondition envelope with
//! retries, a navigation guard, selector-chain rotation, back-off, and
//! trace/screenshot emission (spec §4.4).

mod engine;
mod types;

pub use engine::ActionEngine;
pub use types::{
    ActionOptions, ActionResult, ArtifactSink, AttemptContext, DedupGuard, NoopArtifactSink, Predicate, TimeoutTier,
    TraceMeta,
};
