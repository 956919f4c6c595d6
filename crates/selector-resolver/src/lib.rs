//! Resolves selectors (plain CSS, a single typed strategy, or an ordered
//! fallback chain) against the driver's capability set, reporting which
//! strategy won (spec §4.2).

mod resolver;
mod types;

pub use resolver::resolve;
pub use types::{Selector, SelectorResolution, SelectorStrategy, WaitState};
