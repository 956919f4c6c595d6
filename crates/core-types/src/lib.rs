//! Shared identifiers and the closed error taxonomy (spec §3, §4.1).
//!
//! This crate has no dependency on any other crate in the workspace; every
//! other layer depends on it.

mod errors;
mod ids;

pub use errors::{ErrorKind, RuntimeError, StructuredError, TaxonomyError};
pub use ids::{ActionId, HandleId, PageId, SessionId};
