//! Pairs a browser context with its active page; owns snapshot/restore and
//! health flags (spec §4.7).

mod session;
mod types;

pub use session::BrowserSession;
pub use types::SessionSnapshot;
