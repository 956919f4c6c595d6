//! Thin CLI shell around [`crate::Runtime`] (SPEC_FULL §6): enough surface
//! to open a session, call a tool by name, and inspect its trace/stats
//! without a real browser driver.

mod args;
mod dispatch;

pub use args::CliArgs;
pub use dispatch::run;
