//! Installs a `tracing-subscriber` env-filter layer once (SPEC_FULL §4.12),
//! callable from the CLI binary and from test harnesses.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// `level` is used only when `RUST_LOG`/`LOG_LEVEL` aren't set.
pub fn init(level: &str) {
    let filter = std::env::var("LOG_LEVEL")
        .ok()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .map(tracing_subscriber::EnvFilter::new)
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
