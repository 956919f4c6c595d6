//! Pool-facing value types (spec §4.8).

use browser_session::SessionSnapshot;

/// Options accepted by [`crate::pool::SessionPool::acquire`].
#[derive(Clone, Debug, Default)]
pub struct AcquireOptions {
    pub profile: Option<String>,
    pub url: Option<String>,
}

/// A launched browser plus the context/page pair handed to a new session.
pub(crate) struct Launched {
    pub context: std::sync::Arc<dyn browser_driver::BrowserContext>,
    pub page: std::sync::Arc<dyn browser_driver::Page>,
}

pub(crate) enum RecoverySnapshot {
    Live(SessionSnapshot),
    ProfileFallback(SessionSnapshot),
    None,
}
