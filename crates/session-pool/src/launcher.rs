//! Abstracts "start a browser process" so the pool never hard-codes a
//! driver implementation (spec §4.8's "possibly null shared browser").

use async_trait::async_trait;
use browser_core_types::RuntimeError;
use browser_driver::Browser;
use std::sync::Arc;

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Arc<dyn Browser>, RuntimeError>;
}

/// Launches a fresh [`browser_driver::fake::FakeBrowser`] each time; used by
/// tests and by any deployment that hasn't wired a real driver yet.
pub struct FakeBrowserLauncher;

#[async_trait]
impl BrowserLauncher for FakeBrowserLauncher {
    async fn launch(&self) -> Result<Arc<dyn Browser>, RuntimeError> {
        Ok(browser_driver::fake::FakeBrowser::new() as Arc<dyn Browser>)
    }
}
