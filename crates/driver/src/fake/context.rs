//! The in-memory [`BrowserContext`] implementation.

use super::page::FakePage;
use crate::traits::{BrowserContext, Page};
use async_trait::async_trait;
use browser_core_types::RuntimeError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct FakeBrowserContext {
    pages: Mutex<Vec<Arc<FakePage>>>,
    closed: AtomicBool,
}

impl FakeBrowserContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            pages: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// Test helper: fetch the page created by the most recent `new_page`
    /// call so fixtures can seed its DOM.
    pub fn last_page(&self) -> Option<Arc<FakePage>> {
        self.pages.lock().last().cloned()
    }
}

#[async_trait]
impl BrowserContext for FakeBrowserContext {
    async fn new_page(&self) -> Result<Arc<dyn Page>, RuntimeError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RuntimeError::session_unhealthy("context is closed"));
        }
        let page = FakePage::new();
        self.pages.lock().push(Arc::clone(&page));
        Ok(page as Arc<dyn Page>)
    }

    async fn pages(&self) -> Vec<Arc<dyn Page>> {
        self.pages
            .lock()
            .iter()
            .cloned()
            .map(|p| p as Arc<dyn Page>)
            .collect()
    }

    async fn close(&self) -> Result<(), RuntimeError> {
        self.closed.store(true, Ordering::SeqCst);
        let pages = self.pages.lock().clone();
        for page in pages {
            let _ = page.close().await;
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
