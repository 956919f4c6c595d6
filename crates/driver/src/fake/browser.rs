//! The in-memory [`Browser`] implementation, the root of a `FakeDriver`
//! session graph used across the workspace's tests.

use super::context::FakeBrowserContext;
use crate::traits::{Browser, BrowserContext};
use crate::types::DriverEvent;
use async_trait::async_trait;
use browser_core_types::RuntimeError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

pub struct FakeBrowser {
    contexts: Mutex<Vec<Arc<FakeBrowserContext>>>,
    connected: AtomicBool,
    events: broadcast::Sender<DriverEvent>,
}

impl FakeBrowser {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            contexts: Mutex::new(Vec::new()),
            connected: AtomicBool::new(true),
            events,
        })
    }

    /// Test helper: simulate the underlying browser process dying.
    pub fn simulate_disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let _ = self.events.send(DriverEvent::BrowserDisconnected);
    }

    pub fn emit(&self, event: DriverEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn new_context(&self) -> Result<Arc<dyn BrowserContext>, RuntimeError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(RuntimeError::session_unhealthy("browser is disconnected"));
        }
        let ctx = FakeBrowserContext::new();
        self.contexts.lock().push(Arc::clone(&ctx));
        Ok(ctx as Arc<dyn BrowserContext>)
    }

    fn subscribe(&self) -> broadcast::Receiver<DriverEvent> {
        self.events.subscribe()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), RuntimeError> {
        self.connected.store(false, Ordering::SeqCst);
        let contexts = self.contexts.lock().clone();
        for ctx in contexts {
            let _ = ctx.close().await;
        }
        Ok(())
    }
}
