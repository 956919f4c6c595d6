//! Wraps a context and a page, exposing snapshot/restore and health flags
//! (spec §4.7).

use crate::types::SessionSnapshot;
use browser_core_types::{RuntimeError, SessionId};
use browser_driver::{BrowserContext, DriverEvent, LoadState, Page};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::warn;

pub struct BrowserSession {
    id: SessionId,
    context: Arc<dyn BrowserContext>,
    page: RwLock<Arc<dyn Page>>,
    profile: Option<String>,
    healthy: AtomicBool,
    last_snapshot: Mutex<Option<SessionSnapshot>>,
}

impl BrowserSession {
    pub fn new(id: SessionId, context: Arc<dyn BrowserContext>, page: Arc<dyn Page>, profile: Option<String>) -> Self {
        Self {
            id,
            context,
            page: RwLock::new(page),
            profile,
            healthy: AtomicBool::new(true),
            last_snapshot: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn page(&self) -> Arc<dyn Page> {
        Arc::clone(&self.page.read())
    }

    pub fn context(&self) -> Arc<dyn BrowserContext> {
        Arc::clone(&self.context)
    }

    pub async fn current_url(&self) -> String {
        self.page().url().await
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    pub fn mark_healthy(&self) {
        self.healthy.store(true, Ordering::SeqCst);
    }

    pub fn mark_unhealthy(&self) {
        self.healthy.store(false, Ordering::SeqCst);
    }

    pub async fn new_page(&self) -> Result<(), RuntimeError> {
        let page = self.context.new_page().await?;
        *self.page.write() = page;
        Ok(())
    }

    /// Captures `{url, cookies, localStorage, timestamp}`. Local storage
    /// capture tolerates `about:blank` by simply returning whatever the
    /// driver reports there (typically empty) instead of failing.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let page = self.page();
        let snapshot = SessionSnapshot {
            session_id: self.id.to_string(),
            url: page.url().await,
            cookies: page.cookies().await,
            local_storage: page.local_storage().await,
            timestamp: Utc::now(),
        };
        *self.last_snapshot.lock() = Some(snapshot.clone());
        snapshot
    }

    pub fn last_snapshot(&self) -> Option<SessionSnapshot> {
        self.last_snapshot.lock().clone()
    }

    /// Clears cookies, re-adds the snapshot's cookies, navigates to the
    /// snapshot URL (waiting for `domcontentloaded`), then re-populates
    /// local storage. Opens a new page first if the current one closed.
    pub async fn restore(&self, snapshot: &SessionSnapshot) -> Result<(), RuntimeError> {
        if self.page().is_closed() {
            self.new_page().await?;
        }
        let page = self.page();
        page.clear_cookies().await;
        page.add_cookies(snapshot.cookies.clone()).await;
        page.goto(&snapshot.url).await?;
        page.wait_for_load_state(LoadState::DomContentLoaded, Duration::from_secs(5))
            .await?;
        page.set_local_storage(snapshot.local_storage.clone()).await;
        Ok(())
    }

    pub async fn close(&self) -> Result<(), RuntimeError> {
        self.context.close().await
    }

    /// Flips `healthy=false` on a matching page crash, and logs (without
    /// flipping) a plain close, mirroring what a real driver would report.
    pub fn spawn_crash_watcher(self: &Arc<Self>, mut events: broadcast::Receiver<DriverEvent>) -> JoinHandle<()> {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match event {
                    DriverEvent::PageCrashed { page_id } if page_id == session.page().id().to_string() => {
                        warn!(session = %session.id, "page crashed, marking session unhealthy");
                        session.mark_unhealthy();
                    }
                    DriverEvent::BrowserDisconnected => {
                        session.mark_unhealthy();
                    }
                    _ => {}
                }
            }
        })
    }
}
