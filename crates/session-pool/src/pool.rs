//! The session pool: admission, lazy launch, profile restore/persist, and
//! health-probed auto-recovery with identity preservation (spec §4.8).

use crate::health::{HealthMonitor, HealthMonitorConfig};
use crate::launcher::BrowserLauncher;
use crate::profile;
use crate::types::{AcquireOptions, RecoverySnapshot};
use browser_core_types::{RuntimeError, SessionId};
use browser_driver::Browser;
use browser_resilience::PopupDismisser;
use browser_session::BrowserSession;
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, RwLock as AsyncRwLock};
use tracing::{error, info, warn};

pub struct SessionPoolConfig {
    pub max_contexts: usize,
    pub profile_root: PathBuf,
    pub health: HealthMonitorConfig,
}

impl Default for SessionPoolConfig {
    fn default() -> Self {
        Self {
            max_contexts: 10,
            profile_root: PathBuf::from("./profiles"),
            health: HealthMonitorConfig::default(),
        }
    }
}

pub struct SessionPool {
    config: SessionPoolConfig,
    launcher: Arc<dyn BrowserLauncher>,
    browser: AsyncRwLock<Option<Arc<dyn Browser>>>,
    launch_lock: AsyncMutex<()>,
    sessions: DashMap<SessionId, Arc<BrowserSession>>,
    profiles: DashMap<SessionId, String>,
    health: Arc<HealthMonitor>,
    shutting_down: AtomicBool,
    health_task: AsyncMutex<Option<tokio::task::JoinHandle<()>>>,
}

impl SessionPool {
    pub fn new(config: SessionPoolConfig, launcher: Arc<dyn BrowserLauncher>) -> Arc<Self> {
        let health = HealthMonitor::new(config.health);
        Arc::new(Self {
            config,
            launcher,
            browser: AsyncRwLock::new(None),
            launch_lock: AsyncMutex::new(()),
            sessions: DashMap::new(),
            profiles: DashMap::new(),
            health,
            shutting_down: AtomicBool::new(false),
            health_task: AsyncMutex::new(None),
        })
    }

    /// Starts the background health-monitor loop. Idempotent; a second call
    /// is a no-op while one is already running.
    pub async fn start_health_monitor(self: &Arc<Self>) {
        let mut guard = self.health_task.lock().await;
        if guard.is_some() {
            return;
        }
        let pool = Arc::clone(self);
        let interval = pool.health.interval();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if pool.shutting_down.load(Ordering::SeqCst) {
                    return;
                }
                pool.run_health_tick().await;
            }
        });
        *guard = Some(handle);
    }

    async fn run_health_tick(self: &Arc<Self>) {
        let snapshot: Vec<_> = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().page()))
            .collect();
        let pool = Arc::clone(self);
        self.health
            .tick(&snapshot, move |id| {
                let pool = Arc::clone(&pool);
                tokio::spawn(async move {
                    pool.on_unhealthy(id).await;
                });
            })
            .await;
    }

    async fn ensure_browser(&self) -> Result<Arc<dyn Browser>, RuntimeError> {
        if let Some(browser) = self.browser.read().await.as_ref() {
            if browser.is_connected() {
                return Ok(Arc::clone(browser));
            }
        }
        let _guard = self.launch_lock.lock().await;
        if let Some(browser) = self.browser.read().await.as_ref() {
            if browser.is_connected() {
                return Ok(Arc::clone(browser));
            }
        }
        info!("launching browser");
        let browser = self.launcher.launch().await?;
        *self.browser.write().await = Some(Arc::clone(&browser));
        Ok(browser)
    }

    pub async fn acquire(self: &Arc<Self>, options: AcquireOptions) -> Result<Arc<BrowserSession>, RuntimeError> {
        if self.sessions.len() >= self.config.max_contexts {
            return Err(RuntimeError::other("pool limit reached"));
        }
        let browser = self.ensure_browser().await?;

        let profile_dir = match &options.profile {
            Some(name) => Some(profile::ensure_profile_dir(&self.config.profile_root, name).await?),
            None => None,
        };
        let snapshot = match &profile_dir {
            Some(dir) => profile::load_snapshot(dir).await,
            None => None,
        };

        let context = browser.new_context().await?;
        let page = context.new_page().await?;
        let id = SessionId::new();
        let session = Arc::new(BrowserSession::new(id.clone(), context, page, options.profile.clone()));

        if let Some(snapshot) = &snapshot {
            session.restore(snapshot).await?;
        }
        if let Some(url) = &options.url {
            session.page().goto(url).await?;
        }

        if let Some(profile) = &options.profile {
            self.profiles.insert(id.clone(), profile.clone());
        }
        session.spawn_crash_watcher(browser.subscribe());
        PopupDismisser::watch_native_dialogs(session.page(), browser.subscribe());
        self.health.track(id.clone());
        self.sessions.insert(id, Arc::clone(&session));
        Ok(session)
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<BrowserSession>> {
        self.sessions.get(id).map(|e| Arc::clone(e.value()))
    }

    pub fn list(&self) -> Vec<Arc<BrowserSession>> {
        self.sessions.iter().map(|e| Arc::clone(e.value())).collect()
    }

    /// Snapshots a profile-bound session to its profile directory (best
    /// effort; failures are logged, never propagated) then closes it.
    pub async fn release(&self, id: &SessionId) -> Result<(), RuntimeError> {
        let Some((_, session)) = self.sessions.remove(id) else {
            return Ok(());
        };
        self.health.untrack(id);
        if let Some(profile) = self.profiles.remove(id).map(|(_, v)| v) {
            let snapshot = session.snapshot().await;
            let dir = profile::profile_dir(&self.config.profile_root, &profile);
            if let Err(err) = profile::save_snapshot(&dir, &snapshot).await {
                warn!(session = %id, error = %err, "failed to persist profile snapshot on release");
            }
        }
        session.close().await
    }

    async fn recovery_snapshot(&self, session: &BrowserSession, profile: Option<&str>) -> RecoverySnapshot {
        let live = session.snapshot().await;
        if !live.url.is_empty() && live.url != "about:blank" {
            return RecoverySnapshot::Live(live);
        }
        if let Some(profile) = profile {
            let dir = profile::profile_dir(&self.config.profile_root, profile);
            if let Some(fallback) = profile::load_snapshot(&dir).await {
                return RecoverySnapshot::ProfileFallback(fallback);
            }
        }
        RecoverySnapshot::Live(live)
    }

    /// Replaces the context+page behind `id` while preserving the id itself,
    /// so handles and external references taken before the crash stay valid.
    async fn on_unhealthy(self: &Arc<Self>, id: SessionId) {
        if self.shutting_down.load(Ordering::SeqCst) {
            return;
        }
        let Some(session) = self.get(&id) else { return };
        session.mark_unhealthy();
        let profile = self.profiles.get(&id).map(|e| e.value().clone());
        let snapshot = self.recovery_snapshot(&session, profile.as_deref()).await;

        self.health.untrack(&id);
        self.sessions.remove(&id);
        if let Err(err) = session.close().await {
            warn!(session = %id, error = %err, "best-effort close during recovery failed");
        }

        let browser = match self.ensure_browser().await {
            Ok(b) => b,
            Err(err) => {
                error!(session = %id, error = %err, "failed to relaunch browser for auto-recovery");
                return;
            }
        };
        let context = match browser.new_context().await {
            Ok(c) => c,
            Err(err) => {
                error!(session = %id, error = %err, "failed to open replacement context");
                return;
            }
        };
        let page = match context.new_page().await {
            Ok(p) => p,
            Err(err) => {
                error!(session = %id, error = %err, "failed to open replacement page");
                return;
            }
        };

        let replacement = Arc::new(BrowserSession::new(id.clone(), context, page, profile.clone()));
        let to_restore = match &snapshot {
            RecoverySnapshot::Live(s) | RecoverySnapshot::ProfileFallback(s) => Some(s.clone()),
            RecoverySnapshot::None => None,
        };
        if let Some(snapshot) = &to_restore {
            if let Err(err) = replacement.restore(snapshot).await {
                warn!(session = %id, error = %err, "failed to restore snapshot during auto-recovery");
            }
        }
        replacement.spawn_crash_watcher(browser.subscribe());
        PopupDismisser::watch_native_dialogs(replacement.page(), browser.subscribe());
        self.health.track(id.clone());
        self.sessions.insert(id.clone(), replacement);
        info!(session = %id, "session auto-recovered");
    }

    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        if let Some(handle) = self.health_task.lock().await.take() {
            handle.abort();
        }
        let sessions: Vec<_> = self.sessions.iter().map(|e| Arc::clone(e.value())).collect();
        let closes = sessions.into_iter().map(|s| async move { s.close().await });
        let results = futures::future::join_all(closes).await;
        for result in results {
            if let Err(err) = result {
                warn!(error = %err, "session close failed during shutdown");
            }
        }
        self.sessions.clear();
        self.profiles.clear();
        if let Some(browser) = self.browser.write().await.take() {
            let _ = browser.close().await;
        }
    }
}
