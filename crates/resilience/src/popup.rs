//! `PopupDismisser` (spec §4.3): a per-action background watcher that
//! clicks known consent/overlay patterns and auto-dismisses native dialogs
//! so an action never hangs behind a banner it didn't ask to see.

use browser_driver::{DriverEvent, Page};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

fn default_patterns() -> Vec<String> {
    vec![
        "#onetrust-accept-btn-handler".to_string(),
        "[data-testid=\"cookie-accept\"]".to_string(),
        ".cookie-consent-accept".to_string(),
        "[aria-label=\"Close\"]".to_string(),
        ".modal-close".to_string(),
    ]
}

#[derive(Clone, Debug)]
pub struct PopupDismisserConfig {
    pub patterns: Vec<String>,
    pub sweep_interval_ms: u64,
}

impl Default for PopupDismisserConfig {
    fn default() -> Self {
        Self {
            patterns: default_patterns(),
            sweep_interval_ms: 3000,
        }
    }
}

pub struct PopupDismisser {
    config: PopupDismisserConfig,
}

impl PopupDismisser {
    pub fn new(config: PopupDismisserConfig) -> Self {
        Self { config }
    }

    /// Clicks the first visible match among the configured patterns.
    /// Returns whether something was dismissed.
    pub async fn sweep_once(&self, page: &dyn Page) -> bool {
        for pattern in &self.config.patterns {
            let candidates = page.query_css(pattern).await;
            for handle in candidates {
                if let Some(snapshot) = page.element_snapshot(&handle).await {
                    if snapshot.attached && snapshot.visible {
                        if page.click(&handle).await.is_ok() {
                            debug!(pattern, "dismissed popup/overlay match");
                            return true;
                        }
                    }
                }
            }
        }
        false
    }

    /// Starts the background sweep loop for a single action's lifetime.
    /// Callers must `stop()` the returned handle in a `finally` block; `stop`
    /// cancels the in-flight sleep immediately rather than waiting out the
    /// current sweep interval.
    pub fn start(self: Arc<Self>, page: Arc<dyn Page>) -> PopupWatcherHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let dismisser = Arc::clone(&self);
        let task = tokio::spawn(async move {
            loop {
                if page.is_closed() {
                    return;
                }
                dismisser.sweep_once(page.as_ref()).await;
                tokio::select! {
                    _ = sleep(Duration::from_millis(dismisser.config.sweep_interval_ms)) => {}
                    _ = &mut stop_rx => return,
                }
            }
        });
        PopupWatcherHandle {
            stop_tx: Some(stop_tx),
            task,
        }
    }

    /// Watches a browser's event stream for the lifetime of `page` and
    /// auto-dismisses any native dialog (alert/confirm/prompt) it raises, so
    /// the page never blocks waiting on one (spec §4.3). Mirrors
    /// `BrowserSession::spawn_crash_watcher`'s caller-supplied-receiver
    /// idiom: the caller subscribes and hands the receiver in.
    pub fn watch_native_dialogs(page: Arc<dyn Page>, mut events: broadcast::Receiver<DriverEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                if let DriverEvent::NativeDialog { page_id, message } = event {
                    if page_id != page.id().to_string() {
                        continue;
                    }
                    debug!(page_id, message, "auto-dismissing native dialog");
                    if let Err(error) = page.dismiss_dialog().await {
                        debug!(%error, "failed to auto-dismiss native dialog");
                    }
                }
            }
        })
    }
}

pub struct PopupWatcherHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PopupWatcherHandle {
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_driver::fake::{FakeBrowser, FakeElement, FakePage};
    use browser_driver::Browser;

    #[tokio::test]
    async fn sweep_clicks_first_visible_pattern() {
        let page = FakePage::new();
        page.seed(vec![FakeElement::new("button").attr("id", "onetrust-accept-btn-handler")]);
        let dismisser = PopupDismisser::new(PopupDismisserConfig::default());
        let dismissed = dismisser.sweep_once(page.as_ref()).await;
        assert!(dismissed);
    }

    #[tokio::test]
    async fn sweep_is_noop_when_nothing_matches() {
        let page = FakePage::new();
        let dismisser = PopupDismisser::new(PopupDismisserConfig::default());
        assert!(!dismisser.sweep_once(page.as_ref()).await);
    }

    #[tokio::test]
    async fn watcher_stops_cleanly() {
        let page = FakePage::new();
        let dismisser = Arc::new(PopupDismisser::new(PopupDismisserConfig {
            patterns: default_patterns(),
            sweep_interval_ms: 5,
        }));
        let handle = dismisser.start(page.clone() as Arc<dyn Page>);
        sleep(Duration::from_millis(20)).await;
        handle.stop().await;
    }

    #[tokio::test]
    async fn watch_native_dialogs_dismisses_matching_page_only() {
        let browser = FakeBrowser::new();
        let page = FakePage::new();
        let other_page = FakePage::new();
        let events = browser.subscribe();
        let watcher = PopupDismisser::watch_native_dialogs(page.clone() as Arc<dyn Page>, events);

        browser.emit(DriverEvent::NativeDialog {
            page_id: other_page.id().to_string(),
            message: "not mine".to_string(),
        });
        browser.emit(DriverEvent::NativeDialog {
            page_id: page.id().to_string(),
            message: "confirm leave?".to_string(),
        });
        sleep(Duration::from_millis(20)).await;

        assert_eq!(page.dialogs_dismissed(), 1);
        assert_eq!(other_page.dialogs_dismissed(), 0);
        watcher.abort();
    }
}
