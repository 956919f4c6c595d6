//! The capability set the core requires of a driver library (spec §1, §4.10).
//!
//! A real implementation (CDP, WebDriver, ...) is explicitly out of scope;
//! this crate only defines the contract and ships an in-memory [`fake`]
//! implementation used by every other crate's tests.

use crate::types::{
    Cookie, DriverEvent, ElementHandle, ElementSnapshot, LoadState, LocalStorageMap, SetValueMode,
};
use async_trait::async_trait;
use browser_core_types::{PageId, RuntimeError};
use std::time::Duration;
use tokio::sync::broadcast;

#[async_trait]
pub trait Page: Send + Sync {
    fn id(&self) -> &PageId;
    async fn url(&self) -> String;
    async fn title(&self) -> String;
    async fn ready_state(&self) -> String;
    fn is_closed(&self) -> bool;

    async fn goto(&self, url: &str) -> Result<(), RuntimeError>;
    async fn reload(&self) -> Result<(), RuntimeError>;
    async fn go_back(&self) -> Result<(), RuntimeError>;
    async fn go_forward(&self) -> Result<(), RuntimeError>;
    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> Result<(), RuntimeError>;
    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<(), RuntimeError>;
    async fn wait_for_url(&self, substring: &str, timeout: Duration) -> Result<(), RuntimeError>;

    async fn query_css(&self, selector: &str) -> Vec<ElementHandle>;
    async fn query_xpath(&self, expression: &str) -> Vec<ElementHandle>;
    async fn get_by_role(&self, role: &str, name: Option<&str>) -> Vec<ElementHandle>;
    async fn get_by_label(&self, text: &str) -> Vec<ElementHandle>;
    async fn get_by_text(&self, text: &str, exact: bool) -> Vec<ElementHandle>;
    async fn get_by_test_id(&self, id: &str) -> Vec<ElementHandle>;

    async fn element_snapshot(&self, el: &ElementHandle) -> Option<ElementSnapshot>;
    async fn click(&self, el: &ElementHandle) -> Result<(), RuntimeError>;
    async fn scroll_into_view(&self, el: &ElementHandle) -> Result<(), RuntimeError>;
    async fn hover(&self, el: &ElementHandle) -> Result<(), RuntimeError>;
    async fn drag_and_drop(&self, from: &ElementHandle, to: &ElementHandle) -> Result<(), RuntimeError>;
    async fn set_value(&self, el: &ElementHandle, value: &str, mode: SetValueMode) -> Result<(), RuntimeError>;
    async fn type_sequential(&self, el: &ElementHandle, text: &str, delay_ms: u64) -> Result<(), RuntimeError>;
    async fn press_key(&self, el: Option<&ElementHandle>, key: &str) -> Result<(), RuntimeError>;
    async fn select_option(&self, el: &ElementHandle, value: &str) -> Result<String, RuntimeError>;
    async fn set_checked(&self, el: &ElementHandle, checked: bool) -> Result<(), RuntimeError>;

    async fn text_content(&self, el: &ElementHandle) -> Option<String>;
    async fn inner_html(&self, el: &ElementHandle) -> Option<String>;
    async fn get_attribute(&self, el: &ElementHandle, name: &str) -> Option<String>;
    async fn page_content(&self) -> String;

    /// Escape hatch for scripts the typed capability set doesn't cover
    /// (e.g. a site-specific probe). Most primitives should prefer the
    /// typed methods above.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, RuntimeError>;

    async fn screenshot(&self) -> Result<Vec<u8>, RuntimeError>;
    async fn pdf(&self) -> Result<Vec<u8>, RuntimeError>;
    async fn scroll_by(&self, dx: i64, dy: i64) -> Result<(), RuntimeError>;

    async fn cookies(&self) -> Vec<Cookie>;
    async fn add_cookies(&self, cookies: Vec<Cookie>);
    async fn clear_cookies(&self);
    async fn local_storage(&self) -> LocalStorageMap;
    async fn set_local_storage(&self, data: LocalStorageMap);

    /// Monotonically increasing counter bumped on every DOM mutation;
    /// `waitForDomStability` (spec §4.3) polls this instead of installing a
    /// real `MutationObserver`.
    async fn dom_version(&self) -> u64;

    /// Dismisses the page's currently open native dialog (alert/confirm/
    /// prompt), if any. A no-op `Ok(())` when nothing is open.
    async fn dismiss_dialog(&self) -> Result<(), RuntimeError>;

    async fn close(&self) -> Result<(), RuntimeError>;
}

#[async_trait]
pub trait BrowserContext: Send + Sync {
    async fn new_page(&self) -> Result<std::sync::Arc<dyn Page>, RuntimeError>;
    async fn pages(&self) -> Vec<std::sync::Arc<dyn Page>>;
    async fn close(&self) -> Result<(), RuntimeError>;
    fn is_closed(&self) -> bool;
}

#[async_trait]
pub trait Browser: Send + Sync {
    async fn new_context(&self) -> Result<std::sync::Arc<dyn BrowserContext>, RuntimeError>;
    fn subscribe(&self) -> broadcast::Receiver<DriverEvent>;
    fn is_connected(&self) -> bool;
    async fn close(&self) -> Result<(), RuntimeError>;
}
