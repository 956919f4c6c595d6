//! The in-memory [`Page`] implementation backing tests across the
//! workspace. It does not execute JavaScript; `evaluate` only understands a
//! handful of canned probes (`document.readyState`, `document.title`) that
//! mirror what the core actually needs from a real driver.

use super::document::{FakeDocument, FakeElement};
use crate::traits::Page;
use crate::types::{Cookie, ElementHandle, ElementSnapshot, LoadState, LocalStorageMap, SetValueMode};
use async_trait::async_trait;
use browser_core_types::{PageId, RuntimeError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

pub struct FakePage {
    id: PageId,
    inner: Mutex<Inner>,
    closed: AtomicBool,
    dialogs_dismissed: AtomicU64,
}

struct Inner {
    url: String,
    title: String,
    document: FakeDocument,
    cookies: Vec<Cookie>,
    local_storage: LocalStorageMap,
}

impl FakePage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: PageId::new(),
            inner: Mutex::new(Inner {
                url: "about:blank".to_string(),
                title: String::new(),
                document: FakeDocument::new(),
                cookies: Vec::new(),
                local_storage: HashMap::new(),
            }),
            closed: AtomicBool::new(false),
            dialogs_dismissed: AtomicU64::new(0),
        })
    }

    /// Test helper: how many times `dismiss_dialog` has been called.
    pub fn dialogs_dismissed(&self) -> u64 {
        self.dialogs_dismissed.load(Ordering::SeqCst)
    }

    /// Test helper: seed the current document with elements.
    pub fn seed(&self, elements: Vec<FakeElement>) {
        let mut inner = self.inner.lock();
        for el in elements {
            inner.document.insert(el);
        }
    }

    pub fn set_title(&self, title: &str) {
        self.inner.lock().title = title.to_string();
    }

    /// Test helper: append an element after a delay, to simulate a slow
    /// page (spec §8 scenario 3).
    pub fn schedule_insert(self: &Arc<Self>, after: Duration, element: FakeElement) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            sleep(after).await;
            if this.closed.load(Ordering::SeqCst) {
                return;
            }
            let mut inner = this.inner.lock();
            inner.document.insert(element);
        });
    }

    pub fn remove(&self, selector: &str) -> usize {
        self.inner.lock().document.remove_matching(selector)
    }

    pub fn bump_dom_version(&self) {
        self.inner.lock().document.bump_version();
    }
}

fn set_click_side_effect(inner: &mut Inner, el: &ElementHandle) {
    let effect = inner
        .document
        .get(el)
        .and_then(|e| e.attrs.get("data-click-sets-text").cloned())
        .and_then(|raw| raw.split_once('=').map(|(a, b)| (a.to_string(), b.to_string())));
    if let Some((target_selector, new_text)) = effect {
        for handle in inner.document.query_css(&target_selector) {
            if let Some(target) = inner.document.get_mut(&handle) {
                target.text = new_text.clone();
            }
        }
        inner.document.bump_version();
    }
}

#[async_trait]
impl Page for FakePage {
    fn id(&self) -> &PageId {
        &self.id
    }

    async fn url(&self) -> String {
        self.inner.lock().url.clone()
    }

    async fn title(&self) -> String {
        self.inner.lock().title.clone()
    }

    async fn ready_state(&self) -> String {
        "complete".to_string()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn goto(&self, url: &str) -> Result<(), RuntimeError> {
        let mut inner = self.inner.lock();
        inner.url = url.to_string();
        inner.document.clear();
        Ok(())
    }

    async fn reload(&self) -> Result<(), RuntimeError> {
        self.inner.lock().document.bump_version();
        Ok(())
    }

    async fn go_back(&self) -> Result<(), RuntimeError> {
        Ok(())
    }

    async fn go_forward(&self) -> Result<(), RuntimeError> {
        Ok(())
    }

    async fn wait_for_load_state(&self, _state: LoadState, _timeout: Duration) -> Result<(), RuntimeError> {
        Ok(())
    }

    async fn wait_for_network_idle(&self, _timeout: Duration) -> Result<(), RuntimeError> {
        Ok(())
    }

    async fn wait_for_url(&self, substring: &str, timeout: Duration) -> Result<(), RuntimeError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.inner.lock().url.contains(substring) {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(RuntimeError::timeout_exceeded(format!(
                    "url never contained '{substring}'"
                )));
            }
            sleep(Duration::from_millis(10)).await;
        }
    }

    async fn query_css(&self, selector: &str) -> Vec<ElementHandle> {
        self.inner.lock().document.query_css(selector)
    }

    async fn query_xpath(&self, expression: &str) -> Vec<ElementHandle> {
        self.inner.lock().document.query_xpath(expression)
    }

    async fn get_by_role(&self, role: &str, name: Option<&str>) -> Vec<ElementHandle> {
        self.inner.lock().document.query_by_role(role, name)
    }

    async fn get_by_label(&self, text: &str) -> Vec<ElementHandle> {
        self.inner.lock().document.query_by_label(text)
    }

    async fn get_by_text(&self, text: &str, exact: bool) -> Vec<ElementHandle> {
        self.inner.lock().document.query_by_text(text, exact)
    }

    async fn get_by_test_id(&self, id: &str) -> Vec<ElementHandle> {
        self.inner.lock().document.query_by_test_id(id)
    }

    async fn element_snapshot(&self, el: &ElementHandle) -> Option<ElementSnapshot> {
        let inner = self.inner.lock();
        inner.document.get(el).map(|e| ElementSnapshot {
            tag_name: e.tag.clone(),
            attached: e.attached,
            visible: e.visible,
            enabled: e.enabled,
            aria_role: e.role.clone(),
            aria_label: e.aria_label.clone(),
            text: Some(e.text.clone()),
        })
    }

    async fn click(&self, el: &ElementHandle) -> Result<(), RuntimeError> {
        let mut inner = self.inner.lock();
        let snapshot_ok = inner
            .document
            .get(el)
            .map(|e| e.attached && e.visible)
            .unwrap_or(false);
        if !snapshot_ok {
            return Err(RuntimeError::target_not_found(format!(
                "element {} not attached or not visible",
                el.as_str()
            )));
        }
        set_click_side_effect(&mut inner, el);
        Ok(())
    }

    async fn scroll_into_view(&self, el: &ElementHandle) -> Result<(), RuntimeError> {
        let exists = self.inner.lock().document.get(el).is_some();
        if exists {
            Ok(())
        } else {
            Err(RuntimeError::stale_element(format!("{} missing", el.as_str())))
        }
    }

    async fn hover(&self, el: &ElementHandle) -> Result<(), RuntimeError> {
        self.scroll_into_view(el).await
    }

    async fn drag_and_drop(&self, from: &ElementHandle, to: &ElementHandle) -> Result<(), RuntimeError> {
        let mut inner = self.inner.lock();
        let from_attached = inner.document.get(from).map(|e| e.attached).unwrap_or(false);
        let to_attached = inner.document.get(to).map(|e| e.attached).unwrap_or(false);
        if !from_attached || !to_attached {
            return Err(RuntimeError::target_not_found("drag source or target missing"));
        }
        inner.document.bump_version();
        Ok(())
    }

    async fn set_value(&self, el: &ElementHandle, value: &str, _mode: SetValueMode) -> Result<(), RuntimeError> {
        let mut inner = self.inner.lock();
        match inner.document.get_mut(el) {
            Some(e) if e.attached => {
                e.value = Some(value.to_string());
                inner.document.bump_version();
                Ok(())
            }
            _ => Err(RuntimeError::stale_element(format!("{} missing", el.as_str()))),
        }
    }

    async fn type_sequential(&self, el: &ElementHandle, text: &str, delay_ms: u64) -> Result<(), RuntimeError> {
        for ch in text.chars() {
            if delay_ms > 0 {
                sleep(Duration::from_millis(delay_ms)).await;
            }
            let mut inner = self.inner.lock();
            match inner.document.get_mut(el) {
                Some(e) if e.attached => {
                    let mut current = e.value.clone().unwrap_or_default();
                    current.push(ch);
                    e.value = Some(current);
                }
                _ => return Err(RuntimeError::stale_element(format!("{} missing", el.as_str()))),
            }
        }
        self.inner.lock().document.bump_version();
        Ok(())
    }

    async fn press_key(&self, _el: Option<&ElementHandle>, _key: &str) -> Result<(), RuntimeError> {
        Ok(())
    }

    async fn select_option(&self, el: &ElementHandle, value: &str) -> Result<String, RuntimeError> {
        let mut inner = self.inner.lock();
        let (selected_label, found) = match inner.document.get(el) {
            Some(e) => {
                let opt = e.options.iter().find(|(v, _)| v == value).cloned();
                match opt {
                    Some((_, label)) => (label, true),
                    None => {
                        return Err(RuntimeError::target_not_found(format!(
                            "option '{value}' not found"
                        )))
                    }
                }
            }
            None => (String::new(), false),
        };
        if !found {
            return Err(RuntimeError::stale_element(format!("{} missing", el.as_str())));
        }
        if let Some(e) = inner.document.get_mut(el) {
            e.value = Some(value.to_string());
        }
        inner.document.bump_version();
        Ok(selected_label)
    }

    async fn set_checked(&self, el: &ElementHandle, checked: bool) -> Result<(), RuntimeError> {
        let mut inner = self.inner.lock();
        match inner.document.get_mut(el) {
            Some(e) if e.attached => {
                e.checked = Some(checked);
                inner.document.bump_version();
                Ok(())
            }
            _ => Err(RuntimeError::stale_element(format!("{} missing", el.as_str()))),
        }
    }

    async fn text_content(&self, el: &ElementHandle) -> Option<String> {
        self.inner.lock().document.get(el).map(|e| e.text.clone())
    }

    async fn inner_html(&self, el: &ElementHandle) -> Option<String> {
        self.inner
            .lock()
            .document
            .get(el)
            .map(|e| format!("<{0}>{1}</{0}>", e.tag, e.text))
    }

    async fn get_attribute(&self, el: &ElementHandle, name: &str) -> Option<String> {
        self.inner
            .lock()
            .document
            .get(el)
            .and_then(|e| e.attrs.get(name).cloned())
    }

    async fn page_content(&self) -> String {
        let inner = self.inner.lock();
        inner
            .document
            .elements
            .iter()
            .filter(|e| e.attached && !matches!(e.tag.as_str(), "script" | "style" | "noscript" | "svg"))
            .map(|e| e.text.clone())
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, RuntimeError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RuntimeError::other("page is closed"));
        }
        let inner = self.inner.lock();
        match script {
            "document.readyState" => Ok(serde_json::json!("complete")),
            "document.title" => Ok(serde_json::json!(inner.title.clone())),
            _ => Ok(serde_json::Value::Null),
        }
    }

    async fn screenshot(&self) -> Result<Vec<u8>, RuntimeError> {
        Ok(b"fake-png-bytes".to_vec())
    }

    async fn pdf(&self) -> Result<Vec<u8>, RuntimeError> {
        Ok(b"fake-pdf-bytes".to_vec())
    }

    async fn scroll_by(&self, _dx: i64, _dy: i64) -> Result<(), RuntimeError> {
        Ok(())
    }

    async fn cookies(&self) -> Vec<Cookie> {
        self.inner.lock().cookies.clone()
    }

    async fn add_cookies(&self, cookies: Vec<Cookie>) {
        self.inner.lock().cookies.extend(cookies);
    }

    async fn clear_cookies(&self) {
        self.inner.lock().cookies.clear();
    }

    async fn local_storage(&self) -> LocalStorageMap {
        self.inner.lock().local_storage.clone()
    }

    async fn set_local_storage(&self, data: LocalStorageMap) {
        self.inner.lock().local_storage = data;
    }

    async fn dom_version(&self) -> u64 {
        self.inner.lock().document.version
    }

    async fn dismiss_dialog(&self) -> Result<(), RuntimeError> {
        self.dialogs_dismissed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), RuntimeError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
