//! An in-memory "DOM" used by [`super::page::FakePage`] so the engine,
//! resolver, and pool can be exercised without a real browser.

use crate::types::ElementHandle;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct FakeElement {
    pub id: String,
    pub tag: String,
    pub attrs: HashMap<String, String>,
    pub text: String,
    pub role: Option<String>,
    pub aria_label: Option<String>,
    pub label_text: Option<String>,
    pub visible: bool,
    pub attached: bool,
    pub enabled: bool,
    pub value: Option<String>,
    pub checked: Option<bool>,
    pub options: Vec<(String, String)>,
}

impl FakeElement {
    pub fn new(tag: &str) -> Self {
        Self {
            id: String::new(),
            tag: tag.to_string(),
            attrs: HashMap::new(),
            text: String::new(),
            role: None,
            aria_label: None,
            label_text: None,
            visible: true,
            attached: true,
            enabled: true,
            value: None,
            checked: None,
            options: Vec::new(),
        }
    }

    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.insert(key.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn aria_label(mut self, label: &str) -> Self {
        self.aria_label = Some(label.to_string());
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label_text = Some(label.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn detached(mut self) -> Self {
        self.attached = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn options(mut self, options: &[(&str, &str)]) -> Self {
        self.options = options
            .iter()
            .map(|(v, l)| (v.to_string(), l.to_string()))
            .collect();
        self
    }
}

#[derive(Default)]
pub struct FakeDocument {
    pub elements: Vec<FakeElement>,
    next_id: u64,
    pub version: u64,
}

impl FakeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.version = self.version.wrapping_add(1);
    }

    pub fn insert(&mut self, mut element: FakeElement) -> ElementHandle {
        self.next_id += 1;
        let id = format!("el-{}", self.next_id);
        element.id = id.clone();
        self.elements.push(element);
        self.version = self.version.wrapping_add(1);
        ElementHandle(id)
    }

    pub fn remove_matching(&mut self, selector: &str) -> usize {
        let before = self.elements.len();
        self.elements
            .retain(|e| !super::matcher::matches(selector, e));
        let removed = before - self.elements.len();
        if removed > 0 {
            self.version = self.version.wrapping_add(1);
        }
        removed
    }

    pub fn get(&self, handle: &ElementHandle) -> Option<&FakeElement> {
        self.elements.iter().find(|e| e.id == handle.0)
    }

    pub fn get_mut(&mut self, handle: &ElementHandle) -> Option<&mut FakeElement> {
        self.elements.iter_mut().find(|e| e.id == handle.0)
    }

    pub fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    pub fn query_css(&self, selector: &str) -> Vec<ElementHandle> {
        self.elements
            .iter()
            .filter(|e| e.attached && super::matcher::matches(selector, e))
            .map(|e| ElementHandle(e.id.clone()))
            .collect()
    }

    pub fn query_by_role(&self, role: &str, name: Option<&str>) -> Vec<ElementHandle> {
        self.elements
            .iter()
            .filter(|e| e.attached && e.role.as_deref() == Some(role))
            .filter(|e| {
                name.map(|n| {
                    e.aria_label.as_deref() == Some(n) || e.text == n
                })
                .unwrap_or(true)
            })
            .map(|e| ElementHandle(e.id.clone()))
            .collect()
    }

    pub fn query_by_label(&self, text: &str) -> Vec<ElementHandle> {
        self.elements
            .iter()
            .filter(|e| e.attached && e.label_text.as_deref() == Some(text))
            .map(|e| ElementHandle(e.id.clone()))
            .collect()
    }

    pub fn query_by_text(&self, text: &str, exact: bool) -> Vec<ElementHandle> {
        self.elements
            .iter()
            .filter(|e| {
                e.attached
                    && if exact {
                        e.text == text
                    } else {
                        e.text.contains(text)
                    }
            })
            .map(|e| ElementHandle(e.id.clone()))
            .collect()
    }

    pub fn query_by_test_id(&self, id: &str) -> Vec<ElementHandle> {
        self.elements
            .iter()
            .filter(|e| e.attached && e.attrs.get("data-testid").map(String::as_str) == Some(id))
            .map(|e| ElementHandle(e.id.clone()))
            .collect()
    }

    /// A tiny XPath subset: `//tag[@attr='value']` or `//tag`.
    pub fn query_xpath(&self, expression: &str) -> Vec<ElementHandle> {
        let expr = expression.trim_start_matches('/').trim_start_matches('/');
        let (tag, predicate) = match expr.find('[') {
            Some(idx) => (&expr[..idx], Some(&expr[idx..])),
            None => (expr, None),
        };
        self.elements
            .iter()
            .filter(|e| e.attached && (tag == "*" || e.tag.eq_ignore_ascii_case(tag)))
            .filter(|e| match predicate {
                None => true,
                Some(p) => xpath_predicate_matches(p, e),
            })
            .map(|e| ElementHandle(e.id.clone()))
            .collect()
    }
}

fn xpath_predicate_matches(predicate: &str, element: &FakeElement) -> bool {
    let inner = predicate.trim_start_matches('[').trim_end_matches(']');
    let inner = inner.trim_start_matches('@');
    if let Some((key, value)) = inner.split_once('=') {
        let value = value.trim().trim_matches('\'').trim_matches('"');
        element.attrs.get(key.trim()).map(String::as_str) == Some(value)
    } else {
        true
    }
}
