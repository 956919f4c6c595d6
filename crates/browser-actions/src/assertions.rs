//! Postcondition assertion factories every action uses (spec §4.5).
//!
//! Each factory produces a [`browser_action_engine::Predicate`] — the same
//! shape `ActionOptions::precondition`/`postcondition` accept — so any
//! action can hand one straight to the engine; `all_of` short-circuits on
//! the first failure.

use browser_action_engine::Predicate;
use browser_driver::Page;
use browser_selector_resolver::{Selector, WaitState};
use std::sync::Arc;

pub type Assertion = Predicate;

pub fn assert_url_contains(substring: impl Into<String>) -> Assertion {
    let substring = substring.into();
    Arc::new(move |page: &dyn Page| {
        let substring = substring.clone();
        Box::pin(async move { page.url().await.contains(&substring) })
    })
}

pub fn assert_element_visible(selector: Selector) -> Assertion {
    Arc::new(move |page: &dyn Page| {
        let selector = selector.clone();
        Box::pin(async move { browser_selector_resolver::resolve(page, &selector, WaitState::Visible, 1000).await.is_ok() })
    })
}

pub fn assert_element_gone(selector: Selector) -> Assertion {
    Arc::new(move |page: &dyn Page| {
        let selector = selector.clone();
        Box::pin(async move { browser_selector_resolver::resolve(page, &selector, WaitState::Detached, 1000).await.is_ok() })
    })
}

#[derive(Clone)]
pub enum TextMatch {
    Exact(String),
    Pattern(regex::Regex),
}

pub fn assert_element_text(selector: Selector, expected: TextMatch) -> Assertion {
    Arc::new(move |page: &dyn Page| {
        let selector = selector.clone();
        let expected = expected.clone();
        Box::pin(async move {
            let resolution = match browser_selector_resolver::resolve(page, &selector, WaitState::Attached, 1000).await {
                Ok(r) => r,
                Err(_) => return false,
            };
            let text = page.text_content(&resolution.locator).await.unwrap_or_default();
            match &expected {
                TextMatch::Exact(want) => &text == want,
                TextMatch::Pattern(re) => re.is_match(&text),
            }
        })
    })
}

/// Short-circuits on the first assertion that returns `false`.
pub fn all_of(assertions: Vec<Assertion>) -> Assertion {
    let assertions = Arc::new(assertions);
    Arc::new(move |page: &dyn Page| {
        let assertions = Arc::clone(&assertions);
        Box::pin(async move {
            for assertion in assertions.iter() {
                if !assertion(page).await {
                    return false;
                }
            }
            true
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_driver::fake::{FakeElement, FakePage};

    #[tokio::test]
    async fn assert_url_contains_matches_substring() {
        let page = FakePage::new();
        page.goto("https://example.com/checkout").await.unwrap();
        let assertion = assert_url_contains("checkout");
        assert!(assertion(page.as_ref()).await);
        assert!(!assert_url_contains("nope")(page.as_ref()).await);
    }

    #[tokio::test]
    async fn assert_element_visible_and_gone_agree_with_the_dom() {
        let page = FakePage::new();
        page.seed(vec![FakeElement::new("div").attr("id", "panel")]);
        let selector = Selector::Css("#panel".to_string());
        assert!(assert_element_visible(selector.clone())(page.as_ref()).await);
        assert!(!assert_element_gone(selector.clone())(page.as_ref()).await);

        page.remove("#panel");
        assert!(assert_element_gone(selector)(page.as_ref()).await);
    }

    #[tokio::test]
    async fn all_of_short_circuits_on_first_failure() {
        let page = FakePage::new();
        page.goto("https://example.com/a").await.unwrap();
        let assertion = all_of(vec![assert_url_contains("example.com"), assert_url_contains("b")]);
        assert!(!assertion(page.as_ref()).await);
    }
}
