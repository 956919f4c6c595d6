//! A pragmatic subset of CSS selector matching, enough for the fixtures
//! exercised by the fake driver's tests: tag names, `#id`, `.class`,
//! `[attr]`/`[attr=value]` (optionally quoted), and a single compound
//! selector combining them (`tag#id[attr=value]`). No combinators.

use super::document::FakeElement;

pub fn matches(selector: &str, element: &FakeElement) -> bool {
    let selector = selector.trim();
    if selector.is_empty() {
        return false;
    }
    for clause in split_compound(selector) {
        if !matches_clause(&clause, element) {
            return false;
        }
    }
    true
}

fn split_compound(selector: &str) -> Vec<String> {
    let mut clauses = Vec::new();
    let mut current = String::new();
    let mut chars = selector.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '#' | '.' => {
                if !current.is_empty() {
                    clauses.push(std::mem::take(&mut current));
                }
                current.push(c);
            }
            '[' => {
                if !current.is_empty() {
                    clauses.push(std::mem::take(&mut current));
                }
                current.push(c);
                for next in chars.by_ref() {
                    current.push(next);
                    if next == ']' {
                        break;
                    }
                }
                clauses.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        clauses.push(current);
    }
    clauses
}

fn matches_clause(clause: &str, element: &FakeElement) -> bool {
    if let Some(id) = clause.strip_prefix('#') {
        return element.attrs.get("id").map(String::as_str) == Some(id);
    }
    if let Some(class) = clause.strip_prefix('.') {
        return element
            .attrs
            .get("class")
            .map(|c| c.split_whitespace().any(|part| part == class))
            .unwrap_or(false);
    }
    if let Some(inner) = clause.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        return matches_attr_selector(inner, element);
    }
    if clause == "*" {
        return true;
    }
    element.tag.eq_ignore_ascii_case(clause)
}

fn matches_attr_selector(inner: &str, element: &FakeElement) -> bool {
    if let Some((key, value)) = inner.split_once('=') {
        let key = key.trim();
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        element.attrs.get(key).map(String::as_str) == Some(value)
    } else {
        element.attrs.contains_key(inner.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn element(attrs: &[(&str, &str)], tag: &str) -> FakeElement {
        let mut e = FakeElement::new(tag);
        e.attrs = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        e
    }

    #[test]
    fn matches_id() {
        let el = element(&[("id", "btn")], "button");
        assert!(matches("#btn", &el));
        assert!(!matches("#other", &el));
    }

    #[test]
    fn matches_attr_with_quotes() {
        let el = element(&[("data-testid", "action-btn")], "button");
        assert!(matches("[data-testid=\"action-btn\"]", &el));
    }

    #[test]
    fn matches_compound_tag_and_attr() {
        let el = element(&[("type", "submit")], "button");
        assert!(matches("button[type=submit]", &el));
        assert!(!matches("input[type=submit]", &el));
    }
}
