//! Per-action primitives that run inside the Action Engine envelope: every
//! primitive here inherits retries, popup dismissal, trace emission, and
//! terminal-failure screenshots (spec §4.5).

mod assertions;
mod context;
mod extraction;
mod interaction;
mod navigation;
mod page_ops;
mod semantic;
mod types;
mod waiting;

pub use assertions::{all_of, assert_element_gone, assert_element_text, assert_element_visible, assert_url_contains, Assertion, TextMatch};
pub use context::ActionContext;
pub use extraction::{extract_structured, get_all, get_attribute, get_page_content, get_text};
pub use interaction::{check, click, drag_and_drop, fill_map, hover, select, type_text, uncheck};
pub use navigation::{go_back, go_forward, navigate, reload, wait_for_navigation};
pub use page_ops::{get_page_state, pdf, screenshot, scroll};
pub use semantic::{apply_filter, select_autocomplete, set_date_field, set_field, submit_form};
pub use types::{
    ExtractionSchema, FieldType, FillMapOutcome, NavigateOutcome, PageState, Provenance, SchemaField, ScrollDirection, StructuredExtraction, Target,
    TypeMode,
};
pub use waiting::{wait_for_condition, wait_for_network_idle, wait_for_selector, wait_for_url};
