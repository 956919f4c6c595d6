//! Value types shared by the driver capability traits.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An opaque reference to a resolved DOM node, scoped to one page.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadState {
    DomContentLoaded,
    Load,
    NetworkIdle,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SetValueMode {
    /// Programmatic set + read-back verification.
    Fill,
    /// The native property setter plus `input`/`change`/`blur` dispatch.
    NativeSetter,
    /// A clipboard paste event with a DataTransfer payload (falls back to
    /// value-set + input/change when the driver can't synthesize paste).
    Paste,
}

/// A point-in-time read of an element's interaction-relevant state.
#[derive(Clone, Debug, Default)]
pub struct ElementSnapshot {
    pub tag_name: String,
    pub attached: bool,
    pub visible: bool,
    pub enabled: bool,
    pub aria_role: Option<String>,
    pub aria_label: Option<String>,
    pub text: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

pub type LocalStorageMap = HashMap<String, String>;

/// Events a `Browser` broadcasts that the pool's health monitor and
/// auto-recovery react to (spec §4.8).
#[derive(Clone, Debug)]
pub enum DriverEvent {
    PageCrashed { page_id: String },
    PageClosed { page_id: String },
    BrowserDisconnected,
    /// A native `alert`/`confirm`/`prompt` dialog opened; the resilience
    /// layer's popup dismisser auto-dismisses these (spec §4.3).
    NativeDialog { page_id: String, message: String },
}
