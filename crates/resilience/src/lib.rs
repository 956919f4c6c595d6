//! DOM-stability waits and the popup/native-dialog dismisser every action
//! runs inside (spec §4.3).

mod popup;
mod stability;

pub use popup::{PopupDismisser, PopupDismisserConfig, PopupWatcherHandle};
pub use stability::{wait_for_dom_stability, StabilityConfig};
