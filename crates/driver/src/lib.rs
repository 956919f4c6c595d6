//! The driver capability set (spec §4.10): the `Page`/`BrowserContext`/
//! `Browser` traits every other crate programs against, plus an in-memory
//! `fake` implementation used by their test suites.
//!
//! A real CDP- or WebDriver-speaking implementation is out of scope.

pub mod fake;
pub mod traits;
pub mod types;

pub use traits::{Browser, BrowserContext, Page};
pub use types::{
    Cookie, DriverEvent, ElementHandle, ElementSnapshot, LoadState, LocalStorageMap, SetValueMode,
};
