//! The closed error taxonomy (spec §4.1).
//!
//! Every kind carries a stable `code`, a `message`, and a default
//! `recovery_hint`. Only these six kinds are ever surfaced to callers as a
//! `StructuredError`; anything else collapses to a plain message string.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ErrorKind {
    TargetNotFound,
    StaleElement,
    AssertionFailed,
    NavigationInterrupted,
    TimeoutExceeded,
    SessionUnhealthy,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::TargetNotFound => "TARGET_NOT_FOUND",
            ErrorKind::StaleElement => "STALE_ELEMENT",
            ErrorKind::AssertionFailed => "ASSERTION_FAILED",
            ErrorKind::NavigationInterrupted => "NAVIGATION_INTERRUPTED",
            ErrorKind::TimeoutExceeded => "TIMEOUT_EXCEEDED",
            ErrorKind::SessionUnhealthy => "SESSION_UNHEALTHY",
        }
    }

    pub fn default_recovery_hint(self) -> &'static str {
        match self {
            ErrorKind::TargetNotFound => {
                "retry with a broader selector chain or verify the element renders"
            }
            ErrorKind::StaleElement => "re-register the handle; the element may have been replaced",
            ErrorKind::AssertionFailed => "inspect the page state; the pre/postcondition did not hold",
            ErrorKind::NavigationInterrupted => {
                "the page navigated mid-action; restart the workflow step"
            }
            ErrorKind::TimeoutExceeded => "increase the timeout tier or check for a hung page",
            ErrorKind::SessionUnhealthy => "the session is being auto-recovered; retry shortly",
        }
    }

    /// Whether the Action Engine retries this kind itself (spec §7 table).
    pub fn engine_retryable(self) -> bool {
        !matches!(
            self,
            ErrorKind::NavigationInterrupted | ErrorKind::SessionUnhealthy
        )
    }
}

/// A typed runtime error. `Other` covers unknown errors thrown by action
/// bodies that don't map onto the closed taxonomy; those never produce a
/// `StructuredError`, only a message string (spec §4.1, §7).
#[derive(Clone, Debug, Error)]
pub enum RuntimeError {
    #[error("{0}")]
    Taxonomy(#[from] TaxonomyError),

    #[error("{0}")]
    Other(String),
}

#[derive(Clone, Debug, Error)]
#[error("{kind_message}")]
pub struct TaxonomyError {
    pub kind: ErrorKind,
    pub kind_message: String,
    pub recovery_hint: String,
}

impl TaxonomyError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let kind_message = message.into();
        Self {
            kind,
            recovery_hint: kind.default_recovery_hint().to_string(),
            kind_message,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.recovery_hint = hint.into();
        self
    }

    pub fn structured(&self) -> StructuredError {
        StructuredError {
            code: self.kind.code().to_string(),
            message: self.kind_message.clone(),
            recovery_hint: self.recovery_hint.clone(),
        }
    }
}

impl RuntimeError {
    pub fn target_not_found(message: impl Into<String>) -> Self {
        TaxonomyError::new(ErrorKind::TargetNotFound, message).into()
    }

    pub fn stale_element(message: impl Into<String>) -> Self {
        TaxonomyError::new(ErrorKind::StaleElement, message).into()
    }

    pub fn assertion_failed(message: impl Into<String>) -> Self {
        TaxonomyError::new(ErrorKind::AssertionFailed, message).into()
    }

    pub fn navigation_interrupted(message: impl Into<String>) -> Self {
        TaxonomyError::new(ErrorKind::NavigationInterrupted, message).into()
    }

    pub fn timeout_exceeded(message: impl Into<String>) -> Self {
        TaxonomyError::new(ErrorKind::TimeoutExceeded, message).into()
    }

    pub fn session_unhealthy(message: impl Into<String>) -> Self {
        TaxonomyError::new(ErrorKind::SessionUnhealthy, message).into()
    }

    pub fn other(message: impl Into<String>) -> Self {
        RuntimeError::Other(message.into())
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            RuntimeError::Taxonomy(t) => Some(t.kind),
            RuntimeError::Other(_) => None,
        }
    }

    /// Only typed kinds produce a `StructuredError`; everything else is a
    /// message string (spec §4.1, §7).
    pub fn structured(&self) -> Option<StructuredError> {
        match self {
            RuntimeError::Taxonomy(t) => Some(t.structured()),
            RuntimeError::Other(_) => None,
        }
    }

    pub fn engine_retryable(&self) -> bool {
        match self {
            RuntimeError::Taxonomy(t) => t.kind.engine_retryable(),
            RuntimeError::Other(_) => true,
        }
    }
}

/// The shape exposed in `ActionResult.structuredError` (spec §3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StructuredError {
    pub code: String,
    pub message: String,
    pub recovery_hint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_expose_structured_form() {
        let err = RuntimeError::target_not_found("no match");
        let structured = err.structured().expect("structured");
        assert_eq!(structured.code, "TARGET_NOT_FOUND");
    }

    #[test]
    fn unknown_errors_have_no_structured_form() {
        let err = RuntimeError::other("boom");
        assert!(err.structured().is_none());
    }

    #[test]
    fn navigation_interrupted_is_not_engine_retryable() {
        let err = RuntimeError::navigation_interrupted("url changed");
        assert!(!err.engine_retryable());
    }

    #[test]
    fn target_not_found_is_engine_retryable() {
        let err = RuntimeError::target_not_found("nope");
        assert!(err.engine_retryable());
    }
}
