//! `request_approval` resolution (spec §6): injected provider → configured
//! `autoApprove` → `BROWSER_AUTO_APPROVE=="1"` → false.

use async_trait::async_trait;

#[async_trait]
pub trait ApprovalProvider: Send + Sync {
    /// Returns `None` if the provider can't decide (errors, or would
    /// return something other than a boolean); the cascade then falls
    /// through to the next step.
    async fn approve(&self, session_id: &str, message: &str) -> Option<bool>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ApprovalConfig {
    pub auto_approve: bool,
}

pub async fn resolve_approval(
    provider: Option<&(dyn ApprovalProvider)>,
    config: ApprovalConfig,
    session_id: &str,
    message: &str,
) -> bool {
    if let Some(provider) = provider {
        if let Some(decision) = provider.approve(session_id, message).await {
            return decision;
        }
    }
    if config.auto_approve {
        return true;
    }
    std::env::var("BROWSER_AUTO_APPROVE").map(|v| v == "1").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysNone;
    #[async_trait]
    impl ApprovalProvider for AlwaysNone {
        async fn approve(&self, _session_id: &str, _message: &str) -> Option<bool> {
            None
        }
    }

    struct AlwaysTrue;
    #[async_trait]
    impl ApprovalProvider for AlwaysTrue {
        async fn approve(&self, _session_id: &str, _message: &str) -> Option<bool> {
            Some(true)
        }
    }

    #[tokio::test]
    async fn provider_decision_wins() {
        let decision = resolve_approval(Some(&AlwaysTrue), ApprovalConfig::default(), "s1", "ok?").await;
        assert!(decision);
    }

    #[tokio::test]
    async fn falls_through_to_configured_auto_approve() {
        let decision = resolve_approval(Some(&AlwaysNone), ApprovalConfig { auto_approve: true }, "s1", "ok?").await;
        assert!(decision);
    }

    #[tokio::test]
    async fn defaults_to_false_with_nothing_configured() {
        std::env::remove_var("BROWSER_AUTO_APPROVE");
        let decision = resolve_approval(None, ApprovalConfig::default(), "s1", "ok?").await;
        assert!(!decision);
    }
}
