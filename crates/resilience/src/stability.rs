//! `waitForDomStability` (spec §4.3): lets a page settle before reads and
//! around clicks. Polls the driver's mutation counter instead of installing
//! a real observer; never throws, since a quiet page is not an error.

use browser_driver::Page;
use std::time::{Duration, Instant};
use tokio::time::sleep;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Clone, Copy, Debug)]
pub struct StabilityConfig {
    /// How long `dom_version` must hold still to call the page stable.
    pub stability_ms: u64,
    /// Upper bound regardless of churn.
    pub hard_deadline_ms: u64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            stability_ms: 200,
            hard_deadline_ms: 5000,
        }
    }
}

pub async fn wait_for_dom_stability(page: &dyn Page, config: &StabilityConfig) {
    let hard_deadline = Instant::now() + Duration::from_millis(config.hard_deadline_ms);
    let mut last_version = page.dom_version().await;
    let mut last_change = Instant::now();

    loop {
        if last_change.elapsed() >= Duration::from_millis(config.stability_ms) {
            return;
        }
        if Instant::now() >= hard_deadline {
            return;
        }
        sleep(POLL_INTERVAL).await;
        let version = page.dom_version().await;
        if version != last_version {
            last_version = version;
            last_change = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_driver::fake::{FakeElement, FakePage};
    use std::time::Duration as StdDuration;

    #[tokio::test]
    async fn resolves_quickly_on_quiet_page() {
        let page = FakePage::new();
        let start = Instant::now();
        wait_for_dom_stability(
            page.as_ref(),
            &StabilityConfig {
                stability_ms: 30,
                hard_deadline_ms: 1000,
            },
        )
        .await;
        assert!(start.elapsed() < StdDuration::from_millis(500));
    }

    #[tokio::test]
    async fn never_exceeds_hard_deadline_under_constant_churn() {
        let page = FakePage::new();
        tokio::spawn({
            let page = page.clone();
            async move {
                for i in 0..50 {
                    sleep(Duration::from_millis(10)).await;
                    page.seed(vec![FakeElement::new("div").text(&i.to_string())]);
                }
            }
        });
        let start = Instant::now();
        wait_for_dom_stability(
            page.as_ref(),
            &StabilityConfig {
                stability_ms: 200,
                hard_deadline_ms: 300,
            },
        )
        .await;
        assert!(start.elapsed() < StdDuration::from_millis(600));
    }
}
