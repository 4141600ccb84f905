//! Deadline-bounded polling

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Interval between two condition checks
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Poll `condition` every [`POLL_INTERVAL`] until it holds or `timeout` elapses.
///
/// Returns `false` when the deadline passes first.
pub async fn wait_for_condition<F, Fut>(mut condition: F, timeout: Duration) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;

    while Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_condition_met_after_polls() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let met = wait_for_condition(
            move || {
                let counter = counter.clone();
                async move { counter.fetch_add(1, Ordering::SeqCst) >= 2 }
            },
            Duration::from_secs(5),
        )
        .await;

        assert!(met);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_failure() {
        let start = Instant::now();
        let met = wait_for_condition(|| async { false }, Duration::from_secs(2)).await;

        assert!(!met);
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
