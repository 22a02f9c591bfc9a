//! Spacing of calls to upstream APIs that enforce a request rate limit.
use std::time::Duration;

use async_trait::async_trait;
use tokio::{sync::Mutex, time::Instant};
use tracing::trace;

/// BscScan free tier allows five calls per second, stay comfortably below.
pub const UPSTREAM_MIN_INTERVAL: Duration = Duration::from_millis(250);

#[async_trait]
pub trait RateLimiter {
    /// Resolves once the caller may issue its next request.
    async fn until_ready(&self);
}

/// Releases callers one at a time, each at least `min_interval` after the previous release. The
/// first caller passes immediately.
#[derive(Debug)]
pub struct FixedIntervalGate {
    last_release: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl FixedIntervalGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_release: Mutex::new(None),
            min_interval,
        }
    }
}

impl Default for FixedIntervalGate {
    fn default() -> Self {
        Self::new(UPSTREAM_MIN_INTERVAL)
    }
}

#[async_trait]
impl RateLimiter for FixedIntervalGate {
    async fn until_ready(&self) {
        // Holding the lock while sleeping queues concurrent callers.
        let mut last_release = self.last_release.lock().await;

        if let Some(last) = *last_release {
            let next = last + self.min_interval;
            if next > Instant::now() {
                trace!(wait = ?(next - Instant::now()), "rate limit gate closed, waiting");
                tokio::time::sleep_until(next).await;
            }
        }

        *last_release = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_caller_passes_immediately_test() {
        let gate = FixedIntervalGate::default();
        let start = Instant::now();
        gate.until_ready().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn spaces_consecutive_callers_test() {
        let gate = FixedIntervalGate::default();
        let mut releases = vec![];

        for _ in 0..5 {
            gate.until_ready().await;
            releases.push(Instant::now());
        }

        for pair in releases.windows(2) {
            assert!(pair[1] - pair[0] >= UPSTREAM_MIN_INTERVAL);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_wait_when_interval_passed_test() {
        let gate = FixedIntervalGate::default();
        gate.until_ready().await;
        tokio::time::advance(Duration::from_secs(1)).await;

        let start = Instant::now();
        gate.until_ready().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn spaces_concurrent_callers_test() {
        let gate = Arc::new(FixedIntervalGate::default());
        let releases = Arc::new(std::sync::Mutex::new(vec![]));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gate = gate.clone();
                let releases = releases.clone();
                tokio::spawn(async move {
                    gate.until_ready().await;
                    releases.lock().unwrap().push(Instant::now());
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        let mut releases = releases.lock().unwrap().clone();
        releases.sort();
        for pair in releases.windows(2) {
            assert!(pair[1] - pair[0] >= UPSTREAM_MIN_INTERVAL);
        }
    }
}
