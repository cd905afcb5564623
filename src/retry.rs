use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Bounded retry with a fixed or growing delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub delay: Duration,
    /// Multiplier applied to the delay after every further failure (1 = fixed delay)
    pub backoff: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(3),
            backoff: 1,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries `max_attempts` times without sleeping
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
            backoff: 1,
        }
    }

    /// Delay before the retry following failed attempt number `attempt` (0-indexed)
    ///
    /// `delay * backoff^attempt`, saturating instead of overflowing.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff.saturating_pow(attempt);
        self.delay.saturating_mul(multiplier)
    }

    /// Run `op` until it succeeds or the attempts are used up
    ///
    /// Every failure is logged; the last error is returned on exhaustion.
    /// No sleep follows the final attempt.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempt += 1;
                    if attempt >= attempts {
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt - 1);
                    warn!(
                        target: "anistrm::retry",
                        %label,
                        attempt,
                        error = %e,
                        "Request failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn default_matches_listing_contract() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(3));
        assert_eq!(policy.backoff, 1);
    }

    #[test]
    fn fixed_delay_with_unit_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(3));
        assert_eq!(policy.delay_for(1), Duration::from_secs(3));
        assert_eq!(policy.delay_for(5), Duration::from_secs(3));
    }

    #[test]
    fn delay_grows_with_backoff() {
        let policy = RetryPolicy {
            max_attempts: 5,
            delay: Duration::from_millis(100),
            backoff: 2,
        };

        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
    }

    #[test]
    fn delay_saturates() {
        let policy = RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_secs(u64::MAX / 2),
            backoff: 4,
        };

        assert!(policy.delay_for(40) > Duration::ZERO);
    }

    #[tokio::test]
    async fn returns_first_success() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, String> = RetryPolicy::immediate(3)
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, String> = RetryPolicy::immediate(3)
            .run("test", move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 { Err(format!("fail {n}")) } else { Ok(n) }
            })
            .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, String> = RetryPolicy::immediate(3)
            .run("test", move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Err(format!("fail {n}"))
            })
            .await;

        assert_eq!(result, Err("fail 2".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_between_attempts_only() {
        let start = tokio::time::Instant::now();
        let result: Result<(), String> = RetryPolicy::default()
            .run("test", || async { Err("down".to_string()) })
            .await;

        assert!(result.is_err());
        // Three attempts, two pauses, none after the last failure
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(6), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(7), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn success_does_not_sleep() {
        let start = tokio::time::Instant::now();
        let result: Result<u32, String> = RetryPolicy::default()
            .run("test", || async { Ok(1) })
            .await;

        assert_eq!(result, Ok(1));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let calls = &AtomicU32::new(0);
        let _: Result<(), String> = RetryPolicy::immediate(0)
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("nope".to_string())
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
