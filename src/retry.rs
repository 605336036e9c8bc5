//! Exponential backoff for fallible async operations.
//!
//! A [`RetryPolicy`] describes how many attempts to make and how long to
//! sleep between them. [`RetryPolicy::run`] drives an operation under that
//! policy, asking a predicate whether each failure is worth another attempt.
//!
//! # Backoff Strategy
//!
//! The delay after failed attempt `n` (1-based) is:
//! ```text
//! delay = min(base_delay * multiplier^(n-1), max_delay)
//! ```
//! No delay follows the final attempt. The default policy (3 attempts, 5 s
//! base, doubling) therefore sleeps 5 s and then 10 s before giving up.

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

/// Attempt budget and delay schedule for retries.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Factor applied to the delay after each further failure.
    pub multiplier: u32,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            multiplier: 2,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    #[cfg(test)]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based), or `None`
    /// when that attempt was the last one.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt >= self.max_attempts {
            return None;
        }
        let factor = self.multiplier.saturating_pow(attempt - 1);
        Some(self.base_delay.saturating_mul(factor).min(self.max_delay))
    }

    /// Every delay the policy would sleep if all attempts fail.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts)
            .filter_map(|a| self.delay_after(a))
            .collect()
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. The last error is returned in the latter two
    /// cases.
    #[instrument(level = "debug", skip_all, fields(%label))]
    pub async fn run<T, E, F, Fut, P>(&self, label: &str, mut op: F, retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let total_t0 = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let attempt_t0 = Instant::now();
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !retryable(&err) {
                return Err(err);
            }

            let Some(delay) = self.delay_after(attempt) else {
                error!(
                    attempt,
                    max = self.max_attempts,
                    elapsed_ms_total = total_t0.elapsed().as_millis(),
                    error = %err,
                    "{label}: exhausted retries"
                );
                return Err(err);
            };

            warn!(
                attempt,
                max = self.max_attempts,
                elapsed_ms_attempt = attempt_t0.elapsed().as_millis(),
                ?delay,
                error = %err,
                "{label}: attempt failed; backing off"
            );
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient,
        Fatal,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.schedule(),
            vec![Duration::from_secs(5), Duration::from_secs(10)]
        );
        assert_eq!(policy.delay_after(3), None);
    }

    #[test]
    fn test_schedule_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 6,
            base_delay: Duration::from_secs(10),
            multiplier: 2,
            max_delay: Duration::from_secs(30),
        };
        let secs: Vec<u64> = policy.schedule().iter().map(Duration::as_secs).collect();
        assert_eq!(secs, vec![10, 20, 30, 30, 30]);
    }

    #[test]
    fn test_single_attempt_has_no_delays() {
        assert!(RetryPolicy::new(1, Duration::from_secs(5)).schedule().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exhausts_attempts_with_backoff() {
        let calls = Cell::new(0);
        let t0 = tokio::time::Instant::now();

        let res: Result<(), TestError> = RetryPolicy::default()
            .run(
                "test",
                || {
                    calls.set(calls.get() + 1);
                    async { Err(TestError::Transient) }
                },
                |e| *e == TestError::Transient,
            )
            .await;

        assert_eq!(res, Err(TestError::Transient));
        assert_eq!(calls.get(), 3);
        let waited = t0.elapsed();
        assert!(waited >= Duration::from_secs(15));
        assert!(waited < Duration::from_secs(16));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_fatal_error() {
        let calls = Cell::new(0);
        let t0 = tokio::time::Instant::now();

        let res: Result<(), TestError> = RetryPolicy::default()
            .run(
                "test",
                || {
                    calls.set(calls.get() + 1);
                    async { Err(TestError::Fatal) }
                },
                |e| *e == TestError::Transient,
            )
            .await;

        assert_eq!(res, Err(TestError::Fatal));
        assert_eq!(calls.get(), 1);
        assert_eq!(t0.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_recovers_after_transient_failure() {
        let calls = Cell::new(0);

        let res = RetryPolicy::default()
            .run(
                "test",
                || {
                    calls.set(calls.get() + 1);
                    let n = calls.get();
                    async move {
                        if n < 2 {
                            Err(TestError::Transient)
                        } else {
                            Ok(n)
                        }
                    }
                },
                |e| *e == TestError::Transient,
            )
            .await;

        assert_eq!(res, Ok(2));
    }
}
