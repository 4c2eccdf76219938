//! Retry delays for provider calls.

use rand::Rng;
use std::time::Duration;

/// Computes how long to wait between provider attempts.
///
/// - Rate-limited failures back off exponentially: `base * 2^attempt`.
/// - Any other failure waits a flat `base`.
/// - Every fresh provider call is preceded by `base + jitter`, where jitter is
///   uniform in `[0, max_jitter]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base_delay: Duration,
    max_jitter: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(2))
    }
}

impl BackoffPolicy {
    pub fn new(base_delay: Duration, max_jitter: Duration) -> Self {
        Self { base_delay, max_jitter }
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_jitter(&self) -> Duration {
        self.max_jitter
    }

    /// Delay after a failed attempt (0-indexed). Deterministic.
    pub fn retry_delay(&self, attempt: u32, rate_limited: bool) -> Duration {
        if rate_limited {
            self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
        } else {
            self.base_delay
        }
    }

    /// Proactive wait before a fresh provider call.
    pub fn throttle_delay(&self) -> Duration {
        self.base_delay.saturating_add(self.jitter())
    }

    fn jitter(&self) -> Duration {
        let max_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_delay_doubles() {
        let policy = BackoffPolicy::new(Duration::from_secs(1), Duration::ZERO);
        assert_eq!(policy.retry_delay(0, true), Duration::from_secs(1));
        assert_eq!(policy.retry_delay(1, true), Duration::from_secs(2));
        assert_eq!(policy.retry_delay(2, true), Duration::from_secs(4));
        assert_eq!(policy.retry_delay(3, true), Duration::from_secs(8));
    }

    #[test]
    fn test_rate_limited_delay_strictly_increases() {
        let policy = BackoffPolicy::new(Duration::from_millis(250), Duration::from_secs(2));
        let delays: Vec<Duration> = (0..8).map(|attempt| policy.retry_delay(attempt, true)).collect();
        assert!(delays.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_generic_failure_delay_is_flat() {
        let policy = BackoffPolicy::new(Duration::from_secs(5), Duration::from_secs(2));
        for attempt in 0..5 {
            assert_eq!(policy.retry_delay(attempt, false), Duration::from_secs(5));
        }
    }

    #[test]
    fn test_large_attempt_saturates() {
        let policy = BackoffPolicy::new(Duration::from_secs(5), Duration::ZERO);
        assert_eq!(policy.retry_delay(64, true), Duration::from_secs(5).saturating_mul(u32::MAX));
    }

    #[test]
    fn test_throttle_delay_within_jitter_bounds() {
        let policy = BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(2));
        for _ in 0..100 {
            let delay = policy.throttle_delay();
            assert!(delay >= Duration::from_secs(1));
            assert!(delay <= Duration::from_secs(3));
        }
    }

    #[test]
    fn test_zero_jitter_is_exact() {
        let policy = BackoffPolicy::new(Duration::from_millis(300), Duration::ZERO);
        assert_eq!(policy.throttle_delay(), Duration::from_millis(300));
    }
}
