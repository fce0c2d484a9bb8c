//! Backoff policy for provider requests.

use std::time::Duration;

/// Backoff strategy for retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffStrategy {
    /// Same delay before every retry
    Fixed,
    /// base * 2^(attempt-1)
    #[default]
    Exponential,
    /// base * attempt
    Linear,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (0 and 1 both mean "no retry").
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub strategy: BackoffStrategy,
    /// Jitter factor (0.0-1.0)
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            strategy: BackoffStrategy::Exponential,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            max_delay: delay,
            strategy: BackoffStrategy::Fixed,
            jitter: 0.0,
        }
    }

    pub fn exponential(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
            strategy: BackoffStrategy::Exponential,
            jitter: 0.1,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_ms = self.base_delay.as_millis() as f64;
        let max_ms = self.max_delay.as_millis() as f64;

        let delay_ms = match self.strategy {
            BackoffStrategy::Fixed => base_ms,
            BackoffStrategy::Exponential => (base_ms * 2_f64.powi((attempt - 1).min(30) as i32)).min(max_ms),
            BackoffStrategy::Linear => (base_ms * attempt as f64).min(max_ms),
        };

        // Deterministic spread keyed on the attempt number.
        let spread = delay_ms * self.jitter.clamp(0.0, 1.0);
        let offset = if spread > 0.0 {
            let unit = ((attempt as f64 * 17.0) % 100.0) / 100.0;
            spread * (unit - 0.5) * 2.0
        } else {
            0.0
        };

        Duration::from_millis((delay_ms + offset).max(0.0) as u64)
    }

    /// Whether another attempt is allowed after `attempt` attempts have run.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts.max(1)
    }

    /// Sum of every backoff delay slept between attempts.
    pub fn total_backoff(&self) -> Duration {
        (1..self.max_attempts.max(1)).map(|a| self.delay_for_attempt(a)).sum()
    }

    /// Wall time a full retry run can take when each attempt is capped at `per_attempt`.
    pub fn worst_case(&self, per_attempt: Duration) -> Duration {
        per_attempt * self.max_attempts.max(1) + self.total_backoff()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worst_case_covers_every_attempt_and_backoff() {
        let p = RetryPolicy::fixed(3, Duration::from_millis(40));
        assert_eq!(p.total_backoff(), Duration::from_millis(80));
        assert_eq!(p.worst_case(Duration::from_secs(1)), Duration::from_millis(3_080));

        let once = RetryPolicy::no_retry();
        assert_eq!(once.total_backoff(), Duration::ZERO);
        assert_eq!(once.worst_case(Duration::from_secs(2)), Duration::from_secs(2));
    }

    #[test]
    fn exponential_doubles_until_capped() {
        let p = RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::exponential(10, Duration::from_millis(100), Duration::from_millis(500))
        };
        assert_eq!(p.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(p.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(p.delay_for_attempt(3), Duration::from_millis(400));
        assert_eq!(p.delay_for_attempt(4), Duration::from_millis(500));
    }

    #[test]
    fn linear_and_fixed() {
        let fixed = RetryPolicy::fixed(3, Duration::from_millis(40));
        assert_eq!(fixed.delay_for_attempt(3), Duration::from_millis(40));

        let linear = RetryPolicy {
            strategy: BackoffStrategy::Linear,
            jitter: 0.0,
            ..RetryPolicy::fixed(3, Duration::from_millis(40))
        };
        let linear = RetryPolicy {
            max_delay: Duration::from_secs(1),
            ..linear
        };
        assert_eq!(linear.delay_for_attempt(3), Duration::from_millis(120));
    }

    #[test]
    fn jitter_is_deterministic_and_bounded() {
        let p = RetryPolicy::default();
        let a = p.delay_for_attempt(2);
        assert_eq!(a, p.delay_for_attempt(2));
        assert!(a >= Duration::from_millis(450) && a <= Duration::from_millis(550));
    }

    #[test]
    fn attempt_budget() {
        let p = RetryPolicy::fixed(3, Duration::ZERO);
        assert!(p.should_retry(2));
        assert!(!p.should_retry(3));
        assert!(!RetryPolicy::no_retry().should_retry(1));
        assert_eq!(p.delay_for_attempt(0), Duration::ZERO);
    }
}
