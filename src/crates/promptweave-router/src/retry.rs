//! Exponential backoff with jitter for retrying a single candidate.
//!
//! Reshapes a generic `{max_attempts, initial_interval, backoff_factor,
//! max_interval, jitter: bool}` retry policy into the router's exact
//! `{max_attempts, base_delay_ms, max_delay_ms, jitter: fraction}` contract:
//! backoff factor is fixed at 2, and jitter is a bounded fraction of the
//! computed delay rather than an on/off switch.

use promptweave_core::RandomSource;
use std::time::Duration;

/// Retry policy for a single candidate backend within one `route` call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Fraction in `[0, 1]` of the computed delay to jitter by.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 5_000,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err("jitter must be within [0, 1]".to_string());
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err("max_delay_ms must be >= base_delay_ms".to_string());
        }
        Ok(())
    }

    /// `delay = min(max_delay_ms, base_delay_ms * 2^(attempt-1)) * (1 +/- jitter * rand())`.
    /// `attempt` is 1-indexed (the first retry is attempt 1).
    pub fn calculate_delay(&self, attempt: u32, random: &dyn RandomSource) -> Duration {
        let exponential = self
            .base_delay_ms
            .saturating_mul(1u64 << attempt.saturating_sub(1).min(32));
        let capped = exponential.min(self.max_delay_ms) as f64;

        if self.jitter == 0.0 {
            return Duration::from_millis(capped as u64);
        }

        let spread = random.gen_range_f64(-1.0..1.0) * self.jitter;
        let jittered = (capped * (1.0 + spread)).max(0.0);
        Duration::from_millis(jittered as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptweave_core::SeededRandom;

    #[test]
    fn rejects_zero_attempts() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn rejects_jitter_out_of_range() {
        let policy = RetryPolicy {
            jitter: 1.5,
            ..RetryPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn zero_jitter_is_deterministic() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay_ms: 10,
            max_delay_ms: 100,
            jitter: 0.0,
        };
        let random = SeededRandom::new(1);
        assert_eq!(
            policy.calculate_delay(1, &random),
            Duration::from_millis(10)
        );
        assert_eq!(
            policy.calculate_delay(2, &random),
            Duration::from_millis(20)
        );
        assert_eq!(
            policy.calculate_delay(3, &random),
            Duration::from_millis(40)
        );
    }

    #[test]
    fn delay_caps_at_max_delay_ms() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay_ms: 10,
            max_delay_ms: 50,
            jitter: 0.0,
        };
        let random = SeededRandom::new(1);
        assert_eq!(
            policy.calculate_delay(10, &random),
            Duration::from_millis(50)
        );
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 1000,
            jitter: 0.2,
        };
        let random = SeededRandom::new(42);
        for attempt in 1..=5 {
            let delay = policy.calculate_delay(attempt, &random).as_millis() as f64;
            let base = (100u64 * (1u64 << (attempt - 1)).min(1000)).min(1000) as f64;
            assert!(delay >= base * 0.8 - 1.0 && delay <= base * 1.2 + 1.0);
        }
    }
}
