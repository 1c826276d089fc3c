//! Backoff calculator — pure mapping from attempt count to retry delay.
//!
//! `delay = min(base_delay_ms * backoff_multiplier^(attempts - 1), max_delay_ms)`
//!
//! Non-decreasing in `attempts` until the cap is reached, then constant.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use herald_common::config::AppConfig;

/// Tuning for the retry state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum delivery attempts per record.
    pub max_attempts: i32,
    /// Delay after the first failed attempt, in milliseconds.
    pub base_delay_ms: u64,
    /// Multiplier applied per further attempt.
    pub backoff_multiplier: f64,
    /// Backoff cap, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 5_000,
            backoff_multiplier: 2.0,
            max_delay_ms: 300_000,
        }
    }
}

impl From<&AppConfig> for RetryConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts,
            base_delay_ms: config.retry_base_delay_ms,
            backoff_multiplier: config.retry_backoff_multiplier,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }
}

/// Delay to wait before the next attempt, given how many attempts have
/// already been made.
///
/// `attempts` is 1-indexed: pass 1 after the first failure. Values below 1
/// are clamped to 1.
pub fn next_delay(attempts: i32, config: &RetryConfig) -> Duration {
    let exponent = attempts.max(1) - 1;
    let delay_ms = config.base_delay_ms as f64 * config.backoff_multiplier.powi(exponent);
    // powi overflows to +inf for large exponents; min() caps it either way.
    let capped_ms = delay_ms.min(config.max_delay_ms as f64);
    Duration::milliseconds(capped_ms as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let config = RetryConfig::default();
        assert_eq!(next_delay(1, &config).num_milliseconds(), 5_000);
        assert_eq!(next_delay(2, &config).num_milliseconds(), 10_000);
        assert_eq!(next_delay(3, &config).num_milliseconds(), 20_000);
    }

    #[test]
    fn test_saturates_at_cap() {
        let config = RetryConfig::default();
        // 5000 * 2^6 = 320000 > 300000 → capped
        assert_eq!(next_delay(7, &config).num_milliseconds(), 300_000);
        assert_eq!(next_delay(100, &config).num_milliseconds(), 300_000);
        assert_eq!(next_delay(10_000, &config).num_milliseconds(), 300_000);
    }

    #[test]
    fn test_monotonically_non_decreasing() {
        let config = RetryConfig::default();
        let mut previous = Duration::zero();
        for attempts in 1..=64 {
            let delay = next_delay(attempts, &config);
            assert!(delay >= previous, "delay decreased at attempt {}", attempts);
            previous = delay;
        }
    }

    #[test]
    fn test_attempts_below_one_clamped() {
        let config = RetryConfig::default();
        assert_eq!(next_delay(0, &config), next_delay(1, &config));
        assert_eq!(next_delay(-5, &config), next_delay(1, &config));
    }

    #[test]
    fn test_custom_multiplier() {
        let config = RetryConfig {
            max_attempts: 5,
            base_delay_ms: 1_000,
            backoff_multiplier: 3.0,
            max_delay_ms: 60_000,
        };
        assert_eq!(next_delay(1, &config).num_milliseconds(), 1_000);
        assert_eq!(next_delay(2, &config).num_milliseconds(), 3_000);
        assert_eq!(next_delay(3, &config).num_milliseconds(), 9_000);
        assert_eq!(next_delay(4, &config).num_milliseconds(), 27_000);
        // 81000 > 60000 → capped
        assert_eq!(next_delay(5, &config).num_milliseconds(), 60_000);
    }
}
