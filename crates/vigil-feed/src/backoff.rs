//! Retry backoff for the poll cycle and the live socket.
//!
//! Both channels retry forever; what backs off is the delay between
//! attempts. Delays grow exponentially from a base interval, are
//! capped, and carry jitter so a fleet of consoles does not hammer a
//! recovering backend in lockstep.

use std::time::Duration;

use rand::Rng;

/// Capped exponential backoff policy.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay used after the first failure (and between healthy cycles)
    pub base: Duration,
    /// Cap on the delay regardless of failure count
    pub max: Duration,
    /// Growth factor per consecutive failure
    pub multiplier: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(15),
            max: Duration::from_secs(300),
            multiplier: 2.0,
        }
    }
}

impl BackoffPolicy {
    /// Policy for the poll cycle, derived from the configured interval.
    pub fn for_poll(interval: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            base: interval,
            max,
            multiplier,
        }
    }

    /// Policy for socket reconnects.
    pub fn for_socket(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            multiplier: 2.0,
        }
    }

    /// Delay before the next attempt after `consecutive_failures`
    /// failures, with +-25% jitter. Zero failures means the plain base
    /// interval, unjittered: the healthy cycle stays predictable.
    pub fn delay_after(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return self.base;
        }

        let exponent = consecutive_failures.saturating_sub(1).min(16);
        let raw = self.base.as_secs_f64() * self.multiplier.powi(exponent as i32);
        let capped = raw.min(self.max.as_secs_f64());

        let jitter_range = capped * 0.25;
        let mut rng = rand::rng();
        let jitter = rng.random_range(-jitter_range..=jitter_range);
        let delayed = (capped + jitter).max(self.base.as_secs_f64().min(capped));

        Duration::from_secs_f64(delayed.min(self.max.as_secs_f64()))
    }

    /// Like [`delay_after`](Self::delay_after) but in whole seconds,
    /// never less than 1. The poller counts down in seconds.
    pub fn delay_secs_after(&self, consecutive_failures: u32) -> u64 {
        self.delay_after(consecutive_failures).as_secs().max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_cycle_uses_plain_base() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_after(0), Duration::from_secs(15));
    }

    #[test]
    fn test_first_failure_stays_near_base() {
        let policy = BackoffPolicy::default();
        let d = policy.delay_after(1);
        assert!(d >= Duration::from_secs(11));
        assert!(d <= Duration::from_secs(19));
    }

    #[test]
    fn test_delays_grow_with_failures() {
        let policy = BackoffPolicy {
            base: Duration::from_secs(10),
            max: Duration::from_secs(600),
            multiplier: 2.0,
        };
        // Compare midpoints, jitter is +-25%
        let d2 = policy.delay_after(2).as_secs_f64();
        let d4 = policy.delay_after(4).as_secs_f64();
        assert!(d4 > d2);
    }

    #[test]
    fn test_delay_never_exceeds_cap() {
        let policy = BackoffPolicy {
            base: Duration::from_secs(15),
            max: Duration::from_secs(60),
            multiplier: 2.0,
        };
        // Jitter included, the cap is a hard ceiling
        for failures in [5, 10, 100] {
            let d = policy.delay_after(failures);
            assert!(d <= Duration::from_secs(60), "cap exceeded: {d:?}");
        }
    }

    #[test]
    fn test_seconds_never_zero() {
        let policy = BackoffPolicy {
            base: Duration::from_millis(100),
            max: Duration::from_secs(1),
            multiplier: 2.0,
        };
        assert!(policy.delay_secs_after(1) >= 1);
    }
}
