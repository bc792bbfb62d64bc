//! # Reconnect Backoff
//!
//! Delay schedule for re-establishing the real-time channel after it drops.
//! Reconnection is retried indefinitely; only the spacing between attempts
//! grows.
//!
//! ## Features
//!
//! - **Exponential Backoff**: Double the delay after every failed attempt
//! - **Cap**: Never wait longer than the configured maximum
//! - **Jitter**: Add randomness so many clients do not reconnect in lockstep
//!
//! ## Usage
//!
//! ```rust
//! use pollroom::client::retry::{BackoffStrategy, ReconnectBackoff};
//!
//! let mut backoff = ReconnectBackoff::new(BackoffStrategy::default());
//! let first = backoff.next_delay();
//! let second = backoff.next_delay();
//! assert!(second >= first);
//! backoff.reset();
//! ```

use rand::Rng;
use std::time::Duration;

/// Backoff strategy configuration
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed interval between attempts
    Fixed {
        /// Interval between attempts
        interval: Duration,
    },
    /// Exponential backoff with jitter
    Exponential {
        /// Delay before the first retry
        base: Duration,
        /// Upper bound on the delay, before jitter
        max: Duration,
        /// Jitter factor (0.0 to 1.0), as a fraction of the delay
        jitter: f64,
    },
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(500),
            max: Duration::from_secs(30),
            jitter: 0.2,
        }
    }
}

impl BackoffStrategy {
    /// Delay before attempt number `attempt` (1-based), without jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { interval } => *interval,
            Self::Exponential { base, max, .. } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1).min(16));
                base.saturating_mul(factor).min(*max)
            }
        }
    }

    fn jitter(&self) -> f64 {
        match self {
            Self::Fixed { .. } => 0.0,
            Self::Exponential { jitter, .. } => jitter.clamp(0.0, 1.0),
        }
    }
}

/// Attempt counter plus strategy
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    strategy: BackoffStrategy,
    attempt: u32,
}

impl ReconnectBackoff {
    pub fn new(strategy: BackoffStrategy) -> Self {
        Self { strategy, attempt: 0 }
    }

    /// Number of failed attempts since the last reset
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Delay to wait before the next attempt, advancing the counter
    pub fn next_delay(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        let delay = self.strategy.base_delay(self.attempt);

        let jitter = self.strategy.jitter();
        if jitter == 0.0 || delay.is_zero() {
            return delay;
        }
        let extra = delay.mul_f64(jitter * rand::thread_rng().gen_range(0.0..1.0));
        delay + extra
    }

    /// Start over after a successful connection
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new(BackoffStrategy::default())
    }
}
