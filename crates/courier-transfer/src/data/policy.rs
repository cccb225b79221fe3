use std::time::Duration;

use crate::core::retry_delay;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(200);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(2);

/// How often, and how patiently, a download is retried.
///
/// The first retry waits `initial_delay`; every later one waits twice as long
/// as the previous, never more than `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts:  u32,
    initial_delay: Duration,
    max_delay:     Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts:  DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay:     DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self { Self::default() }

    /// Total attempts including the first; clamped to at least one.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self { Self::default().max_attempts(1) }

    pub fn get_max_attempts(&self) -> u32 { self.max_attempts }

    pub fn get_initial_delay(&self) -> Duration { self.initial_delay }

    pub fn get_max_delay(&self) -> Duration { self.max_delay }

    /// Wait before retry number `retry` (0 is the first retry).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        retry_delay(retry, self.initial_delay).min(self.max_delay)
    }

    /// Every wait a fully exhausted run would go through, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts - 1).map(|retry| self.delay_for_retry(retry))
    }
}
