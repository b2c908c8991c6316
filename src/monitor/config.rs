//! Poll controller configuration.

use crate::monitor::data::DEFAULT_HISTORY_CAPACITY;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and retry settings for the poll controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Interval between scheduled polls in milliseconds
    pub poll_interval_ms: u64,
    /// Wait between requesting a pH sample and reading the status
    pub settle_delay_ms: u64,
    /// Delay before an automatic retry after a failed poll
    pub retry_delay_ms: u64,
    /// Maximum consecutive automatic retries
    pub max_retries: u32,
    /// Number of pH readings kept for the trend chart
    pub history_capacity: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: crate::DEFAULT_POLL_INTERVAL_MS,
            settle_delay_ms: 1000,
            retry_delay_ms: 2000,
            max_retries: 3,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl PollerConfig {
    /// Set the interval between scheduled polls.
    pub fn with_poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.poll_interval_ms = interval_ms;
        self
    }

    /// Set the settle delay.
    pub fn with_settle_delay_ms(mut self, delay_ms: u64) -> Self {
        self.settle_delay_ms = delay_ms;
        self
    }

    /// Set the automatic retry delay.
    pub fn with_retry_delay_ms(mut self, delay_ms: u64) -> Self {
        self.retry_delay_ms = delay_ms;
        self
    }

    /// Set the retry ceiling.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the history window size.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
