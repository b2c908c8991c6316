//! Data structures for the dashboard state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// pH shown before the first reading arrives and when the backend omits it.
pub const DEFAULT_PH: f64 = 7.0;

/// Default number of pH readings kept for the trend chart.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Everything the display layer renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardState {
    /// Latest sensor readings
    pub sensors: SensorSnapshot,
    /// Backend connection health
    pub connection: ConnectionStatus,
    /// Rolling pH history, oldest first
    pub history: PhHistory,
    /// Human-readable description of the last failure, if any
    pub last_error: Option<String>,
    /// Whether automatic feeding is enabled, as last requested by the operator
    pub auto_mode: bool,
    /// Sequence number of the newest poll that has resolved
    #[serde(skip)]
    pub(crate) last_resolved_poll: u64,
}

/// Sensor readings from the latest successful poll.
///
/// `None` means the backend did not report the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    /// Water pH
    pub ph: f64,
    /// Whether the camera currently sees a fish
    pub fish_detected: bool,
    /// Whether the feeder motor is initialized
    pub motor_initialized: bool,
    /// Raw pH probe voltage
    pub ph_voltage: Option<f64>,
    /// Number of manual feeds
    pub feed_count: Option<u64>,
    /// Number of automatic feeds
    pub auto_feed_count: Option<u64>,
    /// Backend-local time of the last manual feed
    pub last_feed_time: Option<String>,
    /// Backend-local time of the last automatic feed
    pub auto_last_feed_time: Option<String>,
    /// Whether the pH probe is initialized
    pub ph_sensor_initialized: Option<bool>,
}

/// Health of the link to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub is_connected: bool,
    /// When the last poll resolved
    pub last_attempt: Option<DateTime<Utc>>,
    /// Consecutive failures, capped at the retry ceiling
    pub retry_count: u32,
}

/// One pH reading in the trend chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// Fixed-capacity, time-ascending pH history. The oldest entry is evicted
/// first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhHistory {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl DashboardState {
    /// Create the initial state with a history of `history_capacity` entries.
    pub fn new(history_capacity: usize) -> Self {
        Self {
            sensors: SensorSnapshot::default(),
            connection: ConnectionStatus::default(),
            history: PhHistory::with_capacity(history_capacity),
            last_error: None,
            auto_mode: true,
            last_resolved_poll: 0,
        }
    }

    /// Mark poll `sequence` as resolved.
    ///
    /// Returns `false` when a newer poll already resolved, in which case the
    /// caller must drop its result.
    pub(crate) fn resolve_poll(&mut self, sequence: u64) -> bool {
        if sequence < self.last_resolved_poll {
            return false;
        }
        self.last_resolved_poll = sequence;
        true
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self {
            ph: DEFAULT_PH,
            fish_detected: false,
            motor_initialized: false,
            ph_voltage: None,
            feed_count: None,
            auto_feed_count: None,
            last_feed_time: None,
            auto_last_feed_time: None,
            ph_sensor_initialized: None,
        }
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            is_connected: false,
            last_attempt: None,
            retry_count: 0,
        }
    }
}

impl ConnectionStatus {
    pub fn mark_connected(&mut self, now: DateTime<Utc>) {
        self.is_connected = true;
        self.retry_count = 0;
        self.last_attempt = Some(now);
    }

    pub fn mark_disconnected(&mut self, now: DateTime<Utc>) {
        self.is_connected = false;
        self.last_attempt = Some(now);
    }

    /// Count one more consecutive failure, saturating at `ceiling`.
    ///
    /// Returns whether an automatic retry may still be scheduled.
    pub fn register_failure(&mut self, ceiling: u32) -> bool {
        self.retry_count = self.retry_count.saturating_add(1).min(ceiling);
        !self.retries_exhausted(ceiling)
    }

    /// Whether the automatic retry budget is exhausted.
    pub fn retries_exhausted(&self, ceiling: u32) -> bool {
        self.retry_count >= ceiling
    }
}

impl HistoryEntry {
    pub fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }
}

impl PhHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a reading, dropping the oldest ones beyond capacity.
    pub fn push(&mut self, entry: HistoryEntry) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}

impl Default for PhHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_history_evicts_oldest_first() {
        let start = Utc::now();
        let mut history = PhHistory::with_capacity(20);

        for i in 0..25 {
            history.push(HistoryEntry::new(start + Duration::seconds(i), i as f64));
        }

        assert_eq!(history.len(), 20);
        let values: Vec<f64> = history.iter().map(|entry| entry.value).collect();
        let expected: Vec<f64> = (5..25).map(|i| i as f64).collect();
        assert_eq!(values, expected);
        assert!(history
            .iter()
            .zip(history.iter().skip(1))
            .all(|(a, b)| a.time < b.time));
        assert_eq!(history.latest().map(|entry| entry.value), Some(24.0));
    }

    #[test]
    fn test_zero_capacity_history_stays_empty() {
        let mut history = PhHistory::with_capacity(0);
        history.push(HistoryEntry::new(Utc::now(), 7.0));
        assert!(history.is_empty());
    }

    #[test]
    fn test_register_failure_saturates() {
        let mut connection = ConnectionStatus::default();
        assert!(connection.register_failure(3));
        assert!(connection.register_failure(3));
        assert!(!connection.register_failure(3));
        assert!(!connection.register_failure(3));
        assert_eq!(connection.retry_count, 3);
        assert!(connection.retries_exhausted(3));

        connection.mark_connected(Utc::now());
        assert_eq!(connection.retry_count, 0);
        assert!(connection.is_connected);
    }

    #[test]
    fn test_resolve_poll_rejects_superseded() {
        let mut state = DashboardState::default();
        assert!(state.resolve_poll(2));
        assert!(!state.resolve_poll(1));
        assert!(state.resolve_poll(2));
        assert!(state.resolve_poll(5));
    }

    #[test]
    fn test_default_state() {
        let state = DashboardState::default();
        assert_eq!(state.sensors.ph, DEFAULT_PH);
        assert!(!state.sensors.fish_detected);
        assert!(state.sensors.feed_count.is_none());
        assert!(!state.connection.is_connected);
        assert!(state.connection.last_attempt.is_none());
        assert!(state.auto_mode);
        assert_eq!(state.history.capacity(), DEFAULT_HISTORY_CAPACITY);
    }
}
