//! Folds a backend status payload into the dashboard state.

use crate::backend::payload::{StatusData, NEVER_SENTINEL};
use crate::monitor::data::{DashboardState, HistoryEntry, SensorSnapshot, DEFAULT_PH};
use chrono::{DateTime, Utc};

/// Replace the sensor snapshot with `payload` and record its pH at `now`.
///
/// The snapshot is rebuilt from scratch: a field the backend stopped
/// reporting becomes unknown rather than keeping its previous value.
pub fn apply_update(state: &mut DashboardState, payload: &StatusData, now: DateTime<Utc>) {
    let snapshot = snapshot_from(payload);
    state.history.push(HistoryEntry::new(now, snapshot.ph));
    state.sensors = snapshot;
}

/// Build a sensor snapshot from a status payload.
pub fn snapshot_from(payload: &StatusData) -> SensorSnapshot {
    SensorSnapshot {
        ph: payload.current_ph.unwrap_or(DEFAULT_PH),
        fish_detected: payload.fish_detected.unwrap_or(false),
        motor_initialized: payload.motor_initialized.unwrap_or(false),
        ph_voltage: payload.current_ph_voltage,
        feed_count: payload.feed_count,
        auto_feed_count: payload.auto_feed_count,
        last_feed_time: feed_time(payload.last_feed_time.as_deref()),
        auto_last_feed_time: feed_time(payload.auto_last_feed_time.as_deref()),
        ph_sensor_initialized: payload.ph_sensor_initialized,
    }
}

fn feed_time(raw: Option<&str>) -> Option<String> {
    match raw {
        Some(NEVER_SENTINEL) | None => None,
        Some(time) => Some(time.to_string()),
    }
}
