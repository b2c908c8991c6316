//! Wire types for the aquarium controller's HTTP API.

use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};

/// Sentinel the backend uses for feed timestamps that never happened.
pub const NEVER_SENTINEL: &str = "Never";

/// Commands accepted by the backend's POST endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Ask the backend to sample the pH probe.
    ReadPh,
    /// Dispense food. `override` feeds even when no fish is detected.
    FeedFish {
        #[serde(rename = "override")]
        override_detection: bool,
    },
    /// Enable or disable automatic feeding.
    SetAutoMode { enabled: bool },
}

/// Envelope returned by `GET /api`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub success: bool,
    pub data: Option<StatusData>,
}

/// Sensor and feeder fields reported by the backend.
///
/// Every field is optional: older firmware omits the pH sensor and
/// auto-feed fields entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusData {
    pub current_ph: Option<f64>,
    pub fish_detected: Option<bool>,
    pub motor_initialized: Option<bool>,
    pub current_ph_voltage: Option<f64>,
    pub feed_count: Option<u64>,
    pub auto_feed_count: Option<u64>,
    pub last_feed_time: Option<String>,
    pub auto_last_feed_time: Option<String>,
    pub ph_sensor_initialized: Option<bool>,
}

/// Envelope returned by the command endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
}

impl StatusResponse {
    /// Unwrap the payload, treating `success: false` and a missing `data`
    /// object as failures.
    pub fn into_data(self) -> Result<StatusData> {
        if !self.success {
            return Err(DashboardError::backend_failure("Backend reported failure"));
        }
        self.data.ok_or(DashboardError::MissingData)
    }
}

impl CommandResponse {
    /// Convert into a `Result`, using the backend's message when it gave one.
    pub fn into_result(self, fallback: &str) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(DashboardError::backend_failure(
                self.message.unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }
}
