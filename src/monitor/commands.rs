//! Operator commands: manual feed and automatic-feeding toggle.

use crate::error::Result;
use crate::monitor::poller::PollController;
use tracing::{info, warn};

/// Error shown when a manual feed fails.
pub const FEED_FAILED: &str = "Failed to control motor";

/// Error shown when the auto-mode change is rejected.
pub const AUTO_MODE_FAILED: &str = "Failed to update auto mode";

impl PollController {
    /// Dispense food now, overriding fish detection.
    ///
    /// A successful feed is followed by a poll so counters and timestamps
    /// refresh. A failed feed marks the backend disconnected.
    pub async fn feed(&self) -> Result<()> {
        self.store().update(|state| state.last_error = None);

        match self.backend().feed_fish().await {
            Ok(()) => {
                info!("Manual feed dispensed");
                self.poll().await;
                Ok(())
            }
            Err(err) => {
                warn!("Manual feed failed: {}", err);
                self.store().update(|state| {
                    state.last_error = Some(FEED_FAILED.to_string());
                    state.connection.is_connected = false;
                });
                Err(err)
            }
        }
    }

    /// Enable or disable automatic feeding.
    ///
    /// The local flag changes before the request is sent and is kept even if
    /// the backend rejects it.
    pub async fn set_auto_mode(&self, enabled: bool) -> Result<()> {
        self.store().update(|state| state.auto_mode = enabled);
        self.send_auto_mode(enabled).await
    }

    /// Flip automatic feeding and return the new setting.
    pub async fn toggle_auto_mode(&self) -> Result<bool> {
        let enabled = self.store().update(|state| {
            state.auto_mode = !state.auto_mode;
            state.auto_mode
        });
        self.send_auto_mode(enabled).await?;
        Ok(enabled)
    }

    async fn send_auto_mode(&self, enabled: bool) -> Result<()> {
        match self.backend().set_auto_mode(enabled).await {
            Ok(()) => {
                info!("Auto mode {}", if enabled { "enabled" } else { "disabled" });
                Ok(())
            }
            Err(err) => {
                warn!("Failed to set auto mode: {}", err);
                self.store()
                    .update(|state| state.last_error = Some(AUTO_MODE_FAILED.to_string()));
                Err(err)
            }
        }
    }
}
