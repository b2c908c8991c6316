//! Trait for talking to the aquarium controller.

use crate::backend::payload::StatusData;
use crate::error::Result;
use async_trait::async_trait;

/// Operations the dashboard needs from the aquarium controller.
///
/// `HttpBackend` is the production implementation. The poll controller only
/// depends on this trait so that timing behaviour can be exercised against an
/// in-memory backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Ask the controller to take a fresh pH sample.
    async fn request_ph_reading(&self) -> Result<()>;

    /// Fetch the full status snapshot.
    ///
    /// Implementations must fail on `success: false` and on a missing `data`
    /// object, not only on transport errors.
    async fn fetch_status(&self) -> Result<StatusData>;

    /// Trigger a manual feed, overriding fish detection.
    async fn feed_fish(&self) -> Result<()>;

    /// Enable or disable automatic feeding.
    async fn set_auto_mode(&self, enabled: bool) -> Result<()>;
}
