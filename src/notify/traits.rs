//! Trait for notification channels

use crate::error::DeliveryError;
use async_trait::async_trait;

/// A channel that relays a persisted document's bytes to a recipient
///
/// Transport and authentication are entirely up to the implementation. The
/// pipeline calls [`deliver`](Self::deliver) once per document written during
/// a run and never lets a failure affect the stored file or the batch
/// result.
#[async_trait]
pub trait NotificationForwarder: Send + Sync {
    /// Deliver a document
    ///
    /// # Arguments
    ///
    /// * `display_name` - File name shown to the recipient
    /// * `bytes` - Document content
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] if the channel is unreachable or refuses the
    /// document.
    async fn deliver(&self, display_name: &str, bytes: &[u8]) -> Result<(), DeliveryError>;

    /// Human-readable name for logging and events
    fn name(&self) -> &'static str;
}
