//! Forwarder that accepts every document without sending it anywhere

use super::traits::NotificationForwarder;
use crate::error::DeliveryError;
use async_trait::async_trait;

/// No-op forwarder used when no notification channel is configured
pub struct NoOpForwarder;

#[async_trait]
impl NotificationForwarder for NoOpForwarder {
    async fn deliver(&self, display_name: &str, _bytes: &[u8]) -> Result<(), DeliveryError> {
        tracing::trace!(display_name, "no notification channel configured");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
