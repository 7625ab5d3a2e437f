//! Notification channels for persisted documents
//!
//! Every document written during a run is handed to a
//! [`NotificationForwarder`]. Delivery is best-effort: the pipeline logs a
//! failure and emits an event, but the file stays on disk and the document
//! still counts as persisted.
//!
//! Implementations:
//!
//! - [`TelegramForwarder`]: uploads the document to a chat via the Bot API
//! - [`NoOpForwarder`]: accepts everything, used when no channel is configured
//!
//! ## Usage
//!
//! ```no_run
//! use registry_dl::config::TelegramConfig;
//! use registry_dl::notify::{NotificationForwarder, TelegramForwarder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TelegramConfig::from_env().expect("TG_API_KEY and TG_CHAT_ID must be set");
//!     let forwarder = TelegramForwarder::new(config)?;
//!
//!     forwarder.deliver("d1_order.pdf", b"%PDF-1.4").await?;
//!     Ok(())
//! }
//! ```

mod noop;
mod telegram;
mod traits;

pub use noop::NoOpForwarder;
pub use telegram::TelegramForwarder;
pub use traits::NotificationForwarder;

use crate::config::NotificationConfig;
use std::sync::Arc;

/// Pick the forwarder described by the configuration
///
/// Falls back to [`NoOpForwarder`] when no channel is configured.
///
/// # Errors
/// Returns an error if the configured channel's HTTP client cannot be built.
pub fn from_config(config: &NotificationConfig) -> crate::Result<Arc<dyn NotificationForwarder>> {
    match &config.telegram {
        Some(telegram) => Ok(Arc::new(TelegramForwarder::new(telegram.clone())?)),
        None => Ok(Arc::new(NoOpForwarder)),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelegramConfig;
    use std::time::Duration;

    #[test]
    fn test_from_config_without_channel_is_noop() {
        let forwarder = from_config(&NotificationConfig::default()).unwrap();
        assert_eq!(forwarder.name(), "noop");
    }

    #[test]
    fn test_from_config_with_telegram() {
        let config = NotificationConfig {
            telegram: Some(TelegramConfig {
                api_base: "https://api.telegram.org".into(),
                bot_token: "123:abc".into(),
                chat_id: "42".into(),
                content_type: "application/pdf".into(),
                timeout: Duration::from_secs(5),
            }),
        };
        let forwarder = from_config(&config).unwrap();
        assert_eq!(forwarder.name(), "telegram");
    }
}
