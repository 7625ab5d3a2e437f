//! Telegram Bot API forwarder

use super::traits::NotificationForwarder;
use crate::config::TelegramConfig;
use crate::error::{DeliveryError, Error};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

/// Bot API reply envelope
#[derive(Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Uploads documents to a Telegram chat with `sendDocument`
///
/// The bot token is part of the request URL, so request errors are stripped
/// of their URL before they are reported.
pub struct TelegramForwarder {
    http_client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramForwarder {
    /// Create a forwarder for the configured bot and chat
    ///
    /// # Errors
    /// Returns [`Error::Other`] if the HTTP client cannot be created.
    pub fn new(config: TelegramConfig) -> crate::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn send_document_url(&self) -> String {
        format!(
            "{}/bot{}/sendDocument",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }
}

#[async_trait]
impl NotificationForwarder for TelegramForwarder {
    async fn deliver(&self, display_name: &str, bytes: &[u8]) -> Result<(), DeliveryError> {
        let part = Part::bytes(bytes.to_vec())
            .file_name(display_name.to_string())
            .mime_str(&self.config.content_type)
            .map_err(|e| DeliveryError::Transport(e.without_url().to_string()))?;
        let form = Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .part("document", part);

        let response = self
            .http_client
            .post(self.send_document_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let reply = response.json::<ApiReply>().await.ok();

        match reply {
            Some(ApiReply { ok: true, .. }) if status.is_success() => {
                tracing::debug!(display_name, "document sent to telegram");
                Ok(())
            }
            Some(reply) => Err(DeliveryError::Rejected {
                status: status.as_u16(),
                description: reply
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            }),
            None => Err(DeliveryError::Rejected {
                status: status.as_u16(),
                description: "unreadable reply".to_string(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
