//! Configuration types for registry-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Environment variable holding the Telegram bot token
pub const TELEGRAM_TOKEN_ENV: &str = "TG_API_KEY";
/// Environment variable holding the Telegram chat id
pub const TELEGRAM_CHAT_ENV: &str = "TG_CHAT_ID";

/// Upstream registry connection settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Data endpoint every query is POSTed to
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User agent sent with each query
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Download behavior configuration (output directory, concurrency, overwrite)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Output directory (default: "./out")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum documents fetched and written at the same time (default: 8)
    ///
    /// Zero is treated as one.
    #[serde(default = "default_max_concurrent_documents")]
    pub max_concurrent_documents: usize,

    /// Replace documents that already exist in the output directory
    #[serde(default)]
    pub force_overwrite: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_concurrent_documents: default_max_concurrent_documents(),
            force_overwrite: false,
        }
    }
}

/// Telegram Bot API settings for relaying documents to a chat
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API base URL (default: "https://api.telegram.org")
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,

    /// Bot token
    pub bot_token: String,

    /// Target chat id
    pub chat_id: String,

    /// Content type attached to every uploaded document
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Upload timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl TelegramConfig {
    /// Build a config from `TG_API_KEY` and `TG_CHAT_ID`
    ///
    /// Returns `None` when either variable is unset or empty, which callers
    /// treat as "notifications disabled".
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var(TELEGRAM_TOKEN_ENV)
            .ok()
            .filter(|v| !v.is_empty())?;
        let chat_id = std::env::var(TELEGRAM_CHAT_ENV)
            .ok()
            .filter(|v| !v.is_empty())?;

        Some(Self {
            api_base: default_telegram_api_base(),
            bot_token,
            chat_id,
            content_type: default_content_type(),
            timeout: default_request_timeout(),
        })
    }
}

/// Notification configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Telegram relay (None = notifications disabled)
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
}

/// Main configuration for the retrieval pipeline
///
/// Fields are organized into logical sub-configs:
/// - [`registry`](RegistryConfig) - upstream endpoint and HTTP settings
/// - [`download`](DownloadConfig) - output directory, concurrency, overwrite
/// - [`notifications`](NotificationConfig) - notification channel
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream registry settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Notification settings
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl Config {
    /// Check settings that would otherwise fail on first use
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key when the registry
    /// endpoint or the Telegram API base is not an http(s) URL, or when
    /// Telegram is configured with an empty token or chat id.
    pub fn validate(&self) -> Result<()> {
        validate_http_url(&self.registry.endpoint, "registry.endpoint")?;

        if let Some(telegram) = &self.notifications.telegram {
            validate_http_url(&telegram.api_base, "notifications.telegram.api_base")?;
            if telegram.bot_token.trim().is_empty() {
                return Err(Error::Config {
                    message: "telegram bot token is empty".to_string(),
                    key: Some("notifications.telegram.bot_token".to_string()),
                });
            }
            if telegram.chat_id.trim().is_empty() {
                return Err(Error::Config {
                    message: "telegram chat id is empty".to_string(),
                    key: Some("notifications.telegram.chat_id".to_string()),
                });
            }
        }

        Ok(())
    }
}

fn validate_http_url(value: &str, key: &str) -> Result<()> {
    let parsed = url::Url::parse(value).map_err(|e| Error::Config {
        message: format!("invalid URL '{}': {}", value, e),
        key: Some(key.to_string()),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::Config {
            message: format!(
                "URL scheme '{}' is not allowed; only http and https are supported",
                scheme
            ),
            key: Some(key.to_string()),
        }),
    }
}

fn default_endpoint() -> String {
    "https://asvpweb.minjust.gov.ua/sptDataEndpoint".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/74.0.3729.169 Safari/537.36"
        .to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./out")
}

fn default_max_concurrent_documents() -> usize {
    8
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_content_type() -> String {
    "application/pdf".to_string()
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
