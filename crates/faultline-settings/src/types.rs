//! Settings type definitions.
//!
//! Field names are camelCase in JSON. Every section is `#[serde(default)]`, so
//! a partial file only needs the keys it changes.

use std::collections::BTreeMap;

use faultline_core::{ChunkEncoder, ConfigError, Marker, DEFAULT_WRAP_LEN};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Largest number of embeds a single webhook message may carry.
pub const MAX_BATCH_SIZE: usize = 10;

/// Root settings type.
///
/// ```json
/// {
///   "webhook": { "url": "https://discord.com/api/webhooks/1/abc" },
///   "report": { "fenceLang": "py" }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FaultlineSettings {
    pub webhook: WebhookSettings,
    pub report: ReportSettings,
    pub logging: LoggingSettings,
}

impl FaultlineSettings {
    /// Startup checks. Everything here would otherwise surface as a
    /// failure on the first report.
    pub fn validate(&self) -> Result<()> {
        let url = self.webhook.url.trim();
        if url.is_empty() {
            return Err(SettingsError::InvalidValue("webhook.url is not set".into()));
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(SettingsError::InvalidValue(format!(
                "webhook.url must be an http(s) url, got {url:?}"
            )));
        }
        if !(1..=MAX_BATCH_SIZE).contains(&self.report.batch_size) {
            return Err(SettingsError::InvalidValue(
                ConfigError::InvalidBatchSize(self.report.batch_size).to_string(),
            ));
        }
        self.report
            .encoder()
            .map_err(|e| SettingsError::InvalidValue(e.to_string()))?;
        Ok(())
    }
}

/// Destination webhook and HTTP client behaviour.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookSettings {
    /// Full webhook URL including its token. Treated as a secret.
    pub url: String,
    /// Optional bot token sent as `Authorization: Bot <token>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            bot_token: None,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            user_agent: format!("faultline/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl std::fmt::Debug for WebhookSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSettings")
            .field("url", &"[REDACTED]")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "[REDACTED]"))
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Report layout and aggregation limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportSettings {
    /// Maximum characters per embed description, fence included.
    pub wrap_len: usize,
    /// Language tag on the code fence around diagnostics.
    pub fence_lang: String,
    /// Overflow embeds per webhook message (1..=10).
    pub batch_size: usize,
    /// Occurrences kept per signature; `None` keeps all of them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_limit: Option<usize>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            wrap_len: DEFAULT_WRAP_LEN,
            fence_lang: "rust".to_string(),
            batch_size: MAX_BATCH_SIZE,
            history_limit: None,
        }
    }
}

impl ReportSettings {
    pub fn marker(&self) -> Marker {
        Marker::code_fence(&self.fence_lang)
    }

    pub fn encoder(&self) -> std::result::Result<ChunkEncoder, ConfigError> {
        ChunkEncoder::new(self.wrap_len, self.marker())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Base level: trace, debug, info, warn or error.
    pub level: String,
    pub json: bool,
    /// Per-module overrides, e.g. `{"faultline_webhook": "debug"}`.
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
            modules: BTreeMap::new(),
        }
    }
}
