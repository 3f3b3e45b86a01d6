use faultline_core::ConfigError;
use reqwest::Url;
use serde::{Deserialize, Serialize};

const AVATAR_CDN: &str = "https://cdn.discordapp.com/avatars";

/// What is known about the webhook before it has been fetched: the id and
/// token embedded in its URL.
#[derive(Clone, PartialEq, Eq)]
pub struct PartialWebhook {
    pub id: String,
    token: String,
}

impl PartialWebhook {
    pub fn new(id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            token: token.into(),
        }
    }

    /// Parse `.../webhooks/<id>/<token>` (an API version segment is allowed).
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let invalid = |why: &str| ConfigError::InvalidWebhookUrl(why.to_string());
        let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
        let mut segments = parsed
            .path_segments()
            .ok_or_else(|| invalid("url has no path"))?
            .skip_while(|s| *s != "webhooks");

        segments.next().ok_or_else(|| invalid("missing /webhooks/ segment"))?;
        let id = segments
            .next()
            .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
            .ok_or_else(|| invalid("missing numeric webhook id"))?;
        let token = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| invalid("missing webhook token"))?;

        Ok(Self::new(id, token))
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for PartialWebhook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartialWebhook")
            .field("id", &self.id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// The fully resolved webhook as returned by the API.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookIdentity {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar hash, not a URL.
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    /// Only incoming webhooks carry a token; without it the webhook cannot be executed.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

impl WebhookIdentity {
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar
            .as_ref()
            .map(|hash| format!("{AVATAR_CDN}/{}/{hash}.png", self.id))
    }

    pub fn can_execute(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl std::fmt::Debug for WebhookIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookIdentity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("avatar", &self.avatar)
            .field("channel_id", &self.channel_id)
            .field("guild_id", &self.guild_id)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
