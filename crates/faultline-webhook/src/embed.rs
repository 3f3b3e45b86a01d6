//! Webhook message wire model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Limit on a single embed field value, in characters.
pub const FIELD_VALUE_LIMIT: usize = 1024;

/// How the reporting process presents itself in messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostIdentity {
    /// Full account tag, e.g. `fifi#0420`. Used as the embed author name.
    pub tag: String,
    /// Display name used as the message username.
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl HostIdentity {
    pub fn author(&self) -> EmbedAuthor {
        EmbedAuthor {
            name: self.tag.clone(),
            icon_url: self.avatar_url.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub embeds: Vec<Embed>,
}

impl WebhookMessage {
    pub fn new(embeds: Vec<Embed>, host: Option<&HostIdentity>) -> Self {
        Self {
            username: host.map(|h| h.display_name.clone()),
            avatar_url: host.and_then(|h| h.avatar_url.clone()),
            embeds,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

impl EmbedField {
    /// Block field; the value is cut to [`FIELD_VALUE_LIMIT`] characters.
    pub fn new(name: impl Into<String>, value: &str) -> Self {
        Self {
            name: name.into(),
            value: truncate_chars(value, FIELD_VALUE_LIMIT),
            inline: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// Cut `text` to at most `limit` characters, ending in `...` when shortened.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(&"..."[..limit.min(3)]);
    out
}
