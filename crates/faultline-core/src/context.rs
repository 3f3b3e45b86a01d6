//! Invocation context model and metadata extraction.
//!
//! A failure may be raised while handling a prefix command (a message) or an
//! interaction (slash command, button, ...). Both carry the same kinds of
//! references, exposed through the accessors on [`InvocationContext`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Command name recorded when no invocation context is available.
pub const NO_COMMAND: &str = "no command";

/// Rendered in place of an unavailable context field.
const UNAVAILABLE: &str = "none";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: u64,
    pub name: String,
}

impl UserRef {
    /// `<@id> (id)`
    pub fn mention(&self) -> String {
        format!("<@{0}> ({0})", self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRef {
    pub id: u64,
    pub name: String,
}

impl GuildRef {
    /// `name (id)`
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: u64,
}

impl ChannelRef {
    /// `<#id> (id)`
    pub fn mention(&self) -> String {
        format!("<#{0}> ({0})", self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRef {
    /// Full name including parent groups, e.g. `config prefix set`.
    pub qualified_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub id: u64,
    pub created_at: DateTime<Utc>,
}

/// A command invoked from a chat message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInvocation {
    pub message: MessageRef,
    pub author: UserRef,
    pub command: Option<CommandRef>,
    pub guild: Option<GuildRef>,
    pub channel: Option<ChannelRef>,
}

/// An interaction such as an application command or a component click.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub user: UserRef,
    pub command: Option<CommandRef>,
    pub guild: Option<GuildRef>,
    pub channel: Option<ChannelRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvocationContext {
    Command(CommandInvocation),
    Interaction(Interaction),
}

impl InvocationContext {
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Command(c) => c.message.created_at,
            Self::Interaction(i) => i.created_at,
        }
    }

    pub fn author(&self) -> &UserRef {
        match self {
            Self::Command(c) => &c.author,
            Self::Interaction(i) => &i.user,
        }
    }

    pub fn command(&self) -> Option<&CommandRef> {
        match self {
            Self::Command(c) => c.command.as_ref(),
            Self::Interaction(i) => i.command.as_ref(),
        }
    }

    pub fn guild(&self) -> Option<&GuildRef> {
        match self {
            Self::Command(c) => c.guild.as_ref(),
            Self::Interaction(i) => i.guild.as_ref(),
        }
    }

    pub fn channel(&self) -> Option<&ChannelRef> {
        match self {
            Self::Command(c) => c.channel.as_ref(),
            Self::Interaction(i) => i.channel.as_ref(),
        }
    }
}

/// Who/where details, present only when a context was supplied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDetails {
    pub author: String,
    pub guild: String,
    pub channel: String,
}

/// Who, where, when and which command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub time: DateTime<Utc>,
    pub command: String,
    pub event_name: Option<String>,
    pub details: Option<ContextDetails>,
}

impl Metadata {
    /// Title-cased `(key, value)` pairs for every present field, in display order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("Time", self.time.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("Command", self.command.clone()),
        ];
        if let Some(event) = &self.event_name {
            fields.push(("Event Name", event.clone()));
        }
        if let Some(details) = &self.details {
            fields.push(("Author", details.author.clone()));
            fields.push(("Guild", details.guild.clone()));
            fields.push(("Channel", details.channel.clone()));
        }
        fields
    }
}

/// Build metadata for a failure. Missing pieces degrade to `none` instead of
/// failing.
pub fn extract(context: Option<&InvocationContext>, event_name: Option<&str>) -> Metadata {
    let event_name = event_name
        .filter(|name| !name.is_empty())
        .map(String::from);

    let Some(ctx) = context else {
        return Metadata {
            time: Utc::now(),
            command: NO_COMMAND.to_string(),
            event_name,
            details: None,
        };
    };

    let or_unavailable = |value: Option<String>| value.unwrap_or_else(|| UNAVAILABLE.to_string());

    Metadata {
        time: ctx.created_at(),
        command: or_unavailable(ctx.command().map(|c| c.qualified_name.clone())),
        event_name,
        details: Some(ContextDetails {
            author: ctx.author().mention(),
            guild: or_unavailable(ctx.guild().map(GuildRef::label)),
            channel: or_unavailable(ctx.channel().map(ChannelRef::mention)),
        }),
    }
}
