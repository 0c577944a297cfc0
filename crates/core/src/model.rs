//! Platform-neutral message types exchanged with the surrounding system.

use serde::{Deserialize, Serialize};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake!(
    /// Identifier of a message.
    MessageId
);
snowflake!(
    /// Identifier of a text channel.
    ChannelId
);
snowflake!(
    /// Identifier of a guild (server).
    GuildId
);
snowflake!(
    /// Identifier of a user, including the bot itself.
    UserId
);

/// A message as received from the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Message id; also the key of the awaiting-edit mark.
    pub id: MessageId,
    /// Guild the message was posted in.
    pub guild_id: GuildId,
    /// Channel the message was posted in; replies go here.
    pub channel_id: ChannelId,
    /// Author of the message.
    pub author_id: UserId,
    /// Raw text content.
    pub content: String,
    /// The message this one replies to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,
}

/// Visual style of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text.
    Text,
    /// Informational card.
    Info,
    /// Error card.
    Error,
}

/// A message send request. All text is already localized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Presentation style.
    pub kind: MessageKind,
    /// Optional heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Body text.
    pub body: String,
}

impl OutboundMessage {
    /// Plain text message.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Text,
            title: None,
            body: body.into(),
        }
    }

    /// Informational message with a title.
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Info,
            title: Some(title.into()),
            body: body.into(),
        }
    }

    /// Error message without a title.
    pub fn error(body: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            title: None,
            body: body.into(),
        }
    }

    /// Error message with a title.
    pub fn titled_error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            title: Some(title.into()),
            body: body.into(),
        }
    }
}

impl std::fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.title {
            Some(title) => write!(f, "{title}\n\n{}", self.body),
            None => f.write_str(&self.body),
        }
    }
}

/// The two textual forms in which the bot can be mentioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionForms {
    /// Plain user mention, e.g. `<@123>`.
    pub plain: String,
    /// Nickname mention, e.g. `<@!123>`.
    pub nickname: String,
}

impl MentionForms {
    /// Mention forms for the given bot user id.
    pub fn for_user(id: UserId) -> Self {
        Self {
            plain: format!("<@{id}>"),
            nickname: format!("<@!{id}>"),
        }
    }
}
