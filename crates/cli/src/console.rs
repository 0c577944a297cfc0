//! A [`Platform`] backed by the terminal.

use async_trait::async_trait;
use parley_core::{
    ChannelId, GuildId, InboundMessage, MessageId, OutboundMessage, Platform, PlatformError, UserId,
};
use parley_spec::CapabilitySet;

use crate::render::{Format, print_owner_dm, print_send};

/// Bot identity used by the console session.
pub(crate) const BOT: UserId = UserId(1);
/// Author of every console message.
pub(crate) const AUTHOR: UserId = UserId(2);
/// The single channel console messages are posted in.
pub(crate) const CHANNEL: ChannelId = ChannelId(1);

/// Prints every send instead of delivering it.
#[derive(Debug)]
pub(crate) struct ConsolePlatform {
    granted: CapabilitySet,
    locked_channel: bool,
    format: Format,
}

impl ConsolePlatform {
    /// Platform granting exactly `granted`; with `locked_channel`, channel
    /// sends fail with missing access.
    pub(crate) fn new(granted: CapabilitySet, locked_channel: bool, format: Format) -> Self {
        Self {
            granted,
            locked_channel,
            format,
        }
    }
}

#[async_trait]
impl Platform for ConsolePlatform {
    async fn effective_permissions(
        &self,
        _channel: ChannelId,
    ) -> Result<CapabilitySet, PlatformError> {
        Ok(self.granted.clone())
    }

    async fn send(&self, channel: ChannelId, message: OutboundMessage) -> Result<(), PlatformError> {
        if self.locked_channel {
            return Err(PlatformError::MissingAccess(format!(
                "cannot send messages in channel {channel}"
            )));
        }
        print_send(self.format, channel, &message);
        Ok(())
    }

    async fn send_to_owner(
        &self,
        guild: GuildId,
        message: OutboundMessage,
    ) -> Result<(), PlatformError> {
        print_owner_dm(self.format, guild, &message);
        Ok(())
    }
}

// ── Session input ───────────────────────────────────────────────────────

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Input {
    /// A new message.
    Message(String),
    /// A new message replying to an earlier one.
    Reply { to: u64, text: String },
    /// An edit of an earlier message.
    Edit { id: u64, text: String },
    /// End the session.
    Quit,
    /// Nothing to do.
    Blank,
}

impl Input {
    /// Parse a console line. `:edit`, `:reply` and `:quit` are directives;
    /// anything else is message text.
    pub(crate) fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Ok(Input::Blank);
        }
        if line.trim() == ":quit" {
            return Ok(Input::Quit);
        }
        if let Some(rest) = line.strip_prefix(":edit ") {
            let (id, text) = split_target(rest).ok_or("usage: :edit <id> <text>")?;
            return Ok(Input::Edit { id, text });
        }
        if let Some(rest) = line.strip_prefix(":reply ") {
            let (to, text) = split_target(rest).ok_or("usage: :reply <id> <text>")?;
            return Ok(Input::Reply { to, text });
        }
        Ok(Input::Message(line.to_string()))
    }
}

fn split_target(rest: &str) -> Option<(u64, String)> {
    let (id, text) = rest.trim_start().split_once(char::is_whitespace)?;
    let id = id.parse().ok()?;
    Some((id, text.trim_start().to_string()))
}

/// Assigns message ids and fills in the fixed guild, channel and author.
#[derive(Debug)]
pub(crate) struct Session {
    guild: GuildId,
    next_id: u64,
}

impl Session {
    pub(crate) fn new(guild: GuildId) -> Self {
        Self { guild, next_id: 1 }
    }

    /// A new message with a fresh id.
    pub(crate) fn post(&mut self, text: String, reply_to: Option<u64>) -> InboundMessage {
        let id = self.next_id;
        self.next_id += 1;
        self.message(id, text, reply_to)
    }

    /// New content for an existing message id.
    pub(crate) fn edit(&self, id: u64, text: String) -> InboundMessage {
        self.message(id, text, None)
    }

    fn message(&self, id: u64, content: String, reply_to: Option<u64>) -> InboundMessage {
        InboundMessage {
            id: MessageId(id),
            guild_id: self.guild,
            channel_id: CHANNEL,
            author_id: AUTHOR,
            content,
            reply_to: reply_to.map(MessageId),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_directives() {
        assert_eq!(Input::parse("!ping"), Ok(Input::Message("!ping".into())));
        assert_eq!(Input::parse("   "), Ok(Input::Blank));
        assert_eq!(Input::parse(":quit"), Ok(Input::Quit));
        assert_eq!(
            Input::parse(":edit 3 !echo  hi"),
            Ok(Input::Edit {
                id: 3,
                text: "!echo  hi".into()
            })
        );
        assert_eq!(
            Input::parse(":reply 1 !purge"),
            Ok(Input::Reply {
                to: 1,
                text: "!purge".into()
            })
        );
        assert!(Input::parse(":edit x !ping").is_err());
        assert!(Input::parse(":edit 3").is_err());
    }

    #[test]
    fn session_assigns_increasing_ids() {
        let mut session = Session::new(GuildId(5));
        let first = session.post("a".into(), None);
        let second = session.post("b".into(), Some(1));
        assert_eq!(first.id, MessageId(1));
        assert_eq!(second.id, MessageId(2));
        assert_eq!(second.reply_to, Some(MessageId(1)));
        assert_eq!(session.edit(1, "c".into()).id, MessageId(1));
        assert_eq!(first.guild_id, GuildId(5));
    }
}
