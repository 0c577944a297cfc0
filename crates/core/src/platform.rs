//! Seams to the chat platform and the guild configuration store.

use async_trait::async_trait;
use parley_config::{GuildSettings, Settings};
use parley_spec::CapabilitySet;

use crate::model::{ChannelId, GuildId, OutboundMessage};

/// Failures reported by the platform client.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The bot lacks access to the target (channel hidden, send denied, …).
    #[error("missing access: {0}")]
    MissingAccess(String),

    /// The target no longer exists.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other transport or API failure.
    #[error("platform error: {0}")]
    Other(String),
}

impl PlatformError {
    /// Returns `true` if the failure is a permissions problem on the bot's side.
    pub fn is_missing_access(&self) -> bool {
        matches!(self, PlatformError::MissingAccess(_))
    }
}

/// Platform client operations the dispatcher needs.
#[async_trait]
pub trait Platform: Send + Sync {
    /// The bot's effective permissions in `channel`.
    async fn effective_permissions(&self, channel: ChannelId)
    -> Result<CapabilitySet, PlatformError>;

    /// Send a message to `channel`.
    async fn send(&self, channel: ChannelId, message: OutboundMessage)
    -> Result<(), PlatformError>;

    /// Send a direct message to the owner of `guild`.
    async fn send_to_owner(&self, guild: GuildId, message: OutboundMessage)
    -> Result<(), PlatformError>;
}

/// Lookup of per-guild settings (prefixes, locale).
#[async_trait]
pub trait GuildDirectory: Send + Sync {
    /// Effective settings for `guild`; guilds without stored settings get defaults.
    async fn guild_settings(&self, guild: GuildId) -> GuildSettings;
}

#[async_trait]
impl GuildDirectory for Settings {
    async fn guild_settings(&self, guild: GuildId) -> GuildSettings {
        self.guild(guild.0).clone()
    }
}
