//! Shared test helpers for `parley_core` integration tests.

#![allow(unreachable_pub)]

use async_trait::async_trait;
use parley_config::Settings;
use parley_core::{
    ArgumentBinding, ChannelId, CommandContext, CommandTable, DispatchOptions, Dispatcher, GuildId,
    HandlerResult, InboundMessage, MessageId, OutboundMessage, Platform, PlatformError,
    Registration, UserId,
};
use parley_i18n::Catalog;
use parley_spec::{Capability, CapabilitySet, CommandDeclaration};
use std::future::{Ready, ready};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const BOT: UserId = UserId(1000);
pub const GUILD: GuildId = GuildId(1);
pub const CHANNEL: ChannelId = ChannelId(10);
pub const AUTHOR: UserId = UserId(77);

// ─── Recording platform ──────────────────────────────────────────────────────

/// A message the platform delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Channel(ChannelId, OutboundMessage),
    Owner(GuildId, OutboundMessage),
}

/// In-memory platform that records every delivery.
#[derive(Debug, Default)]
pub struct RecordingPlatform {
    granted: Mutex<CapabilitySet>,
    sent: Mutex<Vec<Sent>>,
    send_attempts: AtomicUsize,
    owner_attempts: AtomicUsize,
    locked_channel: AtomicBool,
    owner_unreachable: AtomicBool,
    permissions_unavailable: AtomicBool,
}

#[allow(dead_code)]
impl RecordingPlatform {
    pub fn granting(caps: &[&str]) -> Arc<Self> {
        let platform = Self::default();
        *platform.granted.lock().unwrap() = caps.iter().map(|c| Capability::new(*c)).collect();
        Arc::new(platform)
    }

    /// Channel sends fail with missing access.
    pub fn lock_channel(&self) {
        self.locked_channel.store(true, Ordering::SeqCst);
    }

    /// Owner DMs fail.
    pub fn make_owner_unreachable(&self) {
        self.owner_unreachable.store(true, Ordering::SeqCst);
    }

    /// Permission lookups fail.
    pub fn break_permission_lookup(&self) {
        self.permissions_unavailable.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Messages delivered to the test channel.
    pub fn channel_messages(&self) -> Vec<OutboundMessage> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Channel(_, m) => Some(m),
                Sent::Owner(..) => None,
            })
            .collect()
    }

    pub fn send_attempts(&self) -> usize {
        self.send_attempts.load(Ordering::SeqCst)
    }

    pub fn owner_attempts(&self) -> usize {
        self.owner_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Platform for RecordingPlatform {
    async fn effective_permissions(
        &self,
        _channel: ChannelId,
    ) -> Result<CapabilitySet, PlatformError> {
        if self.permissions_unavailable.load(Ordering::SeqCst) {
            return Err(PlatformError::Other("permission service down".into()));
        }
        Ok(self.granted.lock().unwrap().clone())
    }

    async fn send(&self, channel: ChannelId, message: OutboundMessage) -> Result<(), PlatformError> {
        self.send_attempts.fetch_add(1, Ordering::SeqCst);
        if self.locked_channel.load(Ordering::SeqCst) {
            return Err(PlatformError::MissingAccess(format!("channel {channel}")));
        }
        self.sent.lock().unwrap().push(Sent::Channel(channel, message));
        Ok(())
    }

    async fn send_to_owner(
        &self,
        guild: GuildId,
        message: OutboundMessage,
    ) -> Result<(), PlatformError> {
        self.owner_attempts.fetch_add(1, Ordering::SeqCst);
        if self.owner_unreachable.load(Ordering::SeqCst) {
            return Err(PlatformError::NotFound(format!("owner of guild {guild}")));
        }
        self.sent.lock().unwrap().push(Sent::Owner(guild, message));
        Ok(())
    }
}

// ─── Handler recording ───────────────────────────────────────────────────────

/// One handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub key: String,
    pub args: Vec<(String, String)>,
}

pub type Calls = Arc<Mutex<Vec<Call>>>;

#[allow(dead_code)]
pub fn calls() -> Calls {
    Arc::default()
}

/// A handler that records its invocation and succeeds.
pub fn record(
    calls: &Calls,
) -> impl Fn(CommandContext, ArgumentBinding) -> Ready<HandlerResult> + Send + Sync + 'static {
    let calls = Arc::clone(calls);
    move |ctx: CommandContext, args: ArgumentBinding| {
        calls.lock().unwrap().push(Call {
            key: ctx.key().to_string(),
            args: args
                .iter()
                .map(|a| (a.param.name.clone(), a.value.clone()))
                .collect(),
        });
        ready(Ok(()))
    }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// `mute` (alias `silence`, needs `moderate_members`), `unmute`, `warn`.
#[allow(dead_code)]
pub fn moderation_registrations(calls: &Calls) -> Vec<Registration> {
    vec![
        Registration::declare(
            CommandDeclaration::new("mute")
                .alias("silence")
                .params("<user> [reason...]")
                .description("command.mute.description")
                .permission("moderate_members"),
            record(calls),
        )
        .unwrap(),
        Registration::declare(
            CommandDeclaration::new("unmute").params("<user>"),
            record(calls),
        )
        .unwrap(),
        Registration::declare(
            CommandDeclaration::new("warn").params("<user> <reason...>"),
            record(calls),
        )
        .unwrap(),
    ]
}

#[allow(dead_code)]
pub fn moderation_table(calls: &Calls) -> CommandTable {
    CommandTable::new(moderation_registrations(calls)).unwrap()
}

/// Dispatcher over `table` with default settings and the embedded catalog.
#[allow(dead_code)]
pub fn dispatcher(table: CommandTable, platform: &Arc<RecordingPlatform>) -> Dispatcher {
    dispatcher_with(table, platform, Settings::default())
}

#[allow(dead_code)]
pub fn dispatcher_with(
    table: CommandTable,
    platform: &Arc<RecordingPlatform>,
    settings: Settings,
) -> Dispatcher {
    let options = DispatchOptions::from_settings(BOT, &settings);
    Dispatcher::new(
        Arc::new(table),
        Arc::clone(platform) as Arc<dyn Platform>,
        Arc::new(settings),
        Arc::new(Catalog::embedded()),
        options,
    )
}

/// A message in the test guild and channel.
#[allow(dead_code)]
pub fn message(id: u64, content: &str) -> InboundMessage {
    InboundMessage {
        id: MessageId(id),
        guild_id: GUILD,
        channel_id: CHANNEL,
        author_id: AUTHOR,
        content: content.to_string(),
        reply_to: None,
    }
}

#[allow(dead_code)]
pub fn reply(id: u64, to: u64, content: &str) -> InboundMessage {
    InboundMessage {
        reply_to: Some(MessageId(to)),
        ..message(id, content)
    }
}
