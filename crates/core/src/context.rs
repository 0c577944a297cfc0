//! Per-invocation context handed to handlers.

use parley_i18n::{Renderer, keys};
use parley_spec::CommandSpec;
use std::sync::Arc;

use crate::model::{InboundMessage, OutboundMessage};
use crate::platform::{Platform, PlatformError};
use crate::registry::{CommandEntry, CommandTable};

/// Everything a handler, precondition or help function sees about one invocation.
#[derive(Clone)]
pub struct CommandContext {
    message: Arc<InboundMessage>,
    key: String,
    prefix: String,
    locale: String,
    platform: Arc<dyn Platform>,
    renderer: Arc<dyn Renderer>,
    table: Arc<CommandTable>,
}

impl CommandContext {
    pub(crate) fn new(
        message: Arc<InboundMessage>,
        key: String,
        prefix: String,
        locale: String,
        platform: Arc<dyn Platform>,
        renderer: Arc<dyn Renderer>,
        table: Arc<CommandTable>,
    ) -> Self {
        Self {
            message,
            key,
            prefix,
            locale,
            platform,
            renderer,
            table,
        }
    }

    /// The triggering message.
    pub fn message(&self) -> &InboundMessage {
        &self.message
    }

    /// The key the command was invoked with (may be an alias).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The guild's display prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The guild's locale.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// The platform client.
    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    /// The registered commands.
    pub fn table(&self) -> &Arc<CommandTable> {
        &self.table
    }

    /// Render a template in the guild's locale.
    pub fn render(&self, key: &str, args: &[&str]) -> String {
        self.renderer.render(&self.locale, key, args)
    }

    /// One-line usage of `spec` with its localized description.
    pub fn usage_line(&self, spec: &CommandSpec) -> String {
        let description = if spec.description().is_empty() {
            String::new()
        } else {
            self.render(spec.description(), &[])
        };
        if spec.param_text().is_empty() {
            self.render(
                keys::HELP_USAGE_EMPTY,
                &[self.prefix.as_str(), spec.key(), description.as_str()],
            )
        } else {
            let pattern = self.render(spec.param_text(), &[]);
            self.render(
                keys::HELP_USAGE,
                &[self.prefix.as_str(), spec.key(), pattern.as_str(), description.as_str()],
            )
        }
    }

    /// Send `message` to the invocation channel.
    pub async fn reply(&self, message: OutboundMessage) -> Result<(), PlatformError> {
        self.platform.send(self.message.channel_id, message).await
    }

    /// Commands whose precondition passes here, in registration order.
    pub async fn applicable_commands(&self) -> Vec<Arc<CommandEntry>> {
        let mut applicable = Vec::new();
        for entry in self.table.iter() {
            if entry.is_applicable(self).await {
                applicable.push(Arc::clone(entry));
            }
        }
        applicable
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("message", &self.message)
            .field("key", &self.key)
            .field("prefix", &self.prefix)
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}
