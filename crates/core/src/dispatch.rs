//! The dispatcher: one inbound message in, at most one handler run out.
//!
//! Pipeline per message:
//!
//! 1. parse the prefix or mention and split off the command key;
//! 2. resolve the key, or answer with a "did you mean" suggestion;
//! 3. short-circuit `<key> help` / `<key> ?` into the help path;
//! 4. bind the arguments, answering with usage on failure;
//! 5. check the bot's permissions in the channel;
//! 6. evaluate the command's precondition and run the handler.
//!
//! Unknown commands and argument errors mark the message in the
//! [`AwaitingEditSet`], so that editing it replays the pipeline once through
//! [`Dispatcher::handle_edit`].

use parley_config::{DEFAULT_EDIT_RETRY_TTL_SECS, DEFAULT_MAX_SUGGESTION_DISTANCE, Settings};
use parley_i18n::{Renderer, keys};
use parley_spec::{Capability, CommandSpec};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::awaiting::AwaitingEditSet;
use crate::context::CommandContext;
use crate::invocation::Invocation;
use crate::model::{ChannelId, InboundMessage, MentionForms, OutboundMessage, UserId};
use crate::platform::{GuildDirectory, Platform, PlatformError};
use crate::registry::{CommandEntry, CommandTable, HandlerError};
use crate::suggest::closest;
use crate::tokenizer::{ArgumentError, bind_arguments, is_help_request};

// ─── Outcome & errors ───────────────────────────────────────────────────────

/// What happened to one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// No prefix or mention matched; the message was ignored.
    NotCommand,
    /// The handler ran and succeeded.
    Completed {
        /// Key the command was invoked with.
        key: String,
    },
    /// No command has this key.
    UnknownCommand {
        /// The key as typed (lowercased).
        key: String,
        /// The closest registered key, if close enough.
        suggestion: Option<String>,
    },
    /// A required argument was missing.
    TooFewArguments {
        /// Key the command was invoked with.
        key: String,
    },
    /// More arguments were given than the command takes.
    TooManyArguments {
        /// Key the command was invoked with.
        key: String,
    },
    /// The bot lacks capabilities the command requires.
    PermissionDenied {
        /// Key the command was invoked with.
        key: String,
        /// The capabilities that are missing.
        missing: Vec<Capability>,
    },
    /// The help path was taken.
    HelpRequested {
        /// Key the command was invoked with.
        key: String,
        /// Whether help was shown (false when the precondition failed).
        shown: bool,
    },
    /// The command's precondition rejected the invocation.
    PreconditionFailed {
        /// Key the command was invoked with.
        key: String,
    },
}

/// Failures that escape the dispatcher.
///
/// User-facing errors are not failures: they are reported through
/// [`DispatchOutcome`]. Only a failed permission lookup and handler errors
/// are surfaced here.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The platform could not report the bot's permissions.
    #[error("permission lookup failed: {0}")]
    Platform(#[from] PlatformError),

    /// A handler or custom help function failed.
    #[error("command '{key}' failed: {source}")]
    Handler {
        /// Key the command was invoked with.
        key: String,
        /// The handler's error.
        source: HandlerError,
    },
}

// ─── Options ────────────────────────────────────────────────────────────────

/// Dispatcher tuning.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// The bot's mention forms, accepted as a prefix.
    pub mentions: MentionForms,
    /// Suggestions are offered only below this edit distance.
    pub max_suggestion_distance: usize,
    /// Whether a reply stands in for a missing first argument.
    pub reply_satisfies_first_argument: bool,
    /// Lifetime of an awaiting-edit mark; `None` keeps it until used.
    pub edit_ttl: Option<Duration>,
}

impl DispatchOptions {
    /// Defaults for the bot user `bot`.
    pub fn new(bot: UserId) -> Self {
        Self {
            mentions: MentionForms::for_user(bot),
            max_suggestion_distance: DEFAULT_MAX_SUGGESTION_DISTANCE,
            reply_satisfies_first_argument: true,
            edit_ttl: Some(Duration::from_secs(DEFAULT_EDIT_RETRY_TTL_SECS)),
        }
    }

    /// Options taken from loaded settings.
    pub fn from_settings(bot: UserId, settings: &Settings) -> Self {
        Self {
            mentions: MentionForms::for_user(bot),
            max_suggestion_distance: settings.suggestion.max_distance,
            reply_satisfies_first_argument: settings.reply_satisfies_first_argument,
            edit_ttl: settings.edit_retry.ttl(),
        }
    }
}

// ─── Dispatcher ─────────────────────────────────────────────────────────────

/// Routes inbound messages to registered commands.
///
/// Cheap to share: every method takes `&self`, and the only mutable state is
/// the concurrent [`AwaitingEditSet`].
pub struct Dispatcher {
    table: Arc<CommandTable>,
    platform: Arc<dyn Platform>,
    guilds: Arc<dyn GuildDirectory>,
    renderer: Arc<dyn Renderer>,
    options: DispatchOptions,
    awaiting: AwaitingEditSet,
}

impl Dispatcher {
    /// Assemble a dispatcher.
    pub fn new(
        table: Arc<CommandTable>,
        platform: Arc<dyn Platform>,
        guilds: Arc<dyn GuildDirectory>,
        renderer: Arc<dyn Renderer>,
        options: DispatchOptions,
    ) -> Self {
        let awaiting = AwaitingEditSet::new(options.edit_ttl);
        Self {
            table,
            platform,
            guilds,
            renderer,
            options,
            awaiting,
        }
    }

    /// The command table.
    pub fn table(&self) -> &Arc<CommandTable> {
        &self.table
    }

    /// Messages currently eligible for an edit-triggered retry.
    pub fn awaiting_edits(&self) -> &AwaitingEditSet {
        &self.awaiting
    }

    /// Handle a newly posted message.
    pub async fn handle_message(
        &self,
        message: &InboundMessage,
    ) -> Result<DispatchOutcome, DispatchError> {
        let settings = self.guilds.guild_settings(message.guild_id).await;
        let Some(invocation) =
            Invocation::parse(&message.content, &settings.prefixes, &self.options.mentions)
        else {
            return Ok(DispatchOutcome::NotCommand);
        };

        // Notices quote a configured prefix, never the mention.
        let prefix = if settings.prefixes.iter().any(|p| p == invocation.prefix) {
            invocation.prefix
        } else {
            settings.primary_prefix()
        };
        let locale = settings.locale.as_str();
        debug!(message = %message.id, key = %invocation.key, "resolving command");

        let Some(entry) = self.table.get(&invocation.key) else {
            return Ok(self
                .unknown_command(message, locale, prefix, invocation.key)
                .await);
        };

        let ctx = CommandContext::new(
            Arc::new(message.clone()),
            invocation.key.clone(),
            prefix.to_string(),
            locale.to_string(),
            Arc::clone(&self.platform),
            Arc::clone(&self.renderer),
            Arc::clone(&self.table),
        );

        if is_help_request(invocation.remainder) {
            return self.help(entry, ctx).await;
        }

        let implicit_first = self.options.reply_satisfies_first_argument && message.reply_to.is_some();
        let args = match bind_arguments(entry.spec().params(), invocation.remainder, implicit_first) {
            Ok(args) => args,
            Err(err) => return Ok(self.argument_error(&ctx, entry.spec(), err).await),
        };

        // Terminal from here on: a later edit must not replay this message.
        self.awaiting.clear(message.id);

        let granted = self.platform.effective_permissions(message.channel_id).await?;
        let missing: Vec<Capability> = entry
            .spec()
            .required_capabilities()
            .iter()
            .filter(|cap| !granted.contains(*cap))
            .cloned()
            .collect();
        if !missing.is_empty() {
            debug!(key = %invocation.key, ?missing, "missing permissions");
            self.permission_denied(&ctx, &missing).await;
            return Ok(DispatchOutcome::PermissionDenied {
                key: invocation.key,
                missing,
            });
        }

        if !entry.is_applicable(&ctx).await {
            debug!(key = %invocation.key, "precondition failed");
            return Ok(DispatchOutcome::PreconditionFailed {
                key: invocation.key,
            });
        }

        debug!(key = %invocation.key, args = args.len(), "executing command");
        entry
            .execute(ctx, args)
            .await
            .map_err(|source| DispatchError::Handler {
                key: invocation.key.clone(),
                source,
            })?;
        Ok(DispatchOutcome::Completed {
            key: invocation.key,
        })
    }

    /// Handle an edit of a previously posted message.
    ///
    /// Only a message awaiting an edit is re-dispatched, and only once;
    /// anything else returns `None`.
    pub async fn handle_edit(
        &self,
        message: &InboundMessage,
    ) -> Result<Option<DispatchOutcome>, DispatchError> {
        if !self.awaiting.take(message.id) {
            return Ok(None);
        }
        debug!(message = %message.id, "re-dispatching edited message");
        self.handle_message(message).await.map(Some)
    }

    async fn unknown_command(
        &self,
        message: &InboundMessage,
        locale: &str,
        prefix: &str,
        key: String,
    ) -> DispatchOutcome {
        let suggestion = closest(self.table.keys(), &key, self.options.max_suggestion_distance)
            .map(str::to_string);
        debug!(%key, ?suggestion, "unknown command");
        self.awaiting.mark(message.id);

        let body = match &suggestion {
            Some(s) => self.renderer.render(locale, keys::FOUND_CLOSEST, &[s.as_str()]),
            None => self.renderer.render(locale, keys::UNKNOWN_COMMAND, &[prefix]),
        };
        self.notify(message.channel_id, OutboundMessage::error(body))
            .await;

        DispatchOutcome::UnknownCommand { key, suggestion }
    }

    async fn argument_error(
        &self,
        ctx: &CommandContext,
        spec: &CommandSpec,
        err: ArgumentError,
    ) -> DispatchOutcome {
        debug!(key = %ctx.key(), %err, "argument error");
        self.awaiting.mark(ctx.message().id);

        let title = match err {
            ArgumentError::TooFewArguments => keys::FEW_ARGUMENTS_TITLE,
            ArgumentError::TooManyArguments => keys::MANY_ARGUMENTS_TITLE,
        };
        let body = if spec.param_text().is_empty() {
            ctx.render(keys::INCORRECT_ARGUMENTS_EMPTY, &[ctx.prefix(), ctx.key()])
        } else {
            let pattern = ctx.render(spec.param_text(), &[]);
            ctx.render(keys::INCORRECT_ARGUMENTS, &[ctx.prefix(), ctx.key(), pattern.as_str()])
        };
        self.notify(
            ctx.message().channel_id,
            OutboundMessage::titled_error(ctx.render(title, &[]), body),
        )
        .await;

        let key = ctx.key().to_string();
        match err {
            ArgumentError::TooFewArguments => DispatchOutcome::TooFewArguments { key },
            ArgumentError::TooManyArguments => DispatchOutcome::TooManyArguments { key },
        }
    }

    async fn help(
        &self,
        entry: &CommandEntry,
        ctx: CommandContext,
    ) -> Result<DispatchOutcome, DispatchError> {
        let key = ctx.key().to_string();
        if !entry.is_applicable(&ctx).await {
            debug!(%key, "help hidden by precondition");
            return Ok(DispatchOutcome::HelpRequested { key, shown: false });
        }

        match entry.custom_help(ctx.clone()).await {
            Some(result) => result.map_err(|source| DispatchError::Handler {
                key: key.clone(),
                source,
            })?,
            None => {
                let title = ctx.render(keys::HELP_TITLE, &[]);
                let usage = usage_text(&ctx, entry.spec());
                self.notify(ctx.message().channel_id, OutboundMessage::info(title, usage))
                    .await;
            }
        }
        Ok(DispatchOutcome::HelpRequested { key, shown: true })
    }

    async fn permission_denied(&self, ctx: &CommandContext, missing: &[Capability]) {
        let list = missing
            .iter()
            .map(|cap| format!("• {}", capability_name(ctx, cap)))
            .collect::<Vec<_>>()
            .join("\n");
        let title = ctx.render(keys::PERMISSION_DENIED_TITLE, &[]);
        let body = ctx.render(keys::PERMISSION_DENIED_DESCRIPTION, &[list.as_str()]);

        let message = ctx.message();
        let notice = OutboundMessage::titled_error(title.clone(), body.clone());
        match self.platform.send(message.channel_id, notice).await {
            Ok(()) => {}
            Err(err) if err.is_missing_access() => {
                debug!(channel = %message.channel_id, "channel closed to the bot, notifying guild owner");
                let dm = OutboundMessage::info(title, body);
                if let Err(err) = self.platform.send_to_owner(message.guild_id, dm).await {
                    warn!(guild = %message.guild_id, %err, "failed to notify guild owner");
                }
            }
            Err(err) => {
                warn!(channel = %message.channel_id, %err, "failed to send permission notice");
            }
        }
    }

    /// Best-effort send of a user-facing error.
    async fn notify(&self, channel: ChannelId, message: OutboundMessage) {
        if let Err(err) = self.platform.send(channel, message).await {
            warn!(%channel, %err, "failed to deliver notice");
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("table", &self.table)
            .field("options", &self.options)
            .field("awaiting", &self.awaiting)
            .finish_non_exhaustive()
    }
}

/// Default help body: usage line, plus the notation footer when there are parameters.
fn usage_text(ctx: &CommandContext, spec: &CommandSpec) -> String {
    let usage = ctx.usage_line(spec);
    if spec.params().is_empty() {
        usage
    } else {
        format!("{usage}\n\n{}", ctx.render(keys::HELP_DISCLAIMER_USER, &[]))
    }
}

/// Localized capability name, or the raw token when no translation exists.
fn capability_name(ctx: &CommandContext, cap: &Capability) -> String {
    let key = keys::permission(cap.as_str());
    let name = ctx.render(&key, &[]);
    if name == key {
        cap.as_str().to_string()
    } else {
        name
    }
}
