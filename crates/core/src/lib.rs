//! parley core library.
//!
//! Turns raw chat messages into validated command invocations. The main entry
//! point is [`Dispatcher`]: build a [`CommandTable`] from [`Registration`]s
//! once at startup, then feed every inbound message to
//! [`Dispatcher::handle_message`] and every edit to
//! [`Dispatcher::handle_edit`]. The platform is reached only through the
//! [`Platform`] and [`GuildDirectory`] traits, and all user-facing text goes
//! through a [`parley_i18n::Renderer`].

#![warn(missing_docs)]

/// Awaiting-edit marks for edit-triggered retries.
pub mod awaiting;
/// Per-invocation context handed to handlers.
pub mod context;
/// The dispatch pipeline.
pub mod dispatch;
/// Prefix / mention recognition and key extraction.
pub mod invocation;
/// Platform-neutral message types.
pub mod model;
/// Platform and guild-configuration seams.
pub mod platform;
/// Command registrations and the command table.
pub mod registry;
/// Edit-distance suggestions.
pub mod suggest;
/// Argument binding.
pub mod tokenizer;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Dispatcher
pub use dispatch::{DispatchError, DispatchOptions, DispatchOutcome, Dispatcher};

// Registry
pub use context::CommandContext;
pub use registry::{
    CommandEntry, CommandTable, HandlerError, HandlerResult, Registration, RegistryError,
};

// Parsing
pub use invocation::Invocation;
pub use suggest::{closest, levenshtein};
pub use tokenizer::{ArgumentBinding, ArgumentError, BoundArgument, bind_arguments, is_help_request};

// Platform
pub use awaiting::AwaitingEditSet;
pub use model::{
    ChannelId, GuildId, InboundMessage, MentionForms, MessageId, MessageKind, OutboundMessage,
    UserId,
};
pub use platform::{GuildDirectory, Platform, PlatformError};
