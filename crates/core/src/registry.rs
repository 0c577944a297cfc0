//! Command registry: the immutable table of registered commands.

use futures::future::BoxFuture;
use parley_spec::{CommandDeclaration, CommandSpec, SpecError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::context::CommandContext;
use crate::tokenizer::ArgumentBinding;

/// Opaque failure raised by a command handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result of running a handler or help function.
pub type HandlerResult = Result<(), HandlerError>;

type HandlerFn = dyn Fn(CommandContext, ArgumentBinding) -> BoxFuture<'static, HandlerResult>
    + Send
    + Sync;
type PreconditionFn = dyn Fn(CommandContext) -> BoxFuture<'static, bool> + Send + Sync;
type HelpFn = dyn Fn(CommandContext) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// Errors raised while building a [`CommandTable`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A declaration failed to compile.
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// Two commands claim the same key or alias.
    #[error("command key '{key}' of '{command}' is already registered by '{existing}'")]
    DuplicateKey {
        /// The contested key.
        key: String,
        /// Primary key of the command registered first.
        existing: String,
        /// Primary key of the command being registered.
        command: String,
    },
}

/// One command: spec, precondition, handler and optional custom help.
pub struct Registration {
    spec: CommandSpec,
    handler: Arc<HandlerFn>,
    precondition: Option<Arc<PreconditionFn>>,
    help: Option<Arc<HelpFn>>,
}

impl Registration {
    /// Register `handler` for an already compiled spec.
    pub fn new<H, Fut>(spec: CommandSpec, handler: H) -> Self
    where
        H: Fn(CommandContext, ArgumentBinding) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let handler: Arc<HandlerFn> = Arc::new(
            move |ctx: CommandContext, args: ArgumentBinding| -> BoxFuture<'static, HandlerResult> {
                Box::pin(handler(ctx, args))
            },
        );
        Self {
            spec,
            handler,
            precondition: None,
            help: None,
        }
    }

    /// Compile `decl` and register `handler` for it.
    pub fn declare<H, Fut>(decl: CommandDeclaration, handler: H) -> Result<Self, SpecError>
    where
        H: Fn(CommandContext, ArgumentBinding) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Ok(Self::new(CommandSpec::compile(decl)?, handler))
    }

    /// Gate the command behind an applicability check (default: always applicable).
    pub fn precondition<P, Fut>(mut self, precondition: P) -> Self
    where
        P: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let precondition: Arc<PreconditionFn> =
            Arc::new(move |ctx: CommandContext| -> BoxFuture<'static, bool> {
                Box::pin(precondition(ctx))
            });
        self.precondition = Some(precondition);
        self
    }

    /// Replace the default usage rendering shown for `<key> help`.
    pub fn help<F, Fut>(mut self, help: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let help: Arc<HelpFn> =
            Arc::new(move |ctx: CommandContext| -> BoxFuture<'static, HandlerResult> {
                Box::pin(help(ctx))
            });
        self.help = Some(help);
        self
    }
}

/// A registered command.
pub struct CommandEntry {
    spec: CommandSpec,
    handler: Arc<HandlerFn>,
    precondition: Option<Arc<PreconditionFn>>,
    help: Option<Arc<HelpFn>>,
}

impl CommandEntry {
    /// The compiled spec.
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// Whether the command applies in `ctx`.
    pub async fn is_applicable(&self, ctx: &CommandContext) -> bool {
        match &self.precondition {
            Some(precondition) => precondition(ctx.clone()).await,
            None => true,
        }
    }

    /// Run the handler.
    pub async fn execute(&self, ctx: CommandContext, args: ArgumentBinding) -> HandlerResult {
        (self.handler)(ctx, args).await
    }

    /// Run the custom help function, or `None` if the command has none.
    pub async fn custom_help(&self, ctx: CommandContext) -> Option<HandlerResult> {
        match &self.help {
            Some(help) => Some(help(ctx).await),
            None => None,
        }
    }
}

impl std::fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEntry")
            .field("spec", &self.spec)
            .field("precondition", &self.precondition.is_some())
            .field("help", &self.help.is_some())
            .finish_non_exhaustive()
    }
}

/// Immutable, insertion-ordered command table.
///
/// Built once at startup; afterwards it is only read, so it can be shared
/// across tasks behind an [`Arc`] without locking.
#[derive(Debug, Default)]
pub struct CommandTable {
    entries: Vec<Arc<CommandEntry>>,
    index: HashMap<String, usize>,
}

impl CommandTable {
    /// Build a table from registrations, in order.
    ///
    /// Keys and aliases of all commands share one namespace.
    pub fn new(registrations: impl IntoIterator<Item = Registration>) -> Result<Self, RegistryError> {
        let mut table = Self::default();
        for reg in registrations {
            let position = table.entries.len();
            for key in reg.spec.keys() {
                if reg.spec.keys().filter(|k| *k == key).count() > 1 {
                    return Err(RegistryError::DuplicateKey {
                        key: key.to_string(),
                        existing: reg.spec.key().to_string(),
                        command: reg.spec.key().to_string(),
                    });
                }
                if let Some(&existing) = table.index.get(key) {
                    return Err(RegistryError::DuplicateKey {
                        key: key.to_string(),
                        existing: table.entries[existing].spec.key().to_string(),
                        command: reg.spec.key().to_string(),
                    });
                }
                table.index.insert(key.to_string(), position);
            }
            table.entries.push(Arc::new(CommandEntry {
                spec: reg.spec,
                handler: reg.handler,
                precondition: reg.precondition,
                help: reg.help,
            }));
        }
        Ok(table)
    }

    /// Look up a command by key or alias (expects a lowercase key).
    pub fn get(&self, key: &str) -> Option<&Arc<CommandEntry>> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CommandEntry>> {
        self.entries.iter()
    }

    /// Every key and alias, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().flat_map(|e| e.spec.keys())
    }

    /// Number of commands (aliases not counted).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no commands.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
