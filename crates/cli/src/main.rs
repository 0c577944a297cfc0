mod console;
mod demo;
mod render;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parley_config::{Settings, load_settings_from_str};
use parley_core::{
    ArgumentBinding, CommandContext, CommandTable, DispatchOptions, Dispatcher, GuildId,
    HandlerResult, InboundMessage, Registration, RegistryError,
};
use parley_i18n::Catalog;
use parley_spec::{Capability, CapabilitySet, CommandSpec, load_declarations_from_str};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::console::{BOT, ConsolePlatform, Input, Session};
use crate::render::{
    Format, locate_duplicate_key, print_edit_ignored, print_failure, print_outcome, render_at,
    render_spec_error_pretty,
};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "parley",
    version,
    about = "Chat command dispatcher: run a console session or check command declarations"
)]
struct Cli {
    /// Output mode: "pretty" for human-readable output, "json" for one JSON
    /// object per event. Defaults to "pretty" when stdout is a TTY, "json"
    /// otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Log dispatch decisions to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Dispatch stdin lines as chat messages against the built-in commands.
    ///
    /// Each line is a new message. `:edit <id> <text>` edits an earlier
    /// message, `:reply <id> <text>` posts a reply and `:quit` ends the
    /// session.
    Run {
        /// Settings file (JSON). Built-in defaults when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Permission granted to the bot in the channel (repeatable).
        #[arg(long = "grant", value_name = "CAP")]
        grants: Vec<String>,
        /// Make channel sends fail with missing access.
        #[arg(long)]
        locked_channel: bool,
        /// Guild the session's messages are posted in.
        #[arg(long, default_value_t = 1)]
        guild: u64,
    },

    /// Compile a JSON file of command declarations and report problems.
    Check {
        /// Declarations file (a JSON array).
        file: PathBuf,
    },
}

// ── Main ────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let format = Format::resolve_or_detect(cli.output.as_deref());

    let result = match cli.cmd {
        Cmd::Run {
            config,
            grants,
            locked_channel,
            guild,
        } => cmd_run(config.as_deref(), &grants, locked_channel, guild, format).await,
        Cmd::Check { file } => cmd_check(&file, format),
    };

    // In json mode failures still produce exactly one JSON object on stdout.
    match (result, format) {
        (Err(err), Format::Json) => {
            println!(
                "{}",
                serde_json::json!({
                    "success": false,
                    "error": "command_failed",
                    "message": format!("{err:#}"),
                })
            );
            process::exit(1);
        }
        (result, _) => result,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

// ── Commands ────────────────────────────────────────────────────────────

async fn cmd_run(
    config: Option<&Path>,
    grants: &[String],
    locked_channel: bool,
    guild: u64,
    format: Format,
) -> Result<()> {
    let settings = match config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings '{}'", path.display()))?;
            load_settings_from_str(&json)
                .with_context(|| format!("invalid settings '{}'", path.display()))?
        }
        None => Settings::default(),
    };

    let granted: CapabilitySet = grants.iter().map(|g| Capability::new(g.as_str())).collect();
    let platform = Arc::new(ConsolePlatform::new(granted, locked_channel, format));
    let table = CommandTable::new(demo::registrations()?)?;
    let options = DispatchOptions::from_settings(BOT, &settings);
    let dispatcher = Dispatcher::new(
        Arc::new(table),
        platform,
        Arc::new(settings),
        Arc::new(Catalog::embedded()),
        options,
    );
    tracing::debug!(commands = dispatcher.table().len(), "console session ready");

    let mut session = Session::new(GuildId(guild));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match Input::parse(&line) {
            Ok(input) => input,
            Err(usage) => {
                tracing::warn!("{usage}");
                continue;
            }
        };
        match input {
            Input::Blank => {}
            Input::Quit => break,
            Input::Message(text) => {
                let message = session.post(text, None);
                dispatch_new(&dispatcher, &message, format).await;
            }
            Input::Reply { to, text } => {
                let message = session.post(text, Some(to));
                dispatch_new(&dispatcher, &message, format).await;
            }
            Input::Edit { id, text } => {
                let message = session.edit(id, text);
                match dispatcher.handle_edit(&message).await {
                    Ok(Some(outcome)) => print_outcome(format, message.id, &outcome),
                    Ok(None) => print_edit_ignored(format, message.id),
                    Err(err) => {
                        tracing::error!(message = %message.id, error = %err, "dispatch failed");
                        print_failure(format, message.id, &err);
                    }
                }
            }
        }
    }

    Ok(())
}

async fn dispatch_new(dispatcher: &Dispatcher, message: &InboundMessage, format: Format) {
    match dispatcher.handle_message(message).await {
        Ok(outcome) => print_outcome(format, message.id, &outcome),
        Err(err) => {
            tracing::error!(message = %message.id, error = %err, "dispatch failed");
            print_failure(format, message.id, &err);
        }
    }
}

fn cmd_check(file: &Path, format: Format) -> Result<()> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("failed to read declarations '{}'", file.display()))?;
    let filename = file.display().to_string();

    match check_declarations(&source) {
        Ok(specs) => {
            match format {
                Format::Json => {
                    let commands: Vec<_> = specs
                        .iter()
                        .map(|spec| {
                            serde_json::json!({
                                "key": spec.key(),
                                "aliases": spec.aliases(),
                                "usage": spec.usage_pattern(),
                                "permissions": spec.required_capabilities(),
                            })
                        })
                        .collect();
                    println!(
                        "{}",
                        serde_json::json!({ "ok": true, "commands": commands })
                    );
                }
                Format::Pretty => {
                    for spec in &specs {
                        let pattern = spec.usage_pattern();
                        if pattern.is_empty() {
                            println!("{}", spec.key());
                        } else {
                            println!("{} {pattern}", spec.key());
                        }
                    }
                    eprintln!("{filename}: {} command(s) ok", specs.len());
                }
            }
            Ok(())
        }
        Err(err) => {
            match format {
                Format::Json => println!(
                    "{}",
                    serde_json::json!({ "ok": false, "error": err.to_string() })
                ),
                Format::Pretty => render_check_error(&source, &filename, &err),
            }
            process::exit(1);
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Compile declarations and assemble them into a table, so duplicate keys
/// are caught as well as pattern errors.
fn check_declarations(source: &str) -> Result<Vec<CommandSpec>, RegistryError> {
    let specs = load_declarations_from_str(source)?
        .into_iter()
        .map(CommandSpec::compile)
        .collect::<Result<Vec<_>, _>>()?;
    CommandTable::new(
        specs
            .iter()
            .cloned()
            .map(|spec| Registration::new(spec, no_op)),
    )?;
    Ok(specs)
}

async fn no_op(_ctx: CommandContext, _args: ArgumentBinding) -> HandlerResult {
    Ok(())
}

fn render_check_error(source: &str, filename: &str, err: &RegistryError) {
    match err {
        RegistryError::Spec(spec_err) => render_spec_error_pretty(source, filename, spec_err),
        RegistryError::DuplicateKey { key, .. } => {
            let span = locate_duplicate_key(source, key);
            render_at(source, filename, span, &err.to_string(), "declared again here");
        }
        _ => eprintln!("error: {err}"),
    }
}
