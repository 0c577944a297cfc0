//! Output rendering for the console front-end.
//!
//! Bot output (sends and owner DMs) goes to stdout. In `pretty` mode
//! dispatch outcomes and errors go to stderr, so stdout reads like the chat
//! channel; in `json` mode every event is one JSON object per line on stdout.

use std::io::{self, IsTerminal};
use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use parley_core::{ChannelId, DispatchOutcome, GuildId, MessageId, MessageKind, OutboundMessage};
use parley_spec::SpecError;
use serde_json::json;

// ── Output format ───────────────────────────────────────────────────────

/// Output format for everything the binary prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Human-readable text.
    Pretty,
    /// One JSON object per event.
    Json,
}

impl Format {
    /// Use the explicit choice, or pick based on whether stdout is a TTY.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

// ── Bot output ──────────────────────────────────────────────────────────

/// Print a message the bot sent to a channel.
pub(crate) fn print_send(format: Format, channel: ChannelId, message: &OutboundMessage) {
    match format {
        Format::Json => emit(json!({ "event": "send", "channel": channel, "message": message })),
        Format::Pretty => println!("{}", pretty_message(message)),
    }
}

/// Print a direct message the bot sent to a guild owner.
pub(crate) fn print_owner_dm(format: Format, guild: GuildId, message: &OutboundMessage) {
    match format {
        Format::Json => emit(json!({ "event": "dm", "guild": guild, "message": message })),
        Format::Pretty => println!("(dm to owner of guild {guild}) {}", pretty_message(message)),
    }
}

fn pretty_message(message: &OutboundMessage) -> String {
    let tag = match message.kind {
        MessageKind::Text => return message.body.clone(),
        MessageKind::Info => "info",
        MessageKind::Error => "error",
    };
    match &message.title {
        Some(title) => format!("[{tag}] {title}\n{}", message.body),
        None => format!("[{tag}] {}", message.body),
    }
}

// ── Dispatch events ─────────────────────────────────────────────────────

/// Report how a message was handled.
pub(crate) fn print_outcome(format: Format, id: MessageId, outcome: &DispatchOutcome) {
    match format {
        Format::Json => emit(json!({ "event": "outcome", "message": id, "outcome": outcome })),
        Format::Pretty => eprintln!("#{id} {}", outcome_label(outcome)),
    }
}

/// Report an edit that did not trigger a retry.
pub(crate) fn print_edit_ignored(format: Format, id: MessageId) {
    match format {
        Format::Json => emit(json!({ "event": "edit_ignored", "message": id })),
        Format::Pretty => eprintln!("#{id} edit ignored"),
    }
}

/// Report a dispatch failure (handler error or platform failure).
pub(crate) fn print_failure(format: Format, id: MessageId, error: &dyn std::error::Error) {
    match format {
        Format::Json => emit(json!({ "event": "failure", "message": id, "error": error.to_string() })),
        Format::Pretty => eprintln!("#{id} failed: {error}"),
    }
}

fn outcome_label(outcome: &DispatchOutcome) -> String {
    match outcome {
        DispatchOutcome::NotCommand => "not a command".to_string(),
        DispatchOutcome::Completed { key } => format!("{key}: completed"),
        DispatchOutcome::UnknownCommand { key, suggestion } => match suggestion {
            Some(s) => format!("{key}: unknown command (did you mean {s}?)"),
            None => format!("{key}: unknown command"),
        },
        DispatchOutcome::TooFewArguments { key } => format!("{key}: too few arguments"),
        DispatchOutcome::TooManyArguments { key } => format!("{key}: too many arguments"),
        DispatchOutcome::PermissionDenied { key, missing } => {
            let missing: Vec<_> = missing.iter().map(|c| c.as_str()).collect();
            format!("{key}: missing permissions {}", missing.join(", "))
        }
        DispatchOutcome::HelpRequested { key, shown } => {
            if *shown {
                format!("{key}: help shown")
            } else {
                format!("{key}: help hidden")
            }
        }
        DispatchOutcome::PreconditionFailed { key } => format!("{key}: precondition failed"),
    }
}

fn emit(value: serde_json::Value) {
    println!("{value}");
}

// ── Declaration check errors ────────────────────────────────────────────

/// Render a declaration error against the file it came from.
///
/// Errors that name a token or key are underlined at its first occurrence in
/// `source`; others are printed as a plain message.
pub(crate) fn render_spec_error_pretty(source: &str, filename: &str, err: &SpecError) {
    let needle = match err {
        SpecError::MalformedParameter { token } | SpecError::InvalidGrammar { token, .. } => {
            Some(token.as_str())
        }
        SpecError::InvalidKey(key) if !key.is_empty() => Some(key.as_str()),
        _ => None,
    };
    let span = needle.and_then(|n| source.find(n).map(|start| start..start + n.len()));
    render_at(source, filename, span, &err.to_string(), "declared here");
}

/// Byte range of the contents of the string literal that redeclares `key`.
///
/// Only `"key"` values and `"aliases"` entries count, compared
/// case-insensitively, and the second such occurrence is the one a command
/// table rejects.
pub(crate) fn locate_duplicate_key(source: &str, key: &str) -> Option<Range<usize>> {
    let mut property: Option<&str> = None;
    let mut seen = 0;
    for (range, text) in string_literals(source) {
        let is_name = source[range.end + 1..].trim_start().starts_with(':');
        if is_name {
            property = Some(text);
            continue;
        }
        let declares = matches!(property, Some("key" | "aliases"));
        if declares && text.eq_ignore_ascii_case(key) {
            seen += 1;
            if seen == 2 {
                return Some(range);
            }
        }
    }
    None
}

/// String literals in `source` as (content range, raw content).
fn string_literals(source: &str) -> Vec<(Range<usize>, &str)> {
    let bytes = source.as_bytes();
    let mut literals = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'"' {
            i += 1;
            continue;
        }
        let start = i + 1;
        let mut end = start;
        while end < bytes.len() && bytes[end] != b'"' {
            end += if bytes[end] == b'\\' { 2 } else { 1 };
        }
        if end >= bytes.len() {
            break;
        }
        literals.push((start..end, &source[start..end]));
        i = end + 1;
    }
    literals
}

/// Render an error at `span` of `source`, or as a plain message without one.
pub(crate) fn render_at(
    source: &str,
    filename: &str,
    span: Option<Range<usize>>,
    message: &str,
    label: &str,
) {
    let Some(span) = span else {
        eprintln!("error: {message}");
        return;
    };

    let mut cache = (filename, Source::from(source));
    Report::build(ReportKind::Error, (filename, span.clone()))
        .with_message(message)
        .with_config(
            Config::default()
                .with_compact(false)
                .with_color(io::stderr().is_terminal()),
        )
        .with_label(
            Label::new((filename, span))
                .with_message(label)
                .with_color(Color::Red),
        )
        .finish()
        .eprint(&mut cache)
        .ok();
}
