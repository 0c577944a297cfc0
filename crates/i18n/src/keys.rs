//! Template key constants.
//!
//! Use these instead of string literals to get compile-time typo detection.
//! Every key here has an entry in the embedded `en` bundle.

/// Unknown command with a suggestion. Args: suggested key.
pub const FOUND_CLOSEST: &str = "command.response.found-closest";
/// Unknown command without a suggestion. Args: active prefix.
pub const UNKNOWN_COMMAND: &str = "command.response.unknown";
/// Title of the too-few-arguments error.
pub const FEW_ARGUMENTS_TITLE: &str = "command.response.few-arguments.title";
/// Title of the too-many-arguments error.
pub const MANY_ARGUMENTS_TITLE: &str = "command.response.many-arguments.title";
/// Usage line for a command with parameters. Args: prefix, key, pattern.
pub const INCORRECT_ARGUMENTS: &str = "command.response.incorrect-arguments";
/// Usage line for a command without parameters. Args: prefix, key.
pub const INCORRECT_ARGUMENTS_EMPTY: &str = "command.response.incorrect-arguments.empty";

/// Title of help messages.
pub const HELP_TITLE: &str = "command.help.title";
/// Default per-command help. Args: prefix, key, pattern, description.
pub const HELP_USAGE: &str = "command.help.usage";
/// Default per-command help without parameters. Args: prefix, key, description.
pub const HELP_USAGE_EMPTY: &str = "command.help.usage.empty";
/// Footer explaining the `<required>` / `[optional]` notation.
pub const HELP_DISCLAIMER_USER: &str = "command.help.disclaimer.user";
/// Footer pointing at per-command help. Args: prefix.
pub const HELP_DISCLAIMER_HELP: &str = "command.help.disclaimer.help";

/// Title of the permission-denied notice.
pub const PERMISSION_DENIED_TITLE: &str = "message.error.permission-denied.title";
/// Body of the permission-denied notice. Args: bullet list of permissions.
pub const PERMISSION_DENIED_DESCRIPTION: &str = "message.error.permission-denied.description";

/// Prefix for capability display names (`permission.<token>`).
pub const PERMISSION_PREFIX: &str = "permission.";

/// Template key for the display name of a capability token.
pub fn permission(token: &str) -> String {
    format!("{PERMISSION_PREFIX}{token}")
}

/// All fixed keys the dispatcher renders.
pub const ALL: &[&str] = &[
    FOUND_CLOSEST,
    UNKNOWN_COMMAND,
    FEW_ARGUMENTS_TITLE,
    MANY_ARGUMENTS_TITLE,
    INCORRECT_ARGUMENTS,
    INCORRECT_ARGUMENTS_EMPTY,
    HELP_TITLE,
    HELP_USAGE,
    HELP_USAGE_EMPTY,
    HELP_DISCLAIMER_USER,
    HELP_DISCLAIMER_HELP,
    PERMISSION_DENIED_TITLE,
    PERMISSION_DENIED_DESCRIPTION,
];
