//! Dispatcher settings and per-guild configuration for parley.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Prefix used when nothing else is configured.
pub const DEFAULT_PREFIX: &str = "!";
/// Default maximum (exclusive) edit distance for "did you mean" suggestions.
pub const DEFAULT_MAX_SUGGESTION_DISTANCE: usize = 3;
/// Default lifetime of an awaiting-edit mark, in seconds.
pub const DEFAULT_EDIT_RETRY_TTL_SECS: u64 = 600;

/// Errors that can occur when loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON deserialization failed.
    #[error("invalid settings JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field value is out of its valid range.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Dotted path of the field that failed validation.
        field: String,
        /// A human-readable explanation of why the value is invalid.
        reason: String,
    },
}

/// Top-level settings.
///
/// # Example
/// ```
/// let settings = parley_config::load_settings_from_str(
///     r#"{"defaults": {"prefixes": ["?", "bot "]}, "guilds": {"42": {"locale": "ru"}}}"#,
/// ).unwrap();
/// assert_eq!(settings.guild(7).primary_prefix(), "?");
/// assert_eq!(settings.guild(42).locale, "ru");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Settings for any guild without an override.
    #[serde(default)]
    pub defaults: GuildSettings,
    /// Fuzzy-match tuning.
    #[serde(default)]
    pub suggestion: SuggestionSettings,
    /// Edit-triggered retry tuning.
    #[serde(default)]
    pub edit_retry: EditRetrySettings,
    /// Whether a message that replies to another one counts as supplying the
    /// first required argument.
    #[serde(default = "default_true")]
    pub reply_satisfies_first_argument: bool,
    /// Per-guild overrides keyed by guild id.
    #[serde(default)]
    pub guilds: BTreeMap<u64, GuildSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            defaults: GuildSettings::default(),
            suggestion: SuggestionSettings::default(),
            edit_retry: EditRetrySettings::default(),
            reply_satisfies_first_argument: true,
            guilds: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Effective settings for a guild: its override, or the defaults.
    pub fn guild(&self, guild_id: u64) -> &GuildSettings {
        self.guilds.get(&guild_id).unwrap_or(&self.defaults)
    }
}

/// Per-guild settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuildSettings {
    /// Command prefixes, tried in order.
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<String>,
    /// Locale tag for rendered messages.
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for GuildSettings {
    fn default() -> Self {
        Self {
            prefixes: default_prefixes(),
            locale: default_locale(),
        }
    }
}

impl GuildSettings {
    /// The prefix shown in usage and error messages.
    pub fn primary_prefix(&self) -> &str {
        self.prefixes.first().map_or(DEFAULT_PREFIX, String::as_str)
    }
}

/// Fuzzy-match tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuggestionSettings {
    /// A suggestion is offered only when its edit distance is strictly below this.
    #[serde(default = "default_max_distance")]
    pub max_distance: usize,
}

impl Default for SuggestionSettings {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_SUGGESTION_DISTANCE,
        }
    }
}

/// Edit-triggered retry tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditRetrySettings {
    /// How long a message stays eligible for retry. `null` disables expiry.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: Option<u64>,
}

impl Default for EditRetrySettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl EditRetrySettings {
    /// The TTL as a [`Duration`], if expiry is enabled.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_prefixes() -> Vec<String> {
    vec![DEFAULT_PREFIX.to_string()]
}

fn default_locale() -> String {
    parley_i18n::DEFAULT_LOCALE.to_string()
}

fn default_max_distance() -> usize {
    DEFAULT_MAX_SUGGESTION_DISTANCE
}

fn default_ttl_secs() -> Option<u64> {
    Some(DEFAULT_EDIT_RETRY_TTL_SECS)
}

/// Parse settings from JSON and validate them.
pub fn load_settings_from_str(json: &str) -> Result<Settings, ConfigError> {
    let settings: Settings = serde_json::from_str(json)?;
    validate_settings(&settings)?;
    Ok(settings)
}

/// Check cross-field invariants serde cannot express.
pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    validate_guild("defaults", &settings.defaults)?;
    for (id, guild) in &settings.guilds {
        validate_guild(&format!("guilds.{id}"), guild)?;
    }
    if settings.suggestion.max_distance == 0 {
        return Err(invalid(
            "suggestion.max_distance",
            "must be at least 1 (0 would never suggest anything)",
        ));
    }
    Ok(())
}

fn validate_guild(path: &str, guild: &GuildSettings) -> Result<(), ConfigError> {
    if guild.prefixes.is_empty() {
        return Err(invalid(&format!("{path}.prefixes"), "must not be empty"));
    }
    for (i, prefix) in guild.prefixes.iter().enumerate() {
        if prefix.trim().is_empty() {
            return Err(invalid(&format!("{path}.prefixes[{i}]"), "must not be blank"));
        }
        if prefix.starts_with(char::is_whitespace) {
            return Err(invalid(
                &format!("{path}.prefixes[{i}]"),
                "must not start with whitespace",
            ));
        }
    }
    if guild.locale.trim().is_empty() {
        return Err(invalid(&format!("{path}.locale"), "must not be blank"));
    }
    Ok(())
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
