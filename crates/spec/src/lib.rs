//! Command specification data structures for parley.
//!
//! Defines the compiled form of a chat command: its [`ParameterSpec`] list,
//! required [`Capability`] tokens and usage pattern. Commands are declared with
//! a [`CommandDeclaration`] (usually written in code or loaded from JSON) and
//! turned into an immutable [`CommandSpec`] by the [`compile`] module once, at
//! startup.

#![warn(missing_docs)]

/// Parameter-pattern compiler (`<required> [optional] [rest...]`).
pub mod compile;

pub use compile::{compile_pattern, render_pattern, split_pattern};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Marker suffix that turns a parameter into a variadic one.
pub const VARIADIC_MARKER: &str = "...";

// ─── Errors ─────────────────────────────────────────────────────────────────

/// The grammar rule a parameter pattern broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarViolation {
    /// A required parameter appears after an optional one.
    RequiredAfterOptional,
    /// A variadic marker was found on a parameter that is not the last one.
    VariadicNotLast,
}

impl std::fmt::Display for GrammarViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarViolation::RequiredAfterOptional => {
                write!(f, "required parameter after an optional parameter")
            }
            GrammarViolation::VariadicNotLast => {
                write!(f, "variadic parameter must be the last parameter")
            }
        }
    }
}

/// Errors produced while compiling or loading command declarations.
///
/// All of these are authoring bugs in a command declaration: they are raised
/// at startup and are expected to abort it.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum SpecError {
    /// A pattern token is not wrapped in a matching `<...>` / `[...]` pair or
    /// has an empty name.
    #[error("malformed parameter '{token}'")]
    MalformedParameter {
        /// The offending token, as written.
        token: String,
    },

    /// The pattern is well-formed token by token but breaks an ordering rule.
    #[error("invalid parameter grammar at '{token}': {violation}")]
    InvalidGrammar {
        /// The token at which the violation was detected.
        token: String,
        /// Which rule was broken.
        violation: GrammarViolation,
    },

    /// A command key or alias is empty or contains whitespace.
    #[error("invalid command key '{0}'")]
    InvalidKey(String),

    /// A declaration file could not be deserialized.
    #[error("invalid declaration JSON: {0}")]
    InvalidJson(String),
}

impl From<serde_json::Error> for SpecError {
    fn from(e: serde_json::Error) -> Self {
        SpecError::InvalidJson(e.to_string())
    }
}

// ─── Data model ─────────────────────────────────────────────────────────────

/// Compiled description of one positional argument slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name, without wrapper or variadic marker.
    pub name: String,
    /// Whether the argument may be omitted.
    pub optional: bool,
    /// Whether the parameter captures all remaining text as one value.
    pub variadic: bool,
}

impl ParameterSpec {
    /// A required, single-token parameter.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
            variadic: false,
        }
    }

    /// An optional, single-token parameter.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: true,
            variadic: false,
        }
    }

    /// Mark this parameter variadic (builder style).
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

/// A platform permission token (e.g. `"manage_messages"`).
///
/// Tokens are opaque to the dispatcher; the surrounding platform defines them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(String);

impl Capability {
    /// Wrap a permission token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Capability {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An ordered set of capability tokens.
pub type CapabilitySet = BTreeSet<Capability>;

/// Source form of a command, before compilation.
///
/// ```
/// let decl: parley_spec::CommandDeclaration = serde_json::from_str(
///     r#"{"key": "mute", "params": "<user> [reason...]", "permissions": ["moderate_members"]}"#,
/// ).unwrap();
/// assert_eq!(decl.key, "mute");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDeclaration {
    /// Primary command key.
    pub key: String,
    /// Extra keys that resolve to the same command.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Parameter pattern, e.g. `"<count> [reason...]"`. Blank for no parameters.
    #[serde(default)]
    pub params: String,
    /// Template key of the one-line description.
    #[serde(default)]
    pub description: String,
    /// Capabilities the bot itself must hold in the invocation channel.
    #[serde(default)]
    pub permissions: Vec<Capability>,
}

impl CommandDeclaration {
    /// Start a declaration for `key` with no parameters.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    /// Set the parameter pattern (builder style).
    pub fn params(mut self, pattern: impl Into<String>) -> Self {
        self.params = pattern.into();
        self
    }

    /// Set the description template key (builder style).
    pub fn description(mut self, key: impl Into<String>) -> Self {
        self.description = key.into();
        self
    }

    /// Add an alias (builder style).
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Require a capability (builder style).
    pub fn permission(mut self, cap: impl Into<Capability>) -> Self {
        self.permissions.push(cap.into());
        self
    }
}

/// Compiled, immutable command specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    key: String,
    aliases: Vec<String>,
    param_text: String,
    params: Vec<ParameterSpec>,
    description: String,
    required_capabilities: CapabilitySet,
}

impl CommandSpec {
    /// Compile a declaration.
    ///
    /// Keys and aliases are case-folded to lowercase. Fails on an invalid key
    /// or any pattern error (see [`compile_pattern`]).
    pub fn compile(decl: CommandDeclaration) -> Result<Self, SpecError> {
        let key = normalize_key(&decl.key)?;
        let aliases = decl
            .aliases
            .iter()
            .map(|a| normalize_key(a))
            .collect::<Result<Vec<_>, _>>()?;
        let params = compile_pattern(&decl.params)?;
        Ok(Self {
            key,
            aliases,
            param_text: decl.params.trim().to_string(),
            params,
            description: decl.description,
            required_capabilities: decl.permissions.into_iter().collect(),
        })
    }

    /// Primary command key (lowercase).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Alias keys (lowercase), in declaration order.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Primary key followed by aliases.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.key.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// The parameter pattern as declared (trimmed).
    pub fn param_text(&self) -> &str {
        &self.param_text
    }

    /// Compiled parameters, in positional order.
    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    /// Description template key.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Capabilities the bot must hold before the handler may run.
    pub fn required_capabilities(&self) -> &CapabilitySet {
        &self.required_capabilities
    }

    /// Re-derive a canonical pattern from the compiled parameters.
    pub fn usage_pattern(&self) -> String {
        render_pattern(&self.params)
    }
}

fn normalize_key(raw: &str) -> Result<String, SpecError> {
    if raw.is_empty() || raw.chars().any(char::is_whitespace) {
        return Err(SpecError::InvalidKey(raw.to_string()));
    }
    Ok(raw.to_lowercase())
}

/// Parse a JSON array of [`CommandDeclaration`]s.
pub fn load_declarations_from_str(json: &str) -> Result<Vec<CommandDeclaration>, SpecError> {
    Ok(serde_json::from_str(json)?)
}

/// Parse and compile a JSON array of declarations, stopping at the first error.
pub fn compile_declarations_from_str(json: &str) -> Result<Vec<CommandSpec>, SpecError> {
    load_declarations_from_str(json)?
        .into_iter()
        .map(CommandSpec::compile)
        .collect()
}
