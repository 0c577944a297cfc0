//! Localized message rendering for parley.
//!
//! The dispatcher never builds user-facing text itself: it hands a template
//! key plus positional arguments to a [`Renderer`]. [`Catalog`] is the bundled
//! implementation, backed by one JSON bundle per locale with fallback to the
//! default locale. Template keys are defined in the [`keys`] module.

#![warn(missing_docs)]

/// Template key constants.
pub mod keys;

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// Locale used when a guild has none configured, and the last fallback tier.
pub const DEFAULT_LOCALE: &str = "en";

const EMBEDDED_BUNDLES: &[&str] = &[
    include_str!("locales/en.json"),
    include_str!("locales/ru.json"),
];

/// Errors that can occur when loading a message bundle.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// JSON deserialization failed.
    #[error("invalid bundle JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The bundle declares an empty locale tag.
    #[error("bundle has an empty locale tag")]
    EmptyLocale,
}

/// Renders template keys into user-facing text.
///
/// Implementations must be total: a missing key renders as something
/// (typically the key itself) rather than failing.
pub trait Renderer: Send + Sync {
    /// Render `key` for `locale`, substituting positional `args`.
    fn render(&self, locale: &str, key: &str, args: &[&str]) -> String;
}

/// One locale's messages, as stored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct Bundle {
    /// Locale tag (e.g. `"en"`).
    pub locale: String,
    /// Template key → template text.
    pub messages: HashMap<String, String>,
}

/// Message catalog: bundles keyed by locale.
#[derive(Debug, Clone)]
pub struct Catalog {
    bundles: HashMap<String, HashMap<String, String>>,
    default_locale: String,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// An empty catalog with [`DEFAULT_LOCALE`] as fallback.
    pub fn new() -> Self {
        Self {
            bundles: HashMap::new(),
            default_locale: DEFAULT_LOCALE.to_string(),
        }
    }

    /// A catalog holding the bundles compiled into this crate.
    pub fn embedded() -> Self {
        Self::from_sources(EMBEDDED_BUNDLES)
    }

    /// Load every bundle in `sources`, logging and skipping any that fail.
    fn from_sources(sources: &[&str]) -> Self {
        let mut catalog = Self::new();
        for (index, src) in sources.iter().enumerate() {
            if let Err(err) = catalog.load_bundle_str(src) {
                tracing::warn!(index, %err, "skipping unreadable message bundle");
            }
        }
        catalog
    }

    /// Parse a bundle from JSON and add it (see [`Catalog::insert`]).
    pub fn load_bundle_str(&mut self, json: &str) -> Result<(), CatalogError> {
        let bundle: Bundle = serde_json::from_str(json)?;
        if bundle.locale.trim().is_empty() {
            return Err(CatalogError::EmptyLocale);
        }
        self.insert(bundle);
        Ok(())
    }

    /// Add a bundle. Keys already present for that locale are overwritten.
    pub fn insert(&mut self, bundle: Bundle) {
        self.bundles
            .entry(bundle.locale)
            .or_default()
            .extend(bundle.messages);
    }

    /// Locales with at least one bundle.
    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.bundles.keys().map(String::as_str)
    }

    /// Raw template for `key`: requested locale, then the default locale.
    pub fn template(&self, locale: &str, key: &str) -> Option<&str> {
        self.bundles
            .get(locale)
            .and_then(|m| m.get(key))
            .or_else(|| self.bundles.get(&self.default_locale).and_then(|m| m.get(key)))
            .map(String::as_str)
    }
}

impl Renderer for Catalog {
    fn render(&self, locale: &str, key: &str, args: &[&str]) -> String {
        match self.template(locale, key) {
            Some(template) => format_template(template, args),
            None => key.to_string(),
        }
    }
}

/// Substitute `{0}`, `{1}`, … in `template` with `args`.
///
/// Placeholders without a matching argument are left as written.
pub fn format_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        let closed = digits > 0 && after.as_bytes().get(digits) == Some(&b'}');
        match closed
            .then(|| after[..digits].parse::<usize>().ok())
            .flatten()
            .and_then(|i| args.get(i))
        {
            Some(arg) => {
                out.push_str(arg);
                rest = &after[digits + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
