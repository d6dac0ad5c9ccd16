//! Message catalogs.
//!
//! A catalog is a flat JSON object mapping an English template to its
//! translation, stored as `<config dir>/i18n/<locale>.json`. Lookups happen on
//! the raw template, before any values are substituted, so one entry covers
//! every rendering of a message. Missing catalogs and missing entries fall
//! back to the English text.

use crate::error::{CliError, Result};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct Translator {
    entries: HashMap<String, String>,
}

impl Translator {
    /// A translator that returns every template unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Loads the catalog for `locale` from `config_dir`, or the identity
    /// translator when no catalog exists.
    pub fn load(config_dir: &Path, locale: &str) -> Result<Self> {
        if locale.is_empty() {
            return Ok(Self::identity());
        }
        let path = config_dir.join("i18n").join(format!("{}.json", locale));
        if !path.exists() {
            tracing::debug!(locale, "no message catalog, using built-in text");
            return Ok(Self::identity());
        }
        let content = fs::read_to_string(&path)?;
        let entries: HashMap<String, String> = serde_json::from_str(&content)
            .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(locale, entries = entries.len(), "loaded message catalog");
        Ok(Self { entries })
    }

    pub fn translate<'a>(&'a self, template: &'a str) -> Cow<'a, str> {
        match self.entries.get(template) {
            Some(translated) => Cow::Borrowed(translated.as_str()),
            None => Cow::Borrowed(template),
        }
    }
}
