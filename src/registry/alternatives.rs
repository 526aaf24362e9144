//! Catalog of replacement suggestions
//!
//! Suggestions come from the `[alternatives]` tables of `packman.toml`:
//!
//! ```toml
//! [[alternatives.request]]
//! name = "got"
//! version = "latest"
//! reason = "request is deprecated"
//! installed = "<3.0.0"   # optional: only suggest for matching installs
//! ```

use crate::compat::Constraint;
use crate::domain::AlternativeSuggestion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default `source` for suggestions that do not name one
pub const DEFAULT_SOURCE: &str = "packman.toml";

/// One configured alternative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeEntry {
    /// Alternative package name
    pub name: String,
    /// Version to install
    #[serde(default = "default_version")]
    pub version: String,
    /// Why it is suggested
    #[serde(default)]
    pub reason: String,
    /// Where the suggestion comes from
    #[serde(default)]
    pub source: Option<String>,
    /// Range of installed versions the suggestion applies to
    #[serde(default)]
    pub installed: Option<String>,
}

fn default_version() -> String {
    "latest".to_string()
}

impl AlternativeEntry {
    fn applies_to(&self, installed_version: &str) -> bool {
        let Some(range) = &self.installed else {
            return true;
        };
        let Ok(range) = Constraint::parse(range) else {
            tracing::warn!(alternative = %self.name, range = %range, "invalid 'installed' range in alternatives");
            return false;
        };
        let installed = installed_version.trim_start_matches('v');
        semver::Version::parse(installed)
            .map(|v| range.matches(&v))
            .unwrap_or(false)
    }

    fn to_suggestion(&self) -> AlternativeSuggestion {
        AlternativeSuggestion::new(
            &self.name,
            &self.version,
            &self.reason,
            self.source.as_deref().unwrap_or(DEFAULT_SOURCE),
        )
    }
}

/// Replacement suggestions keyed by the package they replace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlternativesCatalog {
    entries: BTreeMap<String, Vec<AlternativeEntry>>,
}

impl AlternativesCatalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog from configured entries
    pub fn from_entries(entries: BTreeMap<String, Vec<AlternativeEntry>>) -> Self {
        Self { entries }
    }

    /// Returns the suggestions for `package` at `installed_version`
    pub fn lookup(&self, package: &str, installed_version: &str) -> Vec<AlternativeSuggestion> {
        self.entries
            .get(package)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.applies_to(installed_version))
                    .map(AlternativeEntry::to_suggestion)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns true if no alternatives are configured
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
