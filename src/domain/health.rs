//! Dependency health classification results

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse staleness/risk tier of an installed dependency.
///
/// Ordered by severity; `Unknown` sorts first because it carries no
/// severity of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthTier {
    /// Registry has no usable data, or the record is the project itself
    Unknown,
    /// Installed is the latest
    Green,
    /// Patch or pre-release gap
    Yellow,
    /// Minor gap
    Orange,
    /// Major gap, or installed version unparseable
    Red,
}

impl HealthTier {
    /// Returns the next more severe tier (`Red` stays `Red`)
    pub fn escalate(self) -> Self {
        match self {
            HealthTier::Unknown => HealthTier::Unknown,
            HealthTier::Green => HealthTier::Yellow,
            HealthTier::Yellow => HealthTier::Orange,
            HealthTier::Orange | HealthTier::Red => HealthTier::Red,
        }
    }

    /// Returns the more severe of `self` and `floor`
    pub fn at_least(self, floor: HealthTier) -> Self {
        self.max(floor)
    }
}

impl fmt::Display for HealthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HealthTier::Unknown => "unknown",
            HealthTier::Green => "green",
            HealthTier::Yellow => "yellow",
            HealthTier::Orange => "orange",
            HealthTier::Red => "red",
        };
        write!(f, "{}", name)
    }
}

/// A suggested replacement package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeSuggestion {
    /// Alternative package name
    pub name: String,
    /// Version to install (`latest` or a concrete version)
    pub version: String,
    /// Why the alternative is suggested
    pub reason: String,
    /// Where the suggestion comes from
    pub source: String,
}

impl AlternativeSuggestion {
    /// Creates a new AlternativeSuggestion
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        reason: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            reason: reason.into(),
            source: source.into(),
        }
    }
}

/// Health report for one installed dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyUpdateInfo {
    /// Package name
    pub name: String,
    /// Installed version as recorded in the lockfile
    pub installed_version: String,
    /// Latest published version
    pub latest_version: Option<Version>,
    /// Compatible newer versions, highest first
    pub available_updates: Vec<Version>,
    /// Health tier
    pub health: HealthTier,
    /// Release time of the installed version
    pub released_installed: Option<DateTime<Utc>>,
    /// Release time of the latest version
    pub released_latest: Option<DateTime<Utc>>,
    /// Explanation of the tier, if any
    pub node_compatibility_note: Option<String>,
    /// Suggested replacements
    pub alternatives: Vec<AlternativeSuggestion>,
}

impl DependencyUpdateInfo {
    /// Creates a report with no registry data
    pub fn new(name: impl Into<String>, installed_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            installed_version: installed_version.into(),
            latest_version: None,
            available_updates: Vec::new(),
            health: HealthTier::Unknown,
            released_installed: None,
            released_latest: None,
            node_compatibility_note: None,
            alternatives: Vec::new(),
        }
    }

    /// Returns the best upgrade target
    pub fn best_update(&self) -> Option<&Version> {
        self.available_updates.first()
    }

    /// Appends a note, joining with any existing one
    pub fn push_note(&mut self, note: impl AsRef<str>) {
        let note = note.as_ref();
        self.node_compatibility_note = Some(match self.node_compatibility_note.take() {
            Some(existing) => format!("{} {}", existing, note),
            None => note.to_string(),
        });
    }
}
