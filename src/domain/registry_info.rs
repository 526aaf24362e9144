//! Registry metadata for one package

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-version metadata published by the registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMeta {
    /// `engines.node` declared by this version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_constraint: Option<String>,
}

impl VersionMeta {
    /// Creates metadata with an engine constraint
    pub fn with_engine(constraint: impl Into<String>) -> Self {
        Self {
            engine_constraint: Some(constraint.into()),
        }
    }
}

/// Everything the registry knows about a package.
///
/// Lookups never fail: unknown packages or transport failures produce an
/// instance with no versions and `error` set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryInfo {
    /// Published versions (unparseable versions are dropped)
    pub versions: BTreeMap<Version, VersionMeta>,
    /// `dist-tags.latest`
    pub latest: Option<Version>,
    /// Release time of each version
    pub release_timestamps: BTreeMap<Version, DateTime<Utc>>,
    /// Error marker when the lookup failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RegistryInfo {
    /// Creates an empty RegistryInfo
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a RegistryInfo carrying only an error marker
    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Adds a version (builder pattern)
    pub fn with_version(mut self, version: Version, meta: VersionMeta) -> Self {
        self.versions.insert(version, meta);
        self
    }

    /// Adds a release timestamp (builder pattern)
    pub fn with_release(mut self, version: Version, released_at: DateTime<Utc>) -> Self {
        self.release_timestamps.insert(version, released_at);
        self
    }

    /// Sets the latest dist-tag (builder pattern)
    pub fn with_latest(mut self, latest: Version) -> Self {
        self.latest = Some(latest);
        self
    }

    /// Returns true if the registry had nothing usable for this package
    pub fn is_unknown(&self) -> bool {
        self.error.is_some() || self.versions.is_empty()
    }

    /// Returns the latest version: the dist-tag, else the highest stable version
    pub fn latest_version(&self) -> Option<&Version> {
        self.latest.as_ref().or_else(|| {
            self.versions
                .keys()
                .rev()
                .find(|v| v.pre.is_empty())
                .or_else(|| self.versions.keys().next_back())
        })
    }

    /// Returns the release time of `version`
    pub fn released_at(&self, version: &Version) -> Option<DateTime<Utc>> {
        self.release_timestamps.get(version).copied()
    }
}
