//! npm registry client
//!
//! Fetches package metadata from the npm registry.
//! API endpoint: {registry_url}/{package}

use crate::domain::{AlternativeSuggestion, RegistryInfo, VersionMeta};
use crate::error::RegistryError;
use crate::registry::{AlternativesCatalog, HttpClient, RegistryClient, RequestContext};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use semver::Version;
use serde::Deserialize;
use std::collections::HashMap;

/// Public npm registry URL
pub const NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";

const REGISTRY_NAME: &str = "npm";

/// Registry client backed by an npm-compatible registry
pub struct NpmRegistry {
    client: HttpClient,
    base_url: String,
    alternatives: AlternativesCatalog,
}

/// npm package document (only the fields we read)
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    /// Release times by version; `unpublished` holds an object
    #[serde(default)]
    time: HashMap<String, serde_json::Value>,
    #[serde(default)]
    versions: HashMap<String, NpmVersionManifest>,
    #[serde(default, rename = "dist-tags")]
    dist_tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct NpmVersionManifest {
    #[serde(default)]
    engines: Option<serde_json::Value>,
}

impl NpmVersionManifest {
    fn node_engine(&self) -> Option<String> {
        self.engines
            .as_ref()?
            .get("node")?
            .as_str()
            .map(str::to_string)
    }
}

impl NpmPackageResponse {
    fn into_registry_info(self) -> RegistryInfo {
        let mut info = RegistryInfo::new();

        for (raw, manifest) in &self.versions {
            let Ok(version) = Version::parse(raw) else {
                continue;
            };
            if let Some(released_at) = self
                .time
                .get(raw)
                .and_then(serde_json::Value::as_str)
                .and_then(|t| t.parse::<DateTime<Utc>>().ok())
            {
                info.release_timestamps.insert(version.clone(), released_at);
            }
            info.versions.insert(
                version,
                VersionMeta {
                    engine_constraint: manifest.node_engine(),
                },
            );
        }

        info.latest = self
            .dist_tags
            .get("latest")
            .and_then(|v| Version::parse(v).ok());
        info
    }
}

impl NpmRegistry {
    /// Creates a client for the public npm registry
    pub fn new(client: HttpClient) -> Self {
        Self::with_url(client, NPM_REGISTRY_URL)
    }

    /// Creates a client for a custom registry URL
    pub fn with_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            alternatives: AlternativesCatalog::new(),
        }
    }

    /// Set the alternatives catalog (builder pattern)
    pub fn with_alternatives(mut self, alternatives: AlternativesCatalog) -> Self {
        self.alternatives = alternatives;
        self
    }

    /// Builds the URL for a package
    fn build_url(&self, package: &str) -> String {
        format!("{}/{}", self.base_url, package)
    }

    /// Fetch and decode the package document
    pub async fn fetch(&self, package: &str) -> Result<RegistryInfo, RegistryError> {
        let url = self.build_url(package);
        tracing::debug!(package, %url, "fetching package metadata");
        let ctx = RequestContext {
            package,
            registry: REGISTRY_NAME,
        };
        let response: NpmPackageResponse = self.client.get_json(&url, ctx).await?;
        Ok(response.into_registry_info())
    }
}

#[async_trait]
impl RegistryClient for NpmRegistry {
    async fn fetch_package_info(&self, name: &str) -> RegistryInfo {
        match self.fetch(name).await {
            Ok(info) => info,
            Err(e) => {
                if e.is_not_found() {
                    tracing::debug!(package = name, "package not in registry");
                } else {
                    tracing::warn!(package = name, error = %e, "registry lookup failed");
                }
                RegistryInfo::with_error(e.to_string())
            }
        }
    }

    async fn fetch_package_alternatives(
        &self,
        name: &str,
        installed_version: &str,
    ) -> Vec<AlternativeSuggestion> {
        self.alternatives.lookup(name, installed_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> RegistryInfo {
        serde_json::from_str::<NpmPackageResponse>(json)
            .unwrap()
            .into_registry_info()
    }

    #[test]
    fn test_build_url() {
        let registry = NpmRegistry::new(HttpClient::new().unwrap());
        assert_eq!(
            registry.build_url("lodash"),
            "https://registry.npmjs.org/lodash"
        );
    }

    #[test]
    fn test_build_url_scoped_package() {
        let registry = NpmRegistry::new(HttpClient::new().unwrap());
        assert_eq!(
            registry.build_url("@types/node"),
            "https://registry.npmjs.org/@types/node"
        );
    }

    #[test]
    fn test_build_url_custom_registry() {
        let registry =
            NpmRegistry::with_url(HttpClient::new().unwrap(), "https://npm.example.com/");
        assert_eq!(registry.build_url("a"), "https://npm.example.com/a");
    }

    #[test]
    fn test_parse_package_document() {
        let info = parse(
            r#"{
                "name": "a",
                "dist-tags": {"latest": "1.1.0"},
                "versions": {
                    "1.0.0": {"engines": {"node": ">=14"}},
                    "1.1.0": {"engines": {"node": ">=18"}},
                    "2.0.0-beta.1": {}
                },
                "time": {
                    "created": "2020-01-01T00:00:00.000Z",
                    "1.0.0": "2021-01-01T00:00:00.000Z",
                    "1.1.0": "2022-06-01T00:00:00.000Z"
                }
            }"#,
        );

        assert_eq!(info.versions.len(), 3);
        assert_eq!(info.latest, Some(Version::new(1, 1, 0)));
        assert_eq!(
            info.versions[&Version::new(1, 0, 0)].engine_constraint.as_deref(),
            Some(">=14")
        );
        assert!(info.versions[&Version::parse("2.0.0-beta.1").unwrap()]
            .engine_constraint
            .is_none());
        assert_eq!(info.release_timestamps.len(), 2);
        assert!(!info.is_unknown());
    }

    #[test]
    fn test_parse_ignores_odd_engines() {
        let info = parse(
            r#"{
                "versions": {
                    "1.0.0": {"engines": ["node >= 0.4"]},
                    "not-semver": {}
                }
            }"#,
        );
        assert_eq!(info.versions.len(), 1);
        assert!(info.versions[&Version::new(1, 0, 0)].engine_constraint.is_none());
        assert!(info.latest.is_none());
    }

    #[test]
    fn test_parse_unpublished_time_entry() {
        let info = parse(
            r#"{
                "versions": {
                    "1.0.0": {}
                },
                "time": {
                    "1.0.0": "2021-01-01T00:00:00.000Z",
                    "unpublished": {
                        "time": "2023-01-01T00:00:00.000Z",
                        "versions": ["1.0.1"]
                    }
                }
            }"#,
        );
        assert_eq!(info.versions.len(), 1);
        assert!(info.released_at(&Version::new(1, 0, 0)).is_some());
    }

    #[tokio::test]
    async fn test_alternatives_from_catalog() {
        let registry = NpmRegistry::new(HttpClient::new().unwrap());
        assert!(registry
            .fetch_package_alternatives("request", "2.88.2")
            .await
            .is_empty());
    }
}
