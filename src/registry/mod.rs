//! Package registry access
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - npm registry client
//! - Alternatives catalog from configuration
//! - In-memory registry for offline use and tests

mod alternatives;
mod client;
mod npm;

pub use alternatives::{AlternativeEntry, AlternativesCatalog, DEFAULT_SOURCE};
pub use client::{HttpClient, RequestContext, DEFAULT_TIMEOUT};
pub use npm::{NpmRegistry, NPM_REGISTRY_URL};

use crate::domain::{AlternativeSuggestion, RegistryInfo};
use async_trait::async_trait;
use std::collections::HashMap;

/// Source of package metadata and replacement suggestions.
///
/// Lookups do not fail: unknown packages yield a `RegistryInfo` carrying an
/// error marker.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Fetch versions, engines and release times for a package
    async fn fetch_package_info(&self, name: &str) -> RegistryInfo;

    /// Fetch suggested replacements for a package
    async fn fetch_package_alternatives(
        &self,
        name: &str,
        installed_version: &str,
    ) -> Vec<AlternativeSuggestion>;
}

/// Registry answering from memory
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    packages: HashMap<String, RegistryInfo>,
    alternatives: AlternativesCatalog,
}

impl StaticRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package (builder pattern)
    pub fn with_package(mut self, name: impl Into<String>, info: RegistryInfo) -> Self {
        self.packages.insert(name.into(), info);
        self
    }

    /// Set the alternatives catalog (builder pattern)
    pub fn with_alternatives(mut self, alternatives: AlternativesCatalog) -> Self {
        self.alternatives = alternatives;
        self
    }
}

#[async_trait]
impl RegistryClient for StaticRegistry {
    async fn fetch_package_info(&self, name: &str) -> RegistryInfo {
        self.packages
            .get(name)
            .cloned()
            .unwrap_or_else(|| RegistryInfo::with_error(format!("package '{}' not found", name)))
    }

    async fn fetch_package_alternatives(
        &self,
        name: &str,
        installed_version: &str,
    ) -> Vec<AlternativeSuggestion> {
        self.alternatives.lookup(name, installed_version)
    }
}
