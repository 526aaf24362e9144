//! Installed dependency records and dependency types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Which manifest section (and install flag) a dependency belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    /// `dependencies`
    #[default]
    Production,
    /// `devDependencies`
    Development,
    /// `optionalDependencies`
    Optional,
}

impl DependencyType {
    /// Returns the package.json section holding this type
    pub fn section(&self) -> &'static str {
        match self {
            DependencyType::Production => "dependencies",
            DependencyType::Development => "devDependencies",
            DependencyType::Optional => "optionalDependencies",
        }
    }

    /// Returns the short name used on the command line
    pub fn short_name(&self) -> &'static str {
        match self {
            DependencyType::Production => "prod",
            DependencyType::Development => "dev",
            DependencyType::Optional => "optional",
        }
    }

    /// Returns all dependency types
    pub fn all() -> &'static [DependencyType] {
        &[
            DependencyType::Production,
            DependencyType::Development,
            DependencyType::Optional,
        ]
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

impl FromStr for DependencyType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" | "dependencies" => Ok(DependencyType::Production),
            "dev" | "development" | "devdependencies" => Ok(DependencyType::Development),
            "optional" | "optionaldependencies" => Ok(DependencyType::Optional),
            _ => Err(ConfigError::InvalidDependencyType {
                value: s.to_string(),
            }),
        }
    }
}

/// One installed package as found in the lockfile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Package name
    pub name: String,
    /// Installed version, as written in the lockfile (may not be valid semver)
    pub installed_version: String,
    /// `engines.node` declared by the installed package
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_constraint: Option<String>,
    /// Whether this is the project itself
    pub is_root: bool,
    /// Whether this is a development dependency
    pub is_dev: bool,
    /// Whether this is an optional dependency
    pub is_optional: bool,
    /// Lockfile key (e.g. `node_modules/a/node_modules/b`); identifies the record
    pub path: String,
}

impl DependencyRecord {
    /// Creates a production dependency record installed at `node_modules/<name>`
    pub fn new(name: impl Into<String>, installed_version: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: format!("node_modules/{}", name),
            name,
            installed_version: installed_version.into(),
            engine_constraint: None,
            is_root: false,
            is_dev: false,
            is_optional: false,
        }
    }

    /// Creates the record describing the project itself
    pub fn root(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            installed_version: version.into(),
            engine_constraint: None,
            is_root: true,
            is_dev: false,
            is_optional: false,
            path: String::new(),
        }
    }

    /// Sets the declared engine constraint (builder pattern)
    pub fn with_engine(mut self, constraint: impl Into<String>) -> Self {
        self.engine_constraint = Some(constraint.into());
        self
    }

    /// Marks the record as a development dependency
    pub fn with_dev(mut self, is_dev: bool) -> Self {
        self.is_dev = is_dev;
        self
    }

    /// Marks the record as an optional dependency
    pub fn with_optional(mut self, is_optional: bool) -> Self {
        self.is_optional = is_optional;
        self
    }

    /// Overrides the lockfile path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Returns the dependency type; dev wins over optional
    pub fn dependency_type(&self) -> DependencyType {
        if self.is_dev {
            DependencyType::Development
        } else if self.is_optional {
            DependencyType::Optional
        } else {
            DependencyType::Production
        }
    }
}

impl fmt::Display for DependencyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.dependency_type() {
            DependencyType::Production => "",
            DependencyType::Development => " (dev)",
            DependencyType::Optional => " (optional)",
        };
        write!(f, "{}@{}{}", self.name, self.installed_version, marker)
    }
}

/// Resolves the dependency type of a package by name
pub trait DependencyTypeLookup {
    /// Returns the known type of `package`, or None if unknown
    fn dependency_type(&self, package: &str) -> Option<DependencyType>;

    /// Returns the type of `package`, defaulting to production
    fn dependency_type_or_default(&self, package: &str) -> DependencyType {
        self.dependency_type(package).unwrap_or_default()
    }
}

impl DependencyTypeLookup for [DependencyRecord] {
    fn dependency_type(&self, package: &str) -> Option<DependencyType> {
        self.iter()
            .find(|dep| !dep.is_root && dep.name == package)
            .map(DependencyRecord::dependency_type)
    }
}

impl DependencyTypeLookup for Vec<DependencyRecord> {
    fn dependency_type(&self, package: &str) -> Option<DependencyType> {
        self.as_slice().dependency_type(package)
    }
}

impl DependencyTypeLookup for HashMap<String, DependencyType> {
    fn dependency_type(&self, package: &str) -> Option<DependencyType> {
        self.get(package).copied()
    }
}
