//! Outlier records

use super::ResolvedRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dependency whose engine constraint narrows the project range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlierRecord {
    /// Package name
    pub package_name: String,
    /// Installed version
    pub package_version: String,
    /// The narrowing `engines.node` constraint
    pub constraint: String,
    /// Human-readable description of how the range is narrowed
    pub impact: String,
    /// What the project range would be without this dependency
    pub range_without_dependency: ResolvedRange,
}

impl fmt::Display for OutlierRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} (node {}): {}",
            self.package_name, self.package_version, self.constraint, self.impact
        )
    }
}
