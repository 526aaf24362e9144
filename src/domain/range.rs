//! Resolved runtime version range

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Intersection of all engine constraints of a project.
///
/// `min` and `max` are both set or both `None`. `None` means no candidate
/// runtime satisfies every constraint (or there were no constraints at all).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    /// Lowest satisfying runtime version
    pub min: Option<Version>,
    /// Highest satisfying runtime version
    pub max: Option<Version>,
    /// Canonical expression, `"min"` or `">=min <=max"`
    pub range_expression: Option<String>,
}

impl ResolvedRange {
    /// Creates the empty range
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a range spanning `min..=max`
    pub fn between(min: Version, max: Version) -> Self {
        let range_expression = if min == max {
            min.to_string()
        } else {
            format!(">={} <={}", min, max)
        };
        Self {
            min: Some(min),
            max: Some(max),
            range_expression: Some(range_expression),
        }
    }

    /// Returns true if no runtime version satisfies the range
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
    }

    /// Returns true if `version` lies within `min..=max`
    pub fn contains(&self, version: &Version) -> bool {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => version >= min && version <= max,
            (Some(min), None) => version >= min,
            _ => false,
        }
    }

    /// Returns the range expression, if any
    pub fn expression(&self) -> Option<&str> {
        self.range_expression.as_deref()
    }
}

impl fmt::Display for ResolvedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.range_expression {
            Some(expr) => write!(f, "{}", expr),
            None => write!(f, "none"),
        }
    }
}
