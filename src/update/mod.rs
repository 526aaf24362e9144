//! Health classification of installed dependencies
//!
//! This module provides:
//! - Tier assignment from the version gap between installed and latest
//! - Escalation by release recency and by engine incompatibility
//! - The list of newer versions compatible with the project runtime range

use crate::compat::Constraint;
use crate::domain::{
    AlternativeSuggestion, DependencyRecord, DependencyUpdateInfo, HealthTier, RegistryInfo,
    ResolvedRange,
};
use chrono::{DateTime, Duration, Utc};
use semver::Version;

/// Release gap after which the tier is raised one step
const ESCALATE_AFTER_DAYS: i64 = 6 * 30;
/// Release gap after which the tier is forced to red
const FORCE_RED_AFTER_DAYS: i64 = 12 * 30;

/// Scores one dependency against registry data and the project range
#[derive(Debug, Clone)]
pub struct HealthClassifier {
    escalate_after: Duration,
    force_red_after: Duration,
}

impl Default for HealthClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthClassifier {
    /// Creates a classifier with the default recency thresholds
    pub fn new() -> Self {
        Self {
            escalate_after: Duration::days(ESCALATE_AFTER_DAYS),
            force_red_after: Duration::days(FORCE_RED_AFTER_DAYS),
        }
    }

    /// Creates a classifier with custom recency thresholds (for testing)
    pub fn with_thresholds(escalate_after: Duration, force_red_after: Duration) -> Self {
        Self {
            escalate_after,
            force_red_after,
        }
    }

    /// Classify `dependency`.
    ///
    /// Never fails: missing registry data yields `HealthTier::Unknown` with a
    /// note. `alternatives` are copied into the result unchanged.
    pub fn classify(
        &self,
        dependency: &DependencyRecord,
        project_range: &ResolvedRange,
        registry: &RegistryInfo,
        alternatives: Vec<AlternativeSuggestion>,
    ) -> DependencyUpdateInfo {
        let mut info = DependencyUpdateInfo::new(&dependency.name, &dependency.installed_version);
        info.alternatives = alternatives;

        if dependency.is_root || dependency.name.trim().is_empty() {
            info.push_note("Dependency data incomplete; not classified.");
            return info;
        }

        let project = project_range
            .expression()
            .and_then(|expr| Constraint::parse(expr).ok());
        let own = dependency
            .engine_constraint
            .as_deref()
            .and_then(|raw| Constraint::parse(raw).ok());
        let installed = parse_installed(&dependency.installed_version);

        if registry.is_unknown() {
            let reason = registry
                .error
                .clone()
                .unwrap_or_else(|| "no versions published".to_string());
            info.push_note(format!(
                "No registry information for {}: {}.",
                dependency.name, reason
            ));
        } else {
            let latest = registry.latest_version().cloned();
            info.released_latest = latest.as_ref().and_then(|v| registry.released_at(v));
            info.released_installed = installed.as_ref().and_then(|v| registry.released_at(v));

            if let (Some(project), Some(installed)) = (&project, &installed) {
                info.available_updates =
                    compatible_updates(registry, installed, project, own.as_ref());
            }

            info.health = match (&installed, &latest) {
                (None, _) => {
                    info.push_note(format!(
                        "Installed version '{}' is not valid semver.",
                        dependency.installed_version
                    ));
                    HealthTier::Red
                }
                (Some(installed), Some(latest)) => self.tier(
                    installed,
                    latest,
                    info.released_installed,
                    info.released_latest,
                ),
                (Some(_), None) => HealthTier::Unknown,
            };
            info.latest_version = latest;
        }

        if let (Some(own), Some(project)) = (&own, &project) {
            if !own.intersects(project) {
                info.push_note(format!(
                    "Installed version's Node.js requirement ({}) does not fit the project range ({}).",
                    own, project_range
                ));
                info.health = info.health.at_least(HealthTier::Orange);
            }
        }

        tracing::debug!(package = %dependency.name, health = %info.health, "classified");
        info
    }

    fn tier(
        &self,
        installed: &Version,
        latest: &Version,
        released_installed: Option<DateTime<Utc>>,
        released_latest: Option<DateTime<Utc>>,
    ) -> HealthTier {
        if installed >= latest {
            return HealthTier::Green;
        }

        let mut tier = if installed.major != latest.major {
            HealthTier::Red
        } else if installed.minor != latest.minor {
            HealthTier::Orange
        } else {
            HealthTier::Yellow
        };

        if let (Some(installed_at), Some(latest_at)) = (released_installed, released_latest) {
            let gap = latest_at - installed_at;
            if gap > self.force_red_after {
                tier = HealthTier::Red;
            } else if gap > self.escalate_after {
                tier = tier.escalate();
            }
        }
        tier
    }
}

fn parse_installed(raw: &str) -> Option<Version> {
    let trimmed = raw.trim();
    Version::parse(trimmed.strip_prefix('v').unwrap_or(trimmed)).ok()
}

/// Newer versions whose engine constraint (or, when silent, the installed
/// one) intersects the project range; highest first
fn compatible_updates(
    registry: &RegistryInfo,
    installed: &Version,
    project: &Constraint,
    own: Option<&Constraint>,
) -> Vec<Version> {
    let inherited = own.map_or(true, |c| c.intersects(project));
    registry
        .versions
        .iter()
        .rev()
        .filter(|(version, _)| *version > installed)
        .filter(|(_, meta)| {
            match meta
                .engine_constraint
                .as_deref()
                .and_then(|raw| Constraint::parse(raw).ok())
            {
                Some(constraint) => constraint.intersects(project),
                None => inherited,
            }
        })
        .map(|(version, _)| version.clone())
        .collect()
}
