//! Runtime range resolution by sampling a candidate release table
//!
//! The resolved range is the lowest and highest candidate that satisfies
//! every valid constraint. Sampling only real release numbers keeps the
//! answer to versions that can actually be installed.

use super::Constraint;
use crate::domain::ResolvedRange;
use semver::Version;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Revision of the built-in candidate table; bump on any table change
pub const CANDIDATE_TABLE_REVISION: u32 = 2;

/// Long-term-support releases always present in the candidate table
pub const KNOWN_LTS_RELEASES: &[&str] = &[
    "16.20.2", "18.18.0", "18.19.1", "20.9.0", "20.10.0", "20.11.0", "22.0.0", "22.11.0",
    "24.11.0",
];

/// Majors for which `major.minor.0` candidates are synthesized
pub const CANDIDATE_MAJORS: RangeInclusive<u64> = 16..=24;

/// Minors `0..SYNTHESIZED_MINORS` are synthesized for each major
const SYNTHESIZED_MINORS: u64 = 5;

/// Returns the built-in candidate table, ascending
pub fn default_candidates() -> Vec<Version> {
    let mut versions: BTreeSet<Version> = KNOWN_LTS_RELEASES
        .iter()
        .filter_map(|v| Version::parse(v).ok())
        .collect();
    for major in CANDIDATE_MAJORS {
        for minor in 0..SYNTHESIZED_MINORS {
            versions.insert(Version::new(major, minor, 0));
        }
    }
    versions.into_iter().collect()
}

/// Intersects engine constraints over a fixed candidate set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeResolver {
    candidates: Vec<Version>,
}

impl Default for RangeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeResolver {
    /// Creates a resolver over the built-in candidate table
    pub fn new() -> Self {
        Self {
            candidates: default_candidates(),
        }
    }

    /// Creates a resolver over a custom candidate set
    pub fn with_candidates(candidates: impl IntoIterator<Item = Version>) -> Self {
        let set: BTreeSet<Version> = candidates.into_iter().collect();
        Self {
            candidates: set.into_iter().collect(),
        }
    }

    /// Returns the candidate set, ascending
    pub fn candidates(&self) -> &[Version] {
        &self.candidates
    }

    /// Parses `constraints`, dropping the ones that are not valid ranges
    pub fn valid_constraints<S: AsRef<str>>(constraints: &[S]) -> Vec<Constraint> {
        constraints
            .iter()
            .filter_map(|raw| match Constraint::parse(raw.as_ref()) {
                Ok(constraint) => Some(constraint),
                Err(e) => {
                    tracing::debug!(error = %e, "ignoring engine constraint");
                    None
                }
            })
            .collect()
    }

    /// Resolves the intersection of `constraints`.
    ///
    /// Invalid entries are ignored. Returns the empty range when no valid
    /// constraint is given or when no candidate satisfies all of them.
    pub fn resolve<S: AsRef<str>>(&self, constraints: &[S]) -> ResolvedRange {
        self.resolve_parsed(&Self::valid_constraints(constraints))
    }

    /// Resolves already-parsed constraints
    pub fn resolve_parsed(&self, constraints: &[Constraint]) -> ResolvedRange {
        if constraints.is_empty() {
            return ResolvedRange::empty();
        }

        let mut satisfying = self
            .candidates
            .iter()
            .filter(|candidate| constraints.iter().all(|c| c.matches(candidate)));

        let Some(min) = satisfying.next() else {
            return ResolvedRange::empty();
        };
        let max = satisfying.last().unwrap_or(min);
        ResolvedRange::between(min.clone(), max.clone())
    }

    /// Candidates newer than `current` that lie inside `range`
    pub fn upgrade_options(&self, current: &Version, range: &ResolvedRange) -> Vec<Version> {
        upgrade_options(&self.candidates, current, range)
    }
}

/// Versions from `candidates` newer than `current` and inside `range`, ascending
pub fn upgrade_options(
    candidates: &[Version],
    current: &Version,
    range: &ResolvedRange,
) -> Vec<Version> {
    if range.min.is_none() {
        return Vec::new();
    }
    let mut options: Vec<Version> = candidates
        .iter()
        .filter(|v| *v > current && range.contains(v))
        .cloned()
        .collect();
    options.sort();
    options
}
