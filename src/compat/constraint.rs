//! npm-style version range parsing on top of `semver::VersionReq`
//!
//! Supported syntax:
//! - Alternatives separated by `||`
//! - Whitespace-separated comparators (`>=16.0.0 <20`), with or without a
//!   space after the operator (`>= 16`)
//! - Bare versions as exact matches (`18.0.0`), partial versions and
//!   `x`/`*` wildcards as spans (`18`, `18.x`, `18.2.*`)
//! - Hyphen ranges (`16 - 18`)
//! - A leading `v` on versions (`>=v16`)

use crate::error::ConstraintError;
use semver::{BuildMetadata, Comparator, Op, Version, VersionReq};
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;

/// A parsed engine constraint: a union of comparator sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    raw: String,
    sets: Vec<VersionReq>,
}

impl Constraint {
    /// Parses an npm range expression
    pub fn parse(input: &str) -> Result<Self, ConstraintError> {
        let mut sets = Vec::new();
        for part in input.trim().split("||") {
            let normalized =
                normalize_comparator_set(part).map_err(|msg| ConstraintError::new(input, msg))?;
            let req = VersionReq::parse(&normalized)
                .map_err(|e| ConstraintError::new(input, e.to_string()))?;
            sets.push(req);
        }
        Ok(Self {
            raw: input.trim().to_string(),
            sets,
        })
    }

    /// Returns the expression as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if `version` satisfies any comparator set.
    ///
    /// Pre-release versions only match a set that names a pre-release on
    /// the same `major.minor.patch`.
    pub fn matches(&self, version: &Version) -> bool {
        self.sets.iter().any(|req| req.matches(version))
    }

    /// Returns true if some version could satisfy both constraints
    pub fn intersects(&self, other: &Constraint) -> bool {
        let ours = self.intervals();
        let theirs = other.intervals();
        ours.iter()
            .any(|a| theirs.iter().any(|b| !a.intersect(b).is_empty()))
    }

    fn intervals(&self) -> Vec<Interval> {
        self.sets
            .iter()
            .map(Interval::from_req)
            .filter(|i| !i.is_empty())
            .collect()
    }
}

impl FromStr for Constraint {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Constraint::parse(s)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Returns true if both expressions parse and overlap
pub fn intersects(a: &str, b: &str) -> bool {
    match (Constraint::parse(a), Constraint::parse(b)) {
        (Ok(a), Ok(b)) => a.intersects(&b),
        _ => false,
    }
}

/// Rewrites one `||` branch into the comma-separated form `VersionReq` reads
fn normalize_comparator_set(part: &str) -> Result<String, String> {
    let tokens: Vec<&str> = part.split_whitespace().collect();

    if tokens.len() == 3 && tokens[1] == "-" {
        let mut comparators = vec![
            normalize_comparator(">=", tokens[0])?,
            normalize_comparator("<=", tokens[2])?,
        ];
        comparators.retain(|c| c != "*");
        return Ok(join_comparators(comparators));
    }

    let mut comparators = Vec::new();
    let mut pending_op: Option<&str> = None;

    for token in tokens {
        let (op, version) = split_operator(token);
        if version.is_empty() {
            if pending_op.is_some() || op.is_empty() {
                return Err(format!("unexpected token '{}'", token));
            }
            pending_op = Some(op);
            continue;
        }
        let op = match pending_op.take() {
            Some(pending) if op.is_empty() => pending,
            Some(_) => return Err(format!("unexpected token '{}'", token)),
            None => op,
        };
        comparators.push(normalize_comparator(op, version)?);
    }

    if let Some(op) = pending_op {
        return Err(format!("operator '{}' without a version", op));
    }

    if comparators.len() > 1 {
        comparators.retain(|c| c != "*");
    }
    Ok(join_comparators(comparators))
}

fn join_comparators(comparators: Vec<String>) -> String {
    if comparators.is_empty() {
        "*".to_string()
    } else {
        comparators.join(", ")
    }
}

fn split_operator(token: &str) -> (&str, &str) {
    let end = token
        .find(|c: char| !matches!(c, '<' | '>' | '=' | '~' | '^'))
        .unwrap_or(token.len());
    token.split_at(end)
}

fn normalize_comparator(op: &str, version: &str) -> Result<String, String> {
    let op = match op {
        "~>" => "~",
        "" | "=" => "=",
        ">=" | "<=" | ">" | "<" | "~" | "^" => op,
        _ => return Err(format!("unknown operator '{}'", op)),
    };

    let version = version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version);
    let version = strip_wildcards(version);

    if version.is_empty() {
        return Ok("*".to_string());
    }
    Ok(format!("{}{}", op, version))
}

/// Truncates a version at its first `x`/`X`/`*` component: `18.x.x` -> `18`
fn strip_wildcards(version: &str) -> &str {
    let mut end = 0;
    for component in version.split('.') {
        if matches!(component, "x" | "X" | "*") {
            return version[..end].trim_end_matches('.');
        }
        end += component.len() + 1;
    }
    version
}

/// Set of versions covered by one comparator set, as a single interval
#[derive(Debug, Clone)]
struct Interval {
    lower: Bound<Version>,
    upper: Bound<Version>,
}

impl Interval {
    fn unbounded() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    fn from_req(req: &VersionReq) -> Self {
        req.comparators
            .iter()
            .map(comparator_interval)
            .fold(Self::unbounded(), |acc, next| acc.intersect(&next))
    }

    fn intersect(&self, other: &Interval) -> Interval {
        Interval {
            lower: tighter_lower(&self.lower, &other.lower),
            upper: tighter_upper(&self.upper, &other.upper),
        }
    }

    fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Included(l), Bound::Included(u)) => l > u,
            (Bound::Included(l) | Bound::Excluded(l), Bound::Included(u) | Bound::Excluded(u)) => {
                l >= u
            }
            _ => false,
        }
    }
}

fn tighter_lower(a: &Bound<Version>, b: &Bound<Version>) -> Bound<Version> {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other.clone(),
        (Bound::Included(x), Bound::Included(y)) => Bound::Included(x.max(y).clone()),
        (Bound::Excluded(x), Bound::Excluded(y)) => Bound::Excluded(x.max(y).clone()),
        (Bound::Included(inc), Bound::Excluded(exc))
        | (Bound::Excluded(exc), Bound::Included(inc)) => {
            if inc > exc {
                Bound::Included(inc.clone())
            } else {
                Bound::Excluded(exc.clone())
            }
        }
    }
}

fn tighter_upper(a: &Bound<Version>, b: &Bound<Version>) -> Bound<Version> {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other.clone(),
        (Bound::Included(x), Bound::Included(y)) => Bound::Included(x.min(y).clone()),
        (Bound::Excluded(x), Bound::Excluded(y)) => Bound::Excluded(x.min(y).clone()),
        (Bound::Included(inc), Bound::Excluded(exc))
        | (Bound::Excluded(exc), Bound::Included(inc)) => {
            if inc < exc {
                Bound::Included(inc.clone())
            } else {
                Bound::Excluded(exc.clone())
            }
        }
    }
}

fn comparator_interval(c: &Comparator) -> Interval {
    let floor = Version {
        major: c.major,
        minor: c.minor.unwrap_or(0),
        patch: c.patch.unwrap_or(0),
        pre: c.pre.clone(),
        build: BuildMetadata::EMPTY,
    };
    let full = c.minor.is_some() && c.patch.is_some();
    // first version past the stated precision: 18 -> 19.0.0, 18.2 -> 18.3.0
    let past_partial = match c.minor {
        None => Version::new(c.major.saturating_add(1), 0, 0),
        Some(minor) => Version::new(c.major, minor.saturating_add(1), 0),
    };

    let (lower, upper) = match c.op {
        Op::Exact | Op::Wildcard if full => (Bound::Included(floor.clone()), Bound::Included(floor)),
        Op::Exact | Op::Wildcard => (Bound::Included(floor), Bound::Excluded(past_partial)),
        Op::Greater if full => (Bound::Excluded(floor), Bound::Unbounded),
        Op::Greater => (Bound::Included(past_partial), Bound::Unbounded),
        Op::GreaterEq => (Bound::Included(floor), Bound::Unbounded),
        Op::Less => (Bound::Unbounded, Bound::Excluded(floor)),
        Op::LessEq if full => (Bound::Unbounded, Bound::Included(floor)),
        Op::LessEq => (Bound::Unbounded, Bound::Excluded(past_partial)),
        Op::Tilde => (Bound::Included(floor), Bound::Excluded(past_partial)),
        Op::Caret => (Bound::Included(floor), Bound::Excluded(caret_ceiling(c))),
        _ => (Bound::Unbounded, Bound::Unbounded),
    };
    Interval { lower, upper }
}

/// Exclusive upper bound of a caret comparator, following the 0.x rules
fn caret_ceiling(c: &Comparator) -> Version {
    match (c.major, c.minor, c.patch) {
        (0, Some(0), Some(patch)) => Version::new(0, 0, patch.saturating_add(1)),
        (0, Some(minor), _) => Version::new(0, minor.saturating_add(1), 0),
        (major, _, _) => Version::new(major.saturating_add(1), 0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn c(s: &str) -> Constraint {
        Constraint::parse(s).unwrap()
    }

    #[test]
    fn test_parse_space_separated_range() {
        let constraint = c(">=16.0.0 <=18.9.9");
        assert!(constraint.matches(&v("16.0.0")));
        assert!(constraint.matches(&v("18.9.9")));
        assert!(!constraint.matches(&v("18.10.0")));
        assert!(!constraint.matches(&v("14.21.3")));
    }

    #[test]
    fn test_bare_version_is_exact() {
        let constraint = c("18.0.0");
        assert!(constraint.matches(&v("18.0.0")));
        assert!(!constraint.matches(&v("18.1.0")));
    }

    #[test]
    fn test_partial_and_wildcard_versions() {
        assert!(c("18").matches(&v("18.19.1")));
        assert!(!c("18").matches(&v("19.0.0")));
        assert!(c("18.x").matches(&v("18.4.0")));
        assert!(c("18.2.*").matches(&v("18.2.7")));
        assert!(!c("18.2.*").matches(&v("18.3.0")));
        assert!(c("^18.x").matches(&v("18.9.0")));
    }

    #[test]
    fn test_or_ranges() {
        let constraint = c("16.x || 18.x");
        assert!(constraint.matches(&v("16.3.0")));
        assert!(constraint.matches(&v("18.0.0")));
        assert!(!constraint.matches(&v("17.0.0")));
    }

    #[test]
    fn test_operator_with_space() {
        assert!(c(">= 16").matches(&v("16.0.0")));
        assert!(c(">= 16 < 20").matches(&v("19.9.0")));
        assert!(!c(">= 16 < 20").matches(&v("20.0.0")));
    }

    #[test]
    fn test_leading_v() {
        assert!(c("v18.0.0").matches(&v("18.0.0")));
        assert!(c(">=v16").matches(&v("20.0.0")));
    }

    #[test]
    fn test_hyphen_range() {
        let constraint = c("16 - 18");
        assert!(constraint.matches(&v("16.0.0")));
        assert!(constraint.matches(&v("18.4.0")));
        assert!(!constraint.matches(&v("19.0.0")));
    }

    #[test]
    fn test_empty_and_star_match_anything() {
        assert!(c("").matches(&v("22.0.0")));
        assert!(c("*").matches(&v("4.0.0")));
        assert!(c("x").matches(&v("4.0.0")));
    }

    #[test]
    fn test_invalid_constraints() {
        assert!(Constraint::parse("latest").is_err());
        assert!(Constraint::parse(">=").is_err());
        assert!(Constraint::parse("not a range").is_err());
        assert!(Constraint::parse("=> 16").is_err());
    }

    #[test]
    fn test_prerelease_matching() {
        assert!(c(">=20.0.0-rc.1").matches(&v("20.0.0-rc.2")));
        assert!(!c(">=18.0.0").matches(&v("20.0.0-rc.1")));
    }

    #[test]
    fn test_intersects() {
        assert!(intersects(">=16.0.0 <=18.9.9", "^18.0.0"));
        assert!(!intersects("<16.0.0", ">18.0.0"));
        assert!(intersects("18.0.0", ">=18.0.0 <=18.0.0"));
        assert!(intersects("<=18", ">=18.5.0"));
        assert!(!intersects(">18", "<19.0.0"));
        assert!(!intersects("^0.2.3", ">=0.3.0"));
        assert!(intersects("^0.0.3", "0.0.3"));
        assert!(!intersects("^0.0.3", "0.0.4"));
    }

    #[test]
    fn test_intersects_with_or_branches() {
        assert!(intersects("14.x || 20.x", ">=18.0.0 <=20.11.0"));
        assert!(!intersects("14.x || 22.x", ">=18.0.0 <=20.11.0"));
    }

    #[test]
    fn test_intersects_invalid_is_false() {
        assert!(!intersects("latest", ">=18"));
    }

    #[test]
    fn test_display_keeps_input() {
        assert_eq!(format!("{}", c(" >=18 ")), ">=18");
    }
}
