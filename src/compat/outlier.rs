//! Detection of dependencies that narrow the project runtime range
//!
//! Each dependency is removed in turn and the range is resolved again from
//! the remaining constraints. A dependency is an outlier exactly when its
//! removal changes `min` or `max`.

use super::{Constraint, RangeResolver};
use crate::domain::{DependencyRecord, OutlierRecord, ResolvedRange};

/// Finds dependencies whose engine constraint narrows the project range
#[derive(Debug, Clone, Copy)]
pub struct OutlierDetector<'a> {
    resolver: &'a RangeResolver,
}

impl<'a> OutlierDetector<'a> {
    /// Creates a detector resolving ranges with `resolver`
    pub fn new(resolver: &'a RangeResolver) -> Self {
        Self { resolver }
    }

    /// Returns one record per outlier, in input order.
    ///
    /// Root records and dependencies without a valid engine constraint are
    /// skipped. Records are told apart by `path`, so two installed copies of
    /// one package are treated as separate dependencies.
    pub fn detect(
        &self,
        dependencies: &[DependencyRecord],
        project_range: &ResolvedRange,
        root_constraint: Option<&str>,
    ) -> Vec<OutlierRecord> {
        let root = root_constraint.and_then(|raw| Constraint::parse(raw).ok());
        let constrained: Vec<(&DependencyRecord, Constraint)> = dependencies
            .iter()
            .filter(|dep| !dep.is_root)
            .filter_map(|dep| {
                let raw = dep.engine_constraint.as_deref()?;
                Constraint::parse(raw).ok().map(|c| (dep, c))
            })
            .collect();

        let mut outliers = Vec::new();
        for (dep, constraint) in &constrained {
            let others: Vec<Constraint> = root
                .iter()
                .cloned()
                .chain(
                    constrained
                        .iter()
                        .filter(|(other, _)| other.path != dep.path)
                        .map(|(_, c)| c.clone()),
                )
                .collect();

            if others.is_empty() {
                outliers.push(outlier(
                    dep,
                    constraint,
                    "Sole constraint establishing the project's Node.js range; removing it allows any Node.js version.".to_string(),
                    ResolvedRange::empty(),
                ));
                continue;
            }

            let without = self.resolver.resolve_parsed(&others);
            if without.min == project_range.min && without.max == project_range.max {
                continue;
            }

            let impact = describe_impact(project_range, &without);
            tracing::debug!(package = %dep.name, %impact, "engine constraint outlier");
            outliers.push(outlier(dep, constraint, impact, without));
        }
        outliers
    }
}

fn outlier(
    dep: &DependencyRecord,
    constraint: &Constraint,
    impact: String,
    range_without_dependency: ResolvedRange,
) -> OutlierRecord {
    OutlierRecord {
        package_name: dep.name.clone(),
        package_version: dep.installed_version.clone(),
        constraint: constraint.as_str().to_string(),
        impact,
        range_without_dependency,
    }
}

fn describe_impact(project: &ResolvedRange, without: &ResolvedRange) -> String {
    let (project_min, project_max, without_min, without_max) =
        match (&project.min, &project.max, &without.min, &without.max) {
            (Some(pmin), Some(pmax), Some(wmin), Some(wmax)) => (pmin, pmax, wmin, wmax),
            (None, _, Some(_), _) => {
                return format!(
                    "Conflicts with the rest of the project; without it Node.js {} is supported.",
                    without
                )
            }
            _ => return "Removing it leaves no resolvable Node.js range.".to_string(),
        };

    let mut impacts = Vec::new();
    if without_min < project_min {
        impacts.push(format!(
            "Allows older Node.js (min {} vs {}).",
            without_min, project_min
        ));
    }
    if without_max > project_max {
        impacts.push(format!(
            "Allows newer Node.js (max {} vs {}).",
            without_max, project_max
        ));
    }
    if impacts.is_empty() {
        impacts.push(format!("Changes the Node.js range to {}.", without));
    }
    impacts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn dep(name: &str, constraint: Option<&str>) -> DependencyRecord {
        let record = DependencyRecord::new(name, "1.0.0");
        match constraint {
            Some(c) => record.with_engine(c),
            None => record,
        }
    }

    fn example_resolver() -> RangeResolver {
        RangeResolver::with_candidates(
            ["16.0.0", "16.20.2", "18.0.0", "18.9.9", "20.0.0", "22.0.0"]
                .iter()
                .map(|s| v(s)),
        )
    }

    #[test]
    fn test_detects_min_and_max_narrowing() {
        let resolver = example_resolver();
        let root = ">=16.0.0 <=22.0.0";
        let deps = vec![
            dep("caps-max", Some("<=18.9.9")),
            dep("raises-min", Some(">=18.0.0")),
            dep("harmless", Some(">=16.0.0 <=20.0.0")),
        ];
        let range = resolver.resolve(&[root, "<=18.9.9", ">=18.0.0", ">=16.0.0 <=20.0.0"]);
        assert_eq!(range.min, Some(v("18.0.0")));
        assert_eq!(range.max, Some(v("18.9.9")));

        let outliers = OutlierDetector::new(&resolver).detect(&deps, &range, Some(root));
        let names: Vec<&str> = outliers.iter().map(|o| o.package_name.as_str()).collect();
        assert_eq!(names, vec!["caps-max", "raises-min"]);

        assert!(outliers[0].impact.contains("Allows newer Node.js"));
        assert_eq!(outliers[0].range_without_dependency.max, Some(v("20.0.0")));
        assert!(outliers[1].impact.contains("Allows older Node.js"));
        assert_eq!(outliers[1].range_without_dependency.min, Some(v("16.0.0")));
    }

    #[test]
    fn test_same_example_with_default_table() {
        let resolver = RangeResolver::new();
        let root = ">=16.0.0 <=22.0.0";
        let deps = vec![
            dep("caps-max", Some("<=18.9.9")),
            dep("raises-min", Some(">=18.0.0")),
            dep("harmless", Some(">=16.0.0 <=20.0.0")),
        ];
        let range = resolver.resolve(&[root, "<=18.9.9", ">=18.0.0", ">=16.0.0 <=20.0.0"]);
        let outliers = OutlierDetector::new(&resolver).detect(&deps, &range, Some(root));
        assert_eq!(outliers.len(), 2);
        assert!(outliers.iter().all(|o| o.package_name != "harmless"));
    }

    #[test]
    fn test_both_impacts_joined() {
        let resolver = example_resolver();
        let deps = vec![dep("pinned", Some("18.0.0")), dep("wide", Some(">=16.0.0"))];
        let range = resolver.resolve(&["18.0.0", ">=16.0.0"]);
        let outliers = OutlierDetector::new(&resolver).detect(&deps, &range, None);
        assert_eq!(outliers.len(), 1);
        assert!(outliers[0].impact.contains("older"));
        assert!(outliers[0].impact.contains("newer"));
    }

    #[test]
    fn test_sole_constraint_flagged() {
        let resolver = example_resolver();
        let deps = vec![dep("only", Some(">=18.0.0")), dep("none", None)];
        let range = resolver.resolve(&[">=18.0.0"]);
        let outliers = OutlierDetector::new(&resolver).detect(&deps, &range, None);
        assert_eq!(outliers.len(), 1);
        assert!(outliers[0].impact.contains("Sole constraint"));
        assert_eq!(outliers[0].range_without_dependency, ResolvedRange::empty());
    }

    #[test]
    fn test_root_constraint_prevents_sole_flag() {
        let resolver = example_resolver();
        let deps = vec![dep("same", Some(">=18.0.0"))];
        let range = resolver.resolve(&[">=18.0.0", ">=18.0.0"]);
        let outliers = OutlierDetector::new(&resolver).detect(&deps, &range, Some(">=18.0.0"));
        assert!(outliers.is_empty());
    }

    #[test]
    fn test_skips_root_and_unconstrained() {
        let resolver = example_resolver();
        let deps = vec![
            DependencyRecord::root("app", "1.0.0").with_engine("<=16.0.0"),
            dep("no-engine", None),
            dep("broken", Some("not-a-range")),
        ];
        let range = resolver.resolve(&[">=16.0.0"]);
        let outliers = OutlierDetector::new(&resolver).detect(&deps, &range, Some(">=16.0.0"));
        assert!(outliers.is_empty());
    }

    #[test]
    fn test_identity_by_path() {
        let resolver = example_resolver();
        let deps = vec![
            dep("dup", Some("<=18.9.9")),
            dep("dup", Some("<=18.9.9")).with_path("node_modules/x/node_modules/dup"),
        ];
        let range = resolver.resolve(&["<=18.9.9", "<=18.9.9"]);
        let outliers = OutlierDetector::new(&resolver).detect(&deps, &range, None);
        assert!(outliers.is_empty());
    }

    #[test]
    fn test_conflicting_dependency_flagged() {
        let resolver = example_resolver();
        let deps = vec![dep("old", Some("<16.20.0")), dep("new", Some(">=18.0.0"))];
        let range = resolver.resolve(&[">=16.0.0", "<16.20.0", ">=18.0.0"]);
        assert!(range.is_empty());

        let outliers = OutlierDetector::new(&resolver).detect(&deps, &range, Some(">=16.0.0"));
        assert_eq!(outliers.len(), 2);
        assert!(outliers[0].impact.contains("Conflicts"));
    }

    #[test]
    fn test_outlier_iff_removal_changes_range() {
        let resolver = RangeResolver::new();
        let pool = [
            ">=16.0.0",
            "<=20.0.0",
            "^18.0.0 || ^20.0.0",
            ">=18.2.0",
            "<22",
            "~20.9.0",
            ">=18.0.0 <=18.19.1",
            "16.x || 18.x",
        ];
        let root = Some(">=16.0.0 <=22.0.0");

        for a in 0..pool.len() {
            for b in a..pool.len() {
                for c in b..pool.len() {
                    let constraints = [pool[a], pool[b], pool[c]];
                    let deps: Vec<DependencyRecord> = constraints
                        .iter()
                        .enumerate()
                        .map(|(i, c)| dep(&format!("dep{}", i), Some(*c)))
                        .collect();

                    let mut all: Vec<&str> = root.into_iter().collect();
                    all.extend(constraints.iter().copied());
                    let range = resolver.resolve(&all);

                    let outliers = OutlierDetector::new(&resolver).detect(&deps, &range, root);

                    for (i, d) in deps.iter().enumerate() {
                        let mut without: Vec<&str> = root.into_iter().collect();
                        without.extend(
                            constraints
                                .iter()
                                .enumerate()
                                .filter(|(j, _)| *j != i)
                                .map(|(_, c)| *c),
                        );
                        let reference = resolver.resolve(&without);
                        let changed = reference.min != range.min || reference.max != range.max;
                        let flagged = outliers.iter().any(|o| o.package_name == d.name);
                        assert_eq!(changed, flagged, "{:?} dep {}", constraints, i);
                    }
                }
            }
        }
    }
}
