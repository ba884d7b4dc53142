use pydeps_pep508::{Requirement, normalize_name};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Conventional names of optional groups that carry tooling rather than features.
pub const DEFAULT_DEV_GROUPS: &[&str] = &[
    "dev",
    "development",
    "test",
    "testing",
    "tests",
    "lint",
    "linting",
    "doc",
    "docs",
    "documentation",
    "build",
    "check",
    "cover",
    "coverage",
    "type",
    "typing",
    "mypy",
    "style",
    "format",
    "quality",
];

/// Decides whether an optional group is a development group.
///
/// This is a naming heuristic: a group called `test-extra` or `docs-theme`
/// may well be either. Deployments that know better plug in their own.
pub trait DevGroupPredicate: Send + Sync {
    fn is_development(&self, group: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDevGroups;

impl DevGroupPredicate for DefaultDevGroups {
    fn is_development(&self, group: &str) -> bool {
        let lowered = group.to_ascii_lowercase();
        DEFAULT_DEV_GROUPS.contains(&lowered.as_str())
    }
}

/// Allow-list supplied by configuration. Entries and queried groups are
/// compared by normalized name, so `Type_Check` matches `type-check`.
#[derive(Debug, Clone)]
pub struct AllowList {
    names: BTreeSet<String>,
}

impl AllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        AllowList {
            names: names
                .into_iter()
                .map(|n| normalize_name(n.as_ref()))
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }
}

impl DevGroupPredicate for AllowList {
    fn is_development(&self, group: &str) -> bool {
        self.names.contains(&normalize_name(group))
    }
}

impl<F> DevGroupPredicate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_development(&self, group: &str) -> bool {
        self(group)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyBuckets {
    pub runtime: Vec<Requirement>,
    pub development: BTreeMap<String, Vec<Requirement>>,
    pub extras: BTreeMap<String, Vec<Requirement>>,
}

impl DependencyBuckets {
    pub fn development_count(&self) -> usize {
        self.development.values().map(Vec::len).sum()
    }

    pub fn extras_count(&self) -> usize {
        self.extras.values().map(Vec::len).sum()
    }

    pub fn development_groups(&self) -> impl Iterator<Item = &str> {
        self.development.keys().map(String::as_str)
    }
}

/// Splits a package's requirements into runtime, development and extras groups.
///
/// Declared optional-feature names without any requirement still appear as
/// empty groups so callers can list what a package offers.
pub fn classify(
    requirements: &[Requirement],
    provides_extra: &[String],
    predicate: &dyn DevGroupPredicate,
) -> DependencyBuckets {
    let mut buckets = DependencyBuckets::default();

    for declared in provides_extra {
        let group = normalize_name(declared);
        if group.is_empty() {
            continue;
        }
        group_for(&mut buckets, &group, predicate);
    }

    for req in requirements {
        match &req.extra_qualifier {
            None => buckets.runtime.push(req.clone()),
            Some(group) => group_for(&mut buckets, group, predicate).push(req.clone()),
        }
    }

    buckets
}

fn group_for<'a>(
    buckets: &'a mut DependencyBuckets,
    group: &str,
    predicate: &dyn DevGroupPredicate,
) -> &'a mut Vec<Requirement> {
    let target = if predicate.is_development(group) {
        &mut buckets.development
    } else {
        &mut buckets.extras
    };

    target.entry(group.to_string()).or_default()
}
