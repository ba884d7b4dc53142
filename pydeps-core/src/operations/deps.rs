use crate::classify::{DependencyBuckets, classify};
use crate::registry::PackageIndex;
use crate::resolve::ResolverSettings;
use crate::{PydepsError, Result};
use pydeps_pep508::{is_valid_name, normalize_name, parse_requirements};
use serde::Serialize;

/// Direct requirements of one release, classified but not followed.
#[derive(Debug, Clone, Serialize)]
pub struct DirectDependencies {
    pub name: String,
    pub version: String,
    pub requires_python: Option<String>,
    pub provides_extra: Vec<String>,
    pub buckets: DependencyBuckets,
    /// Lines that could not be parsed and were left out of `buckets`.
    pub skipped: usize,
}

impl DirectDependencies {
    pub fn total(&self) -> usize {
        self.buckets.runtime.len() + self.buckets.development_count() + self.buckets.extras_count()
    }
}

pub async fn package_dependencies<I: PackageIndex>(
    index: &I,
    settings: &ResolverSettings,
    name: &str,
    version: Option<&str>,
) -> Result<DirectDependencies> {
    let trimmed = name.trim();
    if !is_valid_name(trimmed) {
        return Err(PydepsError::InvalidName {
            name: name.to_string(),
        });
    }

    let metadata = index
        .get_package_metadata(&normalize_name(trimmed), version)
        .await
        .map_err(|err| PydepsError::from_index(trimmed, version, err))?;

    let requirements = parse_requirements(metadata.requires_dist.iter().map(String::as_str));
    let buckets = classify(
        &requirements,
        &metadata.provides_extra,
        settings.dev_groups.as_ref(),
    );

    Ok(DirectDependencies {
        name: metadata.name,
        version: metadata.version,
        requires_python: metadata.requires_python,
        provides_extra: metadata.provides_extra,
        buckets,
        skipped: metadata.requires_dist.len() - requirements.len(),
    })
}
