use directories::ProjectDirs;
use pydeps_pep508::normalize_name;
use std::collections::BTreeSet;
use std::time::Duration;
use std::{env, path::PathBuf};

pub const DEFAULT_INDEX_URL: &str = "https://pypi.org";

#[derive(Debug, Clone)]
pub struct PydepsConfig {
    pub cache_dir: PathBuf,
    pub index_url: String,
    pub cache_ttl: Option<Duration>,
    pub registry_concurrency: usize,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub resolve_timeout: Option<Duration>,
    pub dev_groups: Option<BTreeSet<String>>,
    pub verbose: bool,
}

impl Default for PydepsConfig {
    fn default() -> Self {
        PydepsConfig {
            cache_dir: PathBuf::from(".pydeps").join("cache"),
            index_url: DEFAULT_INDEX_URL.to_string(),
            cache_ttl: Some(Duration::from_secs(3600)),
            registry_concurrency: 8,
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            resolve_timeout: None,
            dev_groups: None,
            verbose: false,
        }
    }
}

impl PydepsConfig {
    pub fn from_env() -> Self {
        let mut config = PydepsConfig::default();

        if let Ok(home) = env::var("PYDEPS_HOME") {
            config.cache_dir = PathBuf::from(home).join("cache");
        } else if let Some(dirs) = ProjectDirs::from("io", "pydeps", "pydeps") {
            config.cache_dir = dirs.cache_dir().to_path_buf();
        }

        if let Ok(value) = env::var("PYDEPS_INDEX_URL") {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                config.index_url = trimmed.trim_end_matches('/').to_string();
            }
        }

        if let Some(secs) = read_u64("PYDEPS_CACHE_TTL_SECS") {
            config.cache_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(parsed) = read_u64("PYDEPS_REGISTRY_CONCURRENCY")
            && parsed > 0
        {
            config.registry_concurrency = parsed as usize;
        }

        if let Some(secs) = read_u64("PYDEPS_REQUEST_TIMEOUT_SECS")
            && secs > 0
        {
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(retries) = read_u64("PYDEPS_MAX_RETRIES") {
            config.max_retries = retries.min(10) as u32;
        }

        if let Some(secs) = read_u64("PYDEPS_RESOLVE_TIMEOUT_SECS")
            && secs > 0
        {
            config.resolve_timeout = Some(Duration::from_secs(secs));
        }

        config.dev_groups = read_dev_groups_from_env();
        config.verbose = env::var("PYDEPS_VERBOSE")
            .map(|value| is_truthy(&value))
            .unwrap_or(false);

        config
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.cache_dir.join("metadata")
    }
}

fn read_u64(key: &str) -> Option<u64> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed.parse::<u64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value = %trimmed, "ignoring non-numeric configuration value");
            None
        }
    }
}

fn read_dev_groups_from_env() -> Option<BTreeSet<String>> {
    parse_dev_groups(&env::var("PYDEPS_DEV_GROUPS").ok()?)
}

fn parse_dev_groups(value: &str) -> Option<BTreeSet<String>> {
    let set: BTreeSet<String> = value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(normalize_name)
        .filter(|name| !name.is_empty())
        .collect();

    if set.is_empty() { None } else { Some(set) }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_values() {
        assert!(is_truthy("1"));
        assert!(is_truthy(" Yes "));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("nope"));
    }

    #[test]
    fn dev_groups_are_normalized() {
        let groups = parse_dev_groups("Type_Check, docs.site ,,");
        let expected: BTreeSet<String> = ["type-check", "docs-site"]
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(groups, Some(expected));
        assert_eq!(parse_dev_groups(" , "), None);
    }

    #[test]
    fn defaults_are_usable() {
        let config = PydepsConfig::default();
        assert_eq!(config.index_url, DEFAULT_INDEX_URL);
        assert!(config.registry_concurrency > 0);
        assert!(config.metadata_dir().ends_with("metadata"));
    }
}
