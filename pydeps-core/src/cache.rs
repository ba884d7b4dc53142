use crate::registry::PackageMetadata;
use crate::{PydepsConfig, PydepsError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const LATEST: &str = "latest";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub name: String,
    pub version: String,
}

impl CacheKey {
    pub fn new(name: &str, version: Option<&str>) -> Self {
        CacheKey {
            name: pydeps_pep508::normalize_name(name),
            version: version.unwrap_or(LATEST).to_string(),
        }
    }
}

#[derive(Clone, Debug)]
struct CacheEntry {
    stored: Instant,
    metadata: PackageMetadata,
}

/// Metadata cache keyed by `(name, version | "latest")` with a fixed TTL.
///
/// Entries live in memory and, when a directory is configured, are mirrored
/// to JSON files so later processes can reuse them while still fresh.
#[derive(Debug)]
pub struct MetadataCache {
    ttl: Duration,
    dir: Option<PathBuf>,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl MetadataCache {
    pub fn in_memory(ttl: Duration) -> Self {
        MetadataCache {
            ttl,
            dir: None,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_dir(ttl: Duration, dir: PathBuf) -> Self {
        MetadataCache {
            ttl,
            dir: Some(dir),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// `None` when caching is disabled by a zero TTL.
    pub fn from_config(config: &PydepsConfig) -> Option<Self> {
        let ttl = config.cache_ttl?;
        Some(MetadataCache::with_dir(ttl, config.metadata_dir()))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &CacheKey) -> Option<PackageMetadata> {
        {
            let mut entries = self.entries.lock();
            if let Some(entry) = entries.get(key) {
                if entry.stored.elapsed() < self.ttl {
                    tracing::debug!(name = %key.name, version = %key.version, "metadata cache hit");
                    return Some(entry.metadata.clone());
                }
                entries.remove(key);
            }
        }

        let path = self.entry_path(key)?;
        if !is_fresh(&path, self.ttl) {
            return None;
        }

        match read_entry(&path) {
            Ok(metadata) => {
                tracing::debug!(
                    name = %key.name,
                    version = %key.version,
                    path = %path.display(),
                    "using cached metadata from disk"
                );
                self.entries.lock().insert(
                    key.clone(),
                    CacheEntry {
                        stored: Instant::now(),
                        metadata: metadata.clone(),
                    },
                );
                Some(metadata)
            }
            Err(err) => {
                tracing::debug!(error = %err, "ignoring unreadable metadata cache entry");
                None
            }
        }
    }

    pub fn put(&self, key: CacheKey, metadata: &PackageMetadata) {
        if let Some(path) = self.entry_path(&key)
            && let Err(err) = write_entry(&path, metadata)
        {
            tracing::debug!(error = %err, "failed to persist metadata cache entry");
        }

        self.entries.lock().insert(
            key,
            CacheEntry {
                stored: Instant::now(),
                metadata: metadata.clone(),
            },
        );
    }

    fn entry_path(&self, key: &CacheKey) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        Some(
            dir.join(sanitize(&key.name))
                .join(format!("{}.json", sanitize(&key.version))),
        )
    }
}

fn read_entry(path: &Path) -> Result<PackageMetadata> {
    let data = fs::read_to_string(path).map_err(|source| PydepsError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&data).map_err(|source| PydepsError::ParseJson {
        path: path.to_path_buf(),
        source,
    })
}

fn write_entry(path: &Path, metadata: &PackageMetadata) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| PydepsError::WriteFile {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(metadata).map_err(|source| PydepsError::ParseJson {
        path: path.to_path_buf(),
        source,
    })?;

    fs::write(path, json).map_err(|source| PydepsError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

fn is_fresh(path: &Path, ttl: Duration) -> bool {
    if let Ok(metadata) = fs::metadata(path)
        && let Ok(modified) = metadata.modified()
        && let Ok(elapsed) = modified.elapsed()
    {
        return elapsed < ttl;
    }

    false
}

fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_') { c } else { '_' })
        .collect()
}
