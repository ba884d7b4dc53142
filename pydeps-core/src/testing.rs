use crate::registry::{IndexError, PackageIndex, PackageMetadata};
use async_trait::async_trait;
use parking_lot::Mutex;
use pydeps_pep508::normalize_name;
use std::collections::BTreeMap;
use std::time::Duration;

/// In-memory package index with scripted failures and delays.
#[derive(Default)]
pub(crate) struct MemoryIndex {
    releases: BTreeMap<String, Vec<PackageMetadata>>,
    failures: BTreeMap<String, IndexError>,
    delays: BTreeMap<String, Duration>,
    calls: Mutex<BTreeMap<String, usize>>,
}

impl MemoryIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a release. The last release added for a name is its latest.
    pub(crate) fn package(self, name: &str, version: &str, requires: &[&str]) -> Self {
        self.release(meta(name, version, requires, &[]))
    }

    pub(crate) fn release(mut self, metadata: PackageMetadata) -> Self {
        self.releases
            .entry(normalize_name(&metadata.name))
            .or_default()
            .push(metadata);
        self
    }

    pub(crate) fn failing(mut self, name: &str, err: IndexError) -> Self {
        self.failures.insert(normalize_name(name), err);
        self
    }

    pub(crate) fn delayed(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(normalize_name(name), delay);
        self
    }

    pub(crate) fn calls(&self, name: &str) -> usize {
        self.calls
            .lock()
            .get(&normalize_name(name))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

#[async_trait]
impl PackageIndex for MemoryIndex {
    async fn get_package_metadata(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<PackageMetadata, IndexError> {
        if !pydeps_pep508::is_valid_name(name.trim()) {
            return Err(IndexError::InvalidName);
        }

        let key = normalize_name(name);
        *self.calls.lock().entry(key.clone()).or_insert(0) += 1;

        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }

        if let Some(err) = self.failures.get(&key) {
            return Err(err.clone());
        }

        let releases = self.releases.get(&key).ok_or(IndexError::NotFound)?;
        let found = match version {
            Some(version) => releases.iter().find(|meta| meta.version == version),
            None => releases.last(),
        };

        found.cloned().ok_or(IndexError::NotFound)
    }
}

pub(crate) fn meta(
    name: &str,
    version: &str,
    requires: &[&str],
    extras: &[&str],
) -> PackageMetadata {
    PackageMetadata {
        name: name.to_string(),
        version: version.to_string(),
        requires_dist: requires.iter().map(|r| r.to_string()).collect(),
        provides_extra: extras.iter().map(|e| e.to_string()).collect(),
        requires_python: None,
    }
}

/// `requests` with four unconditional dependencies and a `security` extra.
pub(crate) fn requests_index() -> MemoryIndex {
    MemoryIndex::new()
        .release(PackageMetadata {
            requires_python: Some(">=3.7".to_string()),
            ..meta(
                "requests",
                "2.31.0",
                &[
                    "charset-normalizer<4,>=2",
                    "idna<4,>=2.5",
                    "urllib3<3,>=1.21.1",
                    "certifi>=2017.4.17",
                    "pyOpenSSL>=0.14; extra == \"security\"",
                    "cryptography>=1.3.4; extra == \"security\"",
                    "PySocks!=1.5.7,>=1.5.6; extra == \"socks\"",
                ],
                &["security", "socks"],
            )
        })
        .package("charset-normalizer", "3.3.2", &[])
        .package("idna", "3.6", &[])
        .package("urllib3", "2.1.0", &[])
        .package("certifi", "2023.11.17", &[])
        .package("pyOpenSSL", "23.3.0", &[])
        .package("cryptography", "41.0.7", &[])
        .package("PySocks", "1.7.1", &[])
}
