pub mod deps;
pub mod resolve;

use anyhow::Result;
use pydeps_core::{MetadataCache, PydepsConfig, PypiClient};
use std::sync::Arc;

pub(crate) fn index_client(config: &PydepsConfig) -> Result<PypiClient> {
    let cache = MetadataCache::from_config(config).map(Arc::new);

    match &cache {
        Some(cache) => tracing::debug!(
            dir = %config.metadata_dir().display(),
            ttl_secs = cache.ttl().as_secs(),
            "metadata cache enabled"
        ),
        None => tracing::debug!("metadata cache disabled"),
    }

    Ok(PypiClient::new(config, cache)?)
}
