use super::types::PypiProject;
use super::{IndexError, PackageIndex, PackageMetadata};
use crate::cache::{CacheKey, MetadataCache};
use crate::{PydepsConfig, PydepsError, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Package index backed by the PyPI JSON API.
#[derive(Debug, Clone)]
pub struct PypiClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    cache: Option<Arc<MetadataCache>>,
}

impl PypiClient {
    pub fn new(config: &PydepsConfig, cache: Option<Arc<MetadataCache>>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("pydeps/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| PydepsError::Http {
                url: config.index_url.clone(),
                source,
            })?;

        Ok(PypiClient {
            client,
            base_url: config.index_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            cache,
        })
    }

    pub fn metadata_url(&self, name: &str, version: Option<&str>) -> String {
        let name = pydeps_pep508::normalize_name(name);
        match version {
            Some(version) => format!(
                "{}/pypi/{}/{}/json",
                self.base_url,
                name,
                urlencoding::encode(version)
            ),
            None => format!("{}/pypi/{}/json", self.base_url, name),
        }
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<PackageMetadata, Attempt> {
        let started = Instant::now();

        let response = self
            .client
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|err| Attempt::Retry(err.to_string()))?;

        let status = response.status();
        tracing::debug!(
            url,
            status = status.as_u16(),
            elapsed = started.elapsed().as_secs_f64(),
            "index response"
        );

        if status == StatusCode::NOT_FOUND {
            return Err(Attempt::Fatal(IndexError::NotFound));
        }

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Attempt::Retry(format!("index returned {}", status)));
        }

        if !status.is_success() {
            return Err(Attempt::Fatal(IndexError::Network(format!(
                "index returned {}",
                status
            ))));
        }

        let project = response
            .json::<PypiProject>()
            .await
            .map_err(|err| Attempt::Fatal(IndexError::Network(err.to_string())))?;

        PackageMetadata::try_from(project.info).map_err(Attempt::Fatal)
    }
}

enum Attempt {
    Retry(String),
    Fatal(IndexError),
}

#[async_trait]
impl PackageIndex for PypiClient {
    async fn get_package_metadata(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> std::result::Result<PackageMetadata, IndexError> {
        let name = name.trim();
        if !pydeps_pep508::is_valid_name(name) {
            return Err(IndexError::InvalidName);
        }

        let key = CacheKey::new(name, version);
        if let Some(cached) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
            return Ok(cached);
        }

        let url = self.metadata_url(name, version);
        let mut attempt = 0;

        loop {
            tracing::debug!(url = %url, attempt, "index request");

            match self.fetch_once(&url).await {
                Ok(metadata) => {
                    if let Some(cache) = &self.cache {
                        cache.put(key, &metadata);
                    }
                    return Ok(metadata);
                }
                Err(Attempt::Fatal(err)) => return Err(err),
                Err(Attempt::Retry(reason)) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(url = %url, attempt, reason = %reason, "retrying index request");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(Attempt::Retry(reason)) => return Err(IndexError::Network(reason)),
            }
        }
    }
}
