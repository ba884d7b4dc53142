pub mod pypi;
pub mod types;

pub use pypi::PypiClient;
pub use types::PackageMetadata;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("package not found")]
    NotFound,

    #[error("invalid package name")]
    InvalidName,

    #[error("{0}")]
    Network(String),
}

impl IndexError {
    pub fn kind(&self) -> &'static str {
        match self {
            IndexError::NotFound => "not_found",
            IndexError::InvalidName => "invalid_name",
            IndexError::Network(_) => "network",
        }
    }
}

/// Source of package metadata. Implementations must be safe to call
/// concurrently; the resolver keeps several lookups in flight at once.
#[async_trait]
pub trait PackageIndex: Send + Sync {
    /// Metadata for `name` at `version`, or the latest release when `version`
    /// is `None`.
    async fn get_package_metadata(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<PackageMetadata, IndexError>;
}

#[async_trait]
impl<T: PackageIndex + ?Sized> PackageIndex for std::sync::Arc<T> {
    async fn get_package_metadata(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<PackageMetadata, IndexError> {
        (**self).get_package_metadata(name, version).await
    }
}
