pub mod analysis;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod operations;
pub mod registry;
pub mod resolve;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::MetadataCache;
pub use classify::{AllowList, DefaultDevGroups, DependencyBuckets, DevGroupPredicate};
pub use config::PydepsConfig;
pub use error::PydepsError;
pub use registry::{IndexError, PackageIndex, PackageMetadata, PypiClient};
pub use resolve::{ResolutionReport, ResolveRequest, Resolver, ResolverSettings};

pub type Result<T> = std::result::Result<T, PydepsError>;
