use crate::registry::IndexError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PydepsError {
    #[error("Invalid package name {name:?}")]
    InvalidName { name: String },

    #[error("Package {name} not found{}", version.as_ref().map(|v| format!(" (version {v})")).unwrap_or_default())]
    PackageNotFound {
        name: String,
        version: Option<String>,
    },

    #[error("Network error while fetching {name}: {reason}")]
    Network { name: String, reason: String },

    #[error("Dependency resolution for {name} was cancelled")]
    Cancelled { name: String },

    #[error("HTTP request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Failed to read file {path:?}: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },

    #[error("Failed to write file {path:?}: {source}")]
    WriteFile { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse JSON in {path:?}: {source}")]
    ParseJson { path: PathBuf, source: serde_json::Error },
}

impl PydepsError {
    pub fn from_index(name: &str, version: Option<&str>, err: IndexError) -> Self {
        match err {
            IndexError::NotFound => PydepsError::PackageNotFound {
                name: name.to_string(),
                version: version.map(str::to_string),
            },
            IndexError::InvalidName => PydepsError::InvalidName {
                name: name.to_string(),
            },
            IndexError::Network(reason) => PydepsError::Network {
                name: name.to_string(),
                reason,
            },
        }
    }
}
