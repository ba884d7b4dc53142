use super::IndexError;
use serde::{Deserialize, Serialize};

/// Body of `GET /pypi/{name}/json`. Only the `info` block is consumed.
#[derive(Clone, Debug, Deserialize)]
pub struct PypiProject {
    pub info: PypiInfo,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PypiInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub requires_dist: Option<Vec<String>>,
    #[serde(default)]
    pub provides_extra: Option<Vec<String>>,
    #[serde(default)]
    pub requires_python: Option<String>,
}

/// Validated metadata for one release of a package.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub requires_dist: Vec<String>,
    #[serde(default)]
    pub provides_extra: Vec<String>,
    #[serde(default)]
    pub requires_python: Option<String>,
}

impl PackageMetadata {
    pub fn new(name: &str, version: &str) -> Self {
        PackageMetadata {
            name: name.to_string(),
            version: version.to_string(),
            requires_dist: Vec::new(),
            provides_extra: Vec::new(),
            requires_python: None,
        }
    }
}

impl TryFrom<PypiInfo> for PackageMetadata {
    type Error = IndexError;

    fn try_from(info: PypiInfo) -> Result<Self, Self::Error> {
        let name = info.name.trim().to_string();
        let version = info.version.trim().to_string();

        if name.is_empty() || version.is_empty() {
            return Err(IndexError::Network(
                "index response is missing name or version".to_string(),
            ));
        }

        let requires_python = info
            .requires_python
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(PackageMetadata {
            name,
            version,
            requires_dist: info.requires_dist.unwrap_or_default(),
            provides_extra: info.provides_extra.unwrap_or_default(),
            requires_python,
        })
    }
}
