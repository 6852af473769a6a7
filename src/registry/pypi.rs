//! PyPI JSON API adapter
//!
//! Fetches package version information from PyPI or a compatible index.
//! API endpoint: {index-url}/{package}/json

use crate::domain::Version;
use crate::error::RegistryError;
use crate::registry::{HttpClient, PackageReleases, RegistryAdapter};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::trace;

/// PyPI API base URL
pub const PYPI_API_URL: &str = "https://pypi.org/pypi";

/// PyPI adapter
pub struct PyPIAdapter {
    client: HttpClient,
    base_url: String,
}

/// PyPI package metadata response
#[derive(Debug, Deserialize)]
struct PyPIResponse {
    info: PackageInfo,
    /// Release files keyed by version
    releases: HashMap<String, Vec<ReleaseFile>>,
}

#[derive(Debug, Deserialize)]
struct PackageInfo {
    name: String,
}

/// Release file information
#[derive(Debug, Deserialize)]
struct ReleaseFile {
    #[serde(default)]
    yanked: bool,
}

impl PyPIAdapter {
    /// Create a new PyPI adapter
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, PYPI_API_URL)
    }

    /// Create an adapter for a PyPI-compatible JSON index
    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Build the URL for a package
    fn build_url(&self, package: &str) -> String {
        format!("{}/{}/json", self.base_url, package)
    }
}

/// Versions that still have at least one file that is not yanked
fn installable_versions(releases: HashMap<String, Vec<ReleaseFile>>) -> Vec<Version> {
    let mut versions: Vec<Version> = releases
        .into_iter()
        .filter(|(_, files)| files.iter().any(|file| !file.yanked))
        .filter_map(|(raw, _)| match Version::parse(&raw) {
            Ok(version) => Some(version),
            Err(_) => {
                trace!(version = %raw, "ignoring unparseable release");
                None
            }
        })
        .collect();
    versions.sort();
    versions
}

#[async_trait]
impl RegistryAdapter for PyPIAdapter {
    fn registry_name(&self) -> &'static str {
        "PyPI"
    }

    async fn fetch_versions(&self, package: &str) -> Result<PackageReleases, RegistryError> {
        let url = self.build_url(package);
        let response: PyPIResponse = self
            .client
            .get_json(&url, package, self.registry_name())
            .await?;

        Ok(PackageReleases {
            name: response.info.name,
            versions: installable_versions(response.releases),
        })
    }
}
