//! Version resolution for declared dependencies
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - PyPI JSON API adapter
//! - Git, directory and archive resolution
//! - `PackageIndex`, the resolution context handed to the finder

mod client;
mod local;
mod pypi;
mod vcs;

pub use client::{HttpClient, DEFAULT_TIMEOUT};
pub use local::{archive_version, project_version};
pub use pypi::{PyPIAdapter, PYPI_API_URL};
pub use vcs::GitResolver;

use crate::domain::{Candidate, Dependency, DependencySource, Version};
use crate::error::RegistryError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Published versions of one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReleases {
    /// Display name reported by the registry
    pub name: String,
    /// Installable versions, ascending
    pub versions: Vec<Version>,
}

/// Trait for registry adapters
#[async_trait]
pub trait RegistryAdapter: Send + Sync {
    /// Get the registry name
    fn registry_name(&self) -> &'static str;

    /// Fetch available versions for a package
    async fn fetch_versions(&self, package: &str) -> Result<PackageReleases, RegistryError>;
}

/// Resolves the newest version available from a dependency's source
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// Version at the head of the repository or the pinned reference
    async fn resolve_vcs(&self, dependency: &Dependency) -> Result<Candidate, RegistryError>;

    /// Version of a local or remote archive
    async fn resolve_file(&self, dependency: &Dependency) -> Result<Candidate, RegistryError>;

    /// Version declared by a local project directory
    async fn resolve_directory(&self, dependency: &Dependency)
        -> Result<Candidate, RegistryError>;

    /// Highest registry version at or above `min`
    async fn resolve_best(
        &self,
        name: &str,
        min: Option<&Version>,
        allow_prereleases: bool,
    ) -> Result<Candidate, RegistryError>;

    /// Dispatch on the dependency's source kind
    ///
    /// Callers only reach this for dependencies with an upper bound. A git,
    /// file or directory entry without a `version` key is unbounded, so the
    /// vcs, file and directory paths only run for entries that declare one.
    async fn resolve_latest(&self, dependency: &Dependency) -> Result<Candidate, RegistryError> {
        match dependency.source {
            DependencySource::Vcs { .. } => self.resolve_vcs(dependency).await,
            DependencySource::File { .. } => self.resolve_file(dependency).await,
            DependencySource::Directory { .. } => self.resolve_directory(dependency).await,
            DependencySource::Registry => {
                self.resolve_best(
                    &dependency.name,
                    dependency.constraint.min_version(),
                    dependency.allows_prereleases,
                )
                .await
            }
        }
    }
}

/// Pick the highest version `>= min`.
///
/// Pre-releases only win when allowed or when no final release qualifies.
pub fn select_best<'a>(
    versions: &'a [Version],
    min: Option<&Version>,
    allow_prereleases: bool,
) -> Option<&'a Version> {
    let eligible = versions
        .iter()
        .filter(|v| min.map_or(true, |min| *v >= min));

    if allow_prereleases {
        return eligible.max();
    }

    let (pre, stable): (Vec<&Version>, Vec<&Version>) =
        eligible.partition(|v| v.is_prerelease());
    stable.into_iter().max().or_else(|| pre.into_iter().max())
}

/// Resolution context: registry adapter, git resolver and project root
pub struct PackageIndex {
    registry: Box<dyn RegistryAdapter>,
    git: GitResolver,
    root: PathBuf,
}

impl PackageIndex {
    /// Create an index resolving relative paths against `root`
    pub fn new(registry: Box<dyn RegistryAdapter>, root: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            git: GitResolver::default(),
            root: root.into(),
        }
    }

    pub fn registry_name(&self) -> &'static str {
        self.registry.registry_name()
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[async_trait]
impl VersionSource for PackageIndex {
    async fn resolve_vcs(&self, dependency: &Dependency) -> Result<Candidate, RegistryError> {
        let DependencySource::Vcs { url, reference } = &dependency.source else {
            return Err(RegistryError::source_unavailable(&dependency.name, "not a git dependency"));
        };
        debug!(package = %dependency.name, url = %url, "resolving git dependency");
        self.git
            .resolve(url, reference.as_ref())
            .await
            .map_err(|e| RegistryError::source_unavailable(&dependency.name, e.to_string()))
    }

    async fn resolve_file(&self, dependency: &Dependency) -> Result<Candidate, RegistryError> {
        let DependencySource::File { path } = &dependency.source else {
            return Err(RegistryError::source_unavailable(&dependency.name, "not a file dependency"));
        };

        if !local::is_remote(path) {
            let full = self.resolve_path(path);
            if !full.is_file() {
                return Err(RegistryError::source_unavailable(
                    &dependency.name,
                    format!("{} does not exist", full.display()),
                ));
            }
        }

        archive_version(path)
            .map_err(|e| RegistryError::source_unavailable(&dependency.name, e.to_string()))
    }

    async fn resolve_directory(
        &self,
        dependency: &Dependency,
    ) -> Result<Candidate, RegistryError> {
        let DependencySource::Directory { path } = &dependency.source else {
            return Err(RegistryError::source_unavailable(
                &dependency.name,
                "not a directory dependency",
            ));
        };
        project_version(&self.resolve_path(path))
            .map_err(|e| RegistryError::source_unavailable(&dependency.name, e.to_string()))
    }

    async fn resolve_best(
        &self,
        name: &str,
        min: Option<&Version>,
        allow_prereleases: bool,
    ) -> Result<Candidate, RegistryError> {
        let releases = self.registry.fetch_versions(name).await?;
        debug!(
            package = %name,
            versions = releases.versions.len(),
            "fetched releases from {}",
            self.registry.registry_name()
        );

        let constraint = min.map_or_else(|| "*".to_string(), |v| format!(">={}", v));
        select_best(&releases.versions, min, allow_prereleases)
            .map(|version| Candidate::new(releases.name.clone(), version.clone()))
            .ok_or_else(|| RegistryError::no_matching_version(name, constraint))
    }
}
