//! Versions of path dependencies
//!
//! - Directories: the version declared in their `pyproject.toml`
//! - Archives: the version embedded in the file name
//!   (`name-1.0.0-py3-none-any.whl`, `name-1.0.0.tar.gz`)

use crate::domain::{Candidate, Version};
use crate::error::SourceError;
use crate::manifest::MANIFEST_FILENAME;
use std::path::Path;
use toml::Value;

const SDIST_SUFFIXES: &[&str] = &[".tar.gz", ".tar.bz2", ".tgz", ".zip"];

/// Name and version declared by the project in `dir`
pub fn project_version(dir: &Path) -> Result<Candidate, SourceError> {
    let path = dir.join(MANIFEST_FILENAME);
    let content =
        std::fs::read_to_string(&path).map_err(|e| SourceError::read_error(&path, e))?;
    let manifest: Value = content
        .parse()
        .map_err(|e: toml::de::Error| SourceError::invalid_toml(&path, e.message()))?;

    let metadata = manifest
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .filter(|p| p.get("version").is_some())
        .or_else(|| manifest.get("project"))
        .ok_or_else(|| SourceError::MissingMetadata { path: path.clone() })?;

    let version = metadata
        .get("version")
        .and_then(Value::as_str)
        .ok_or_else(|| SourceError::MissingVersion { path: path.clone() })?;
    let version = Version::parse(version)?;

    let name = metadata
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            dir.file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_default();

    Ok(Candidate::new(name, version))
}

/// Name and version encoded in a wheel or sdist file name
pub fn archive_version(path: &Path) -> Result<Candidate, SourceError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SourceError::NoFileName {
            path: path.to_path_buf(),
        })?;

    let (name, version) = if let Some(stem) = file_name.strip_suffix(".whl") {
        // {name}-{version}(-{build})?-{python}-{abi}-{platform}
        let mut parts = stem.split('-');
        match (parts.next(), parts.next()) {
            (Some(name), Some(version)) => (name, version),
            _ => {
                return Err(SourceError::MalformedWheel {
                    name: file_name.to_string(),
                })
            }
        }
    } else {
        let stem = SDIST_SUFFIXES
            .iter()
            .find_map(|suffix| file_name.strip_suffix(suffix))
            .ok_or_else(|| SourceError::UnsupportedArchive {
                name: file_name.to_string(),
            })?;
        stem.rsplit_once('-')
            .ok_or_else(|| SourceError::UnversionedArchive {
                name: file_name.to_string(),
            })?
    };

    let version = Version::parse(version)?;
    Ok(Candidate::new(name.replace('_', "-"), version))
}

/// True for `http://` and `https://` sources, which are not checked on disk
pub fn is_remote(path: &Path) -> bool {
    path.to_str()
        .is_some_and(|p| p.starts_with("http://") || p.starts_with("https://"))
}
