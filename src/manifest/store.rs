//! Manifest storage
//!
//! Reading happens once at the start of a run, writing once at the end.
//! The write goes through a temporary file in the same directory that is
//! renamed over the manifest, so a failed write leaves the old file intact.

use super::ManifestDocument;
use crate::error::ManifestError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Manifest file name of a Poetry project
pub const MANIFEST_FILENAME: &str = "pyproject.toml";

/// Where the manifest document lives
pub trait ManifestStore {
    /// Read and parse the manifest
    fn read(&self) -> Result<ManifestDocument, ManifestError>;

    /// Persist the whole document; all-or-nothing
    fn write(&self, document: &ManifestDocument) -> Result<(), ManifestError>;
}

/// `pyproject.toml` on the local filesystem
#[derive(Debug, Clone)]
pub struct FileManifestStore {
    path: PathBuf,
}

impl FileManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Locate the manifest for a project directory or manifest path
    pub fn locate(target: &Path) -> Result<Self, ManifestError> {
        let path = if target.is_dir() {
            target.join(MANIFEST_FILENAME)
        } else {
            target.to_path_buf()
        };

        if !path.is_file() {
            return Err(ManifestError::not_found(path));
        }
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the manifest, used for relative path dependencies
    pub fn project_root(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl ManifestStore for FileManifestStore {
    fn read(&self) -> Result<ManifestDocument, ManifestError> {
        debug!(path = %self.path.display(), "reading manifest");
        let content = fs::read_to_string(&self.path)
            .map_err(|e| ManifestError::read_error(&self.path, e))?;
        ManifestDocument::parse(&content, &self.path)
    }

    fn write(&self, document: &ManifestDocument) -> Result<(), ManifestError> {
        let write_err = |e| ManifestError::write_error(&self.path, e);

        let mut file = NamedTempFile::new_in(self.project_root()).map_err(write_err)?;
        file.write_all(document.to_string().as_bytes())
            .map_err(write_err)?;
        file.as_file().sync_all().map_err(write_err)?;

        // Keep the permissions of the file being replaced
        if let Ok(metadata) = fs::metadata(&self.path) {
            fs::set_permissions(file.path(), metadata.permissions()).map_err(write_err)?;
        }

        file.persist(&self.path).map_err(|e| write_err(e.error))?;
        info!(path = %self.path.display(), "manifest written");
        Ok(())
    }
}
