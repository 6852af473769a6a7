//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ManifestError: Issues reading, parsing or writing pyproject.toml
//! - RegistryError: Issues resolving the latest version of a dependency
//! - SourceError: Unreadable git, file or directory sources
//! - VersionError: Malformed versions or version constraints
//! - ConfigError: Issues with CLI or project configuration
//! - Io: Terminal interaction failures

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Manifest file related errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Version resolution related errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Terminal IO errors (interactive selection)
    #[error("terminal IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to manifest file operations
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("manifest file not found: {path}")]
    NotFound { path: PathBuf },

    /// Failed to read manifest file
    #[error("failed to read manifest file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write manifest file
    #[error("failed to write manifest file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("failed to parse TOML in {path}: {message}")]
    TomlParseError { path: PathBuf, message: String },

    /// The manifest has no [tool.poetry] table
    #[error("{path} is not a Poetry project: missing [tool.poetry] section")]
    NotPoetryProject { path: PathBuf },
}

/// Errors raised while resolving the latest version of a dependency
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Package not found in registry
    #[error("package '{package}' not found in {registry} registry")]
    PackageNotFound { package: String, registry: String },

    /// No published version satisfies the lower bound
    #[error("no version of '{package}' matches '{constraint}'")]
    NoMatchingVersion { package: String, constraint: String },

    /// Network request failed
    #[error("failed to fetch package '{package}' from {registry}: {message}")]
    NetworkError {
        package: String,
        registry: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {registry} registry")]
    RateLimitExceeded { registry: String },

    /// Invalid response from registry
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{package}' from {registry}")]
    Timeout { package: String, registry: String },

    /// A git, file or directory source could not be read
    #[error("source of '{package}' is unavailable: {message}")]
    SourceUnavailable { package: String, message: String },
}

/// Errors reading the version declared by a git, file or directory source
#[derive(Error, Debug)]
pub enum SourceError {
    /// The project manifest could not be read
    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The project manifest is not valid TOML
    #[error("invalid TOML in {path}: {message}")]
    InvalidToml { path: PathBuf, message: String },

    /// Neither [tool.poetry] nor [project] declares a version
    #[error("{path} declares no project metadata")]
    MissingMetadata { path: PathBuf },

    #[error("{path} declares no version")]
    MissingVersion { path: PathBuf },

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error("{path} has no file name")]
    NoFileName { path: PathBuf },

    /// Wheel name without a version part
    #[error("malformed wheel name '{name}'")]
    MalformedWheel { name: String },

    /// Neither a wheel nor a known sdist suffix
    #[error("unsupported archive '{name}'")]
    UnsupportedArchive { name: String },

    /// Sdist name without a `-{version}` suffix
    #[error("no version in archive name '{name}'")]
    UnversionedArchive { name: String },

    /// The temporary checkout directory could not be created
    #[error("cannot create checkout directory: {0}")]
    Checkout(#[source] std::io::Error),

    /// The git executable could not be started
    #[error("failed to run {program}: {source}")]
    GitUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// git exited with a failure status
    #[error("git {command} failed: {stderr}")]
    GitFailed { command: String, stderr: String },
}

/// Errors related to versions and version constraints
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// Not a valid PEP 440 version
    #[error("invalid version '{value}'")]
    InvalidVersion { value: String },

    /// Not a valid Poetry version constraint
    #[error("invalid version constraint '{value}': {message}")]
    InvalidConstraint { value: String, message: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Unknown rewrite strategy
    #[error("invalid rewrite strategy '{value}': expected 'caret' or 'preserve'")]
    InvalidStrategy { value: String },

    /// Invalid value in [tool.poetry-upgrade]
    #[error("invalid setting '{key}' in [tool.poetry-upgrade]: {message}")]
    InvalidSetting { key: String, message: String },
}

impl ConfigError {
    /// Creates a new InvalidSetting error
    pub fn invalid_setting(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidSetting {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl ManifestError {
    /// Creates a new NotFound error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        ManifestError::NotFound { path: path.into() }
    }

    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new TomlParseError
    pub fn toml_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::TomlParseError {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl RegistryError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::PackageNotFound {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new NoMatchingVersion error
    pub fn no_matching_version(package: impl Into<String>, constraint: impl Into<String>) -> Self {
        RegistryError::NoMatchingVersion {
            package: package.into(),
            constraint: constraint.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(registry: impl Into<String>) -> Self {
        RegistryError::RateLimitExceeded {
            registry: registry.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::Timeout {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new SourceUnavailable error
    pub fn source_unavailable(package: impl Into<String>, message: impl Into<String>) -> Self {
        RegistryError::SourceUnavailable {
            package: package.into(),
            message: message.into(),
        }
    }
}

impl SourceError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SourceError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new InvalidToml error
    pub fn invalid_toml(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        SourceError::InvalidToml {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl VersionError {
    /// Creates a new InvalidVersion error
    pub fn invalid_version(value: impl Into<String>) -> Self {
        VersionError::InvalidVersion {
            value: value.into(),
        }
    }

    /// Creates a new InvalidConstraint error
    pub fn invalid_constraint(value: impl Into<String>, message: impl Into<String>) -> Self {
        VersionError::InvalidConstraint {
            value: value.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_error_not_found() {
        let err = ManifestError::not_found("/path/to/pyproject.toml");
        let msg = format!("{}", err);
        assert!(msg.contains("manifest file not found"));
        assert!(msg.contains("pyproject.toml"));
    }

    #[test]
    fn test_manifest_error_toml_parse() {
        let err = ManifestError::toml_parse_error("/path/to/pyproject.toml", "invalid key");
        let msg = format!("{}", err);
        assert!(msg.contains("failed to parse TOML"));
        assert!(msg.contains("invalid key"));
    }

    #[test]
    fn test_manifest_error_not_poetry() {
        let err = ManifestError::NotPoetryProject {
            path: PathBuf::from("pyproject.toml"),
        };
        assert!(err.to_string().contains("not a Poetry project"));
    }

    #[test]
    fn test_registry_error_package_not_found() {
        let err = RegistryError::package_not_found("nonexistent-package", "PyPI");
        let msg = format!("{}", err);
        assert!(msg.contains("package 'nonexistent-package' not found"));
        assert!(msg.contains("PyPI"));
    }

    #[test]
    fn test_registry_error_no_matching_version() {
        let err = RegistryError::no_matching_version("requests", ">=9.0");
        assert_eq!(err.to_string(), "no version of 'requests' matches '>=9.0'");
    }

    #[test]
    fn test_registry_error_network() {
        let err = RegistryError::network_error("requests", "PyPI", "connection refused");
        let msg = format!("{}", err);
        assert!(msg.contains("failed to fetch"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_registry_error_timeout() {
        let err = RegistryError::timeout("django", "PyPI");
        let msg = format!("{}", err);
        assert!(msg.contains("timeout"));
        assert!(msg.contains("django"));
    }

    #[test]
    fn test_registry_error_source_unavailable() {
        let err = RegistryError::source_unavailable("mylib", "git clone failed");
        assert!(err.to_string().contains("source of 'mylib' is unavailable"));
    }

    #[test]
    fn test_version_error_messages() {
        let err = VersionError::invalid_version("abc");
        assert_eq!(err.to_string(), "invalid version 'abc'");

        let err = VersionError::invalid_constraint(">>1", "unknown operator");
        assert!(err.to_string().contains(">>1"));
        assert!(err.to_string().contains("unknown operator"));
    }

    #[test]
    fn test_source_error_messages() {
        let err = SourceError::read_error(
            "/lib/pyproject.toml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().starts_with("cannot read /lib/pyproject.toml"));

        let err: SourceError = VersionError::invalid_version("abc").into();
        assert_eq!(err.to_string(), "invalid version 'abc'");

        let err = SourceError::GitFailed {
            command: "clone".to_string(),
            stderr: "repository not found".to_string(),
        };
        assert_eq!(err.to_string(), "git clone failed: repository not found");
    }

    #[test]
    fn test_config_error_invalid_strategy() {
        let err = ConfigError::InvalidStrategy {
            value: "tilde".to_string(),
        };
        assert!(err.to_string().contains("invalid rewrite strategy 'tilde'"));
    }

    #[test]
    fn test_app_error_from_manifest_error() {
        let app_err: AppError = ManifestError::not_found("/path").into();
        assert!(app_err.to_string().contains("manifest file not found"));
    }

    #[test]
    fn test_app_error_from_registry_error() {
        let app_err: AppError = RegistryError::package_not_found("pkg", "PyPI").into();
        assert!(app_err.to_string().contains("package 'pkg' not found"));
    }

    #[test]
    fn test_app_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let app_err: AppError = io_err.into();
        assert!(app_err.to_string().contains("terminal IO error"));
    }
}
