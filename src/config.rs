//! Run settings
//!
//! Values come from the command line first, then from an optional
//! `[tool.poetry-upgrade]` table in the manifest, then from defaults.

use crate::cli::CliArgs;
use crate::error::ConfigError;
use crate::manifest::{ManifestDocument, RewriteStrategy};
use crate::registry::{DEFAULT_TIMEOUT, PYPI_API_URL};
use std::time::Duration;
use toml_edit::{Item, TableLike};

/// Name of the project settings table under `[tool]`
pub const SETTINGS_TABLE: &str = "poetry-upgrade";

/// Settings read from `[tool.poetry-upgrade]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSettings {
    pub strategy: Option<RewriteStrategy>,
    pub index_url: Option<String>,
    pub timeout: Option<u64>,
}

impl ProjectSettings {
    /// Read the settings table of `document`, if any
    pub fn from_document(document: &ManifestDocument) -> Result<Self, ConfigError> {
        match document.tool_table(SETTINGS_TABLE) {
            Some(table) => Self::from_table(table),
            None => Ok(Self::default()),
        }
    }

    fn from_table(table: &dyn TableLike) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(item) = table.get("strategy") {
            let value = string_setting("strategy", item)?;
            settings.strategy = Some(value.parse()?);
        }

        if let Some(item) = table.get("index-url") {
            let value = string_setting("index-url", item)?;
            if !is_http_url(value) {
                return Err(ConfigError::invalid_setting("index-url", INDEX_URL_EXPECTED));
            }
            settings.index_url = Some(value.to_string());
        }

        if let Some(item) = table.get("timeout") {
            let value = item.as_integer().ok_or_else(|| {
                ConfigError::invalid_setting("timeout", "expected an integer number of seconds")
            })?;
            if value <= 0 {
                return Err(ConfigError::invalid_setting(
                    "timeout",
                    "must be greater than zero",
                ));
            }
            settings.timeout = Some(value as u64);
        }

        Ok(settings)
    }
}

pub(crate) const INDEX_URL_EXPECTED: &str = "expected an http(s) URL";

/// True for `http://` and `https://` URLs
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn string_setting<'a>(key: &str, item: &'a Item) -> Result<&'a str, ConfigError> {
    item.as_str()
        .ok_or_else(|| ConfigError::invalid_setting(key, "expected a string"))
}

/// Effective settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub strategy: RewriteStrategy,
    pub index_url: String,
    pub timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strategy: RewriteStrategy::default(),
            index_url: PYPI_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Settings {
    /// Merge command line arguments over project settings
    pub fn resolve(args: &CliArgs, project: ProjectSettings) -> Self {
        let defaults = Self::default();
        Self {
            strategy: args
                .strategy
                .or(project.strategy)
                .unwrap_or(defaults.strategy),
            index_url: args
                .index_url
                .clone()
                .or(project.index_url)
                .unwrap_or(defaults.index_url),
            timeout: args
                .timeout
                .or(project.timeout)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn document(extra: &str) -> ManifestDocument {
        let content = format!(
            "[tool.poetry]\nname = \"demo\"\n\n[tool.poetry.dependencies]\npython = \"^3.8\"\n{}",
            extra
        );
        ManifestDocument::parse(&content, "pyproject.toml").unwrap()
    }

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["poetry-upgrade"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn test_no_settings_table() {
        let settings = ProjectSettings::from_document(&document("")).unwrap();
        assert_eq!(settings, ProjectSettings::default());
    }

    #[test]
    fn test_project_settings() {
        let doc = document(
            "\n[tool.poetry-upgrade]\nstrategy = \"preserve\"\nindex-url = \"https://mirror.example.com/pypi\"\ntimeout = 10\n",
        );
        let settings = ProjectSettings::from_document(&doc).unwrap();
        assert_eq!(settings.strategy, Some(RewriteStrategy::PreserveOperator));
        assert_eq!(
            settings.index_url.as_deref(),
            Some("https://mirror.example.com/pypi")
        );
        assert_eq!(settings.timeout, Some(10));
    }

    #[test]
    fn test_invalid_project_settings() {
        let invalid = [
            "strategy = \"tilde\"",
            "strategy = 1",
            "index-url = \"ftp://example.com\"",
            "timeout = 0",
            "timeout = \"ten\"",
        ];
        for line in invalid {
            let doc = document(&format!("\n[tool.poetry-upgrade]\n{}\n", line));
            assert!(
                ProjectSettings::from_document(&doc).is_err(),
                "accepted {}",
                line
            );
        }
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://pypi.org/pypi"));
        assert!(is_http_url("http://127.0.0.1:8080/pypi"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("pypi.org/pypi"));
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(&args(&["--index-url", PYPI_API_URL]), ProjectSettings::default());
        assert_eq!(settings.strategy, RewriteStrategy::Caret);
        assert_eq!(settings.index_url, PYPI_API_URL);
        assert_eq!(settings.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_cli_overrides_project() {
        let project = ProjectSettings {
            strategy: Some(RewriteStrategy::PreserveOperator),
            index_url: Some("https://project.example.com/pypi".to_string()),
            timeout: Some(10),
        };
        let settings = Settings::resolve(
            &args(&[
                "--strategy",
                "caret",
                "--index-url",
                "https://cli.example.com/pypi",
                "--timeout",
                "3",
            ]),
            project,
        );
        assert_eq!(settings.strategy, RewriteStrategy::Caret);
        assert_eq!(settings.index_url, "https://cli.example.com/pypi");
        assert_eq!(settings.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_project_fills_missing_cli_values() {
        let project = ProjectSettings {
            strategy: Some(RewriteStrategy::PreserveOperator),
            index_url: None,
            timeout: Some(10),
        };
        let settings = Settings::resolve(&args(&["--index-url", PYPI_API_URL]), project);
        assert_eq!(settings.strategy, RewriteStrategy::PreserveOperator);
        assert_eq!(settings.timeout, Duration::from_secs(10));
    }
}
