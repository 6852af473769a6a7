//! CLI argument parsing module for poetry-upgrade

use crate::config::{is_http_url, INDEX_URL_EXPECTED};
use crate::manifest::RewriteStrategy;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Parse a rewrite strategy name (caret, preserve)
fn parse_strategy(s: &str) -> Result<RewriteStrategy, String> {
    s.trim().parse().map_err(|e: crate::error::ConfigError| e.to_string())
}

/// Accept only http(s) index URLs
fn parse_index_url(s: &str) -> Result<String, String> {
    let url = s.trim();
    if is_http_url(url) {
        Ok(url.to_string())
    } else {
        Err(INDEX_URL_EXPECTED.to_string())
    }
}

/// Interactive upgrade of Poetry dependency constraints
#[derive(Parser, Debug, Clone)]
#[command(
    name = "poetry-upgrade",
    version,
    about = "Upgrade Poetry dependencies whose latest release is outside the declared range"
)]
pub struct CliArgs {
    /// Project directory or pyproject.toml (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    // General options
    /// Dry run mode - show what would be upgraded without writing pyproject.toml
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Upgrade every candidate without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    // Rewrite options
    /// Constraint rewrite strategy: caret (always ^new) or preserve (keep the operator)
    #[arg(long, value_parser = parse_strategy)]
    pub strategy: Option<RewriteStrategy>,

    // Registry options
    /// Base URL of the PyPI JSON API
    #[arg(long, env = "POETRY_UPGRADE_INDEX_URL", value_parser = parse_index_url)]
    pub index_url: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    // Output options
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,
}

impl CliArgs {
    /// Whether a progress bar should be drawn
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["poetry-upgrade"]);
        assert_eq!(args.path, PathBuf::from("."));
        assert!(!args.dry_run);
        assert!(!args.yes);
        assert!(args.strategy.is_none());
        assert!(args.timeout.is_none());
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(!args.json);
        assert!(args.show_progress());
    }

    #[test]
    fn test_path_argument() {
        let args = CliArgs::parse_from(["poetry-upgrade", "/some/project"]);
        assert_eq!(args.path, PathBuf::from("/some/project"));
    }

    #[test]
    fn test_dry_run_flags() {
        assert!(CliArgs::parse_from(["poetry-upgrade", "-n"]).dry_run);
        assert!(CliArgs::parse_from(["poetry-upgrade", "--dry-run"]).dry_run);
    }

    #[test]
    fn test_yes_flags() {
        assert!(CliArgs::parse_from(["poetry-upgrade", "-y"]).yes);
        assert!(CliArgs::parse_from(["poetry-upgrade", "--yes"]).yes);
    }

    #[test]
    fn test_strategy() {
        let args = CliArgs::parse_from(["poetry-upgrade", "--strategy", "preserve"]);
        assert_eq!(args.strategy, Some(RewriteStrategy::PreserveOperator));

        let args = CliArgs::parse_from(["poetry-upgrade", "--strategy", "caret"]);
        assert_eq!(args.strategy, Some(RewriteStrategy::Caret));
    }

    #[test]
    fn test_invalid_strategy() {
        let result = CliArgs::try_parse_from(["poetry-upgrade", "--strategy", "tilde"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_timeout() {
        let args = CliArgs::parse_from(["poetry-upgrade", "--timeout", "5"]);
        assert_eq!(args.timeout, Some(5));
        assert!(CliArgs::try_parse_from(["poetry-upgrade", "--timeout", "0"]).is_err());
    }

    #[test]
    fn test_index_url() {
        let args = CliArgs::parse_from([
            "poetry-upgrade",
            "--index-url",
            "https://mirror.example.com/pypi",
        ]);
        assert_eq!(
            args.index_url.as_deref(),
            Some("https://mirror.example.com/pypi")
        );
    }

    #[test]
    fn test_index_url_must_be_http() {
        for url in ["ftp://mirror.example.com/pypi", "mirror.example.com", ""] {
            let result = CliArgs::try_parse_from(["poetry-upgrade", "--index-url", url]);
            assert!(result.is_err(), "{url} should be rejected");
        }
    }

    #[test]
    fn test_verbose_count() {
        assert_eq!(CliArgs::parse_from(["poetry-upgrade", "-v"]).verbose, 1);
        assert_eq!(CliArgs::parse_from(["poetry-upgrade", "-vvv"]).verbose, 3);
    }

    #[test]
    fn test_json_disables_progress() {
        let args = CliArgs::parse_from(["poetry-upgrade", "--json"]);
        assert!(args.json);
        assert!(!args.show_progress());

        let args = CliArgs::parse_from(["poetry-upgrade", "-q"]);
        assert!(!args.show_progress());
    }
}
