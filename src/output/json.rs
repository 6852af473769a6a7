//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of a run report
//! - Applied upgrades with their scope and environment

use crate::orchestrator::{AppliedUpgrade, RunOutcome, RunReport};
use crate::output::{OutputFormatter, Verbosity};
use crate::update::ResolutionMiss;
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level affects detail in output
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of the full report
#[derive(Serialize)]
struct JsonOutput<'a> {
    /// Whether this was a dry-run
    dry_run: bool,
    /// Whether the manifest was written
    written: bool,
    /// up_to_date, no_selection or applied
    outcome: &'static str,
    upgrades: &'a [AppliedUpgrade],
    #[serde(skip_serializing_if = "is_empty")]
    misses: &'a [ResolutionMiss],
    /// Only in verbose mode
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unbounded: Vec<JsonUnbounded<'a>>,
}

#[derive(Serialize)]
struct JsonUnbounded<'a> {
    name: &'a str,
    constraint: &'a str,
}

fn is_empty<T>(items: &&[T]) -> bool {
    items.is_empty()
}

fn outcome_name(outcome: &RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::UpToDate => "up_to_date",
        RunOutcome::NoSelection => "no_selection",
        RunOutcome::Applied(_) => "applied",
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &RunReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let unbounded = if self.verbosity == Verbosity::Verbose {
            report
                .unbounded
                .iter()
                .map(|dependency| JsonUnbounded {
                    name: &dependency.name,
                    constraint: dependency.pretty_constraint(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let output = JsonOutput {
            dry_run: report.dry_run,
            written: report.written,
            outcome: outcome_name(&report.outcome),
            upgrades: report.outcome.applied(),
            misses: &report.misses,
            unbounded,
        };

        serde_json::to_writer_pretty(&mut *writer, &output)?;
        writeln!(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dependency, EnvironmentTag, Scope, Version, VersionConstraint};

    fn render(verbosity: Verbosity, report: &RunReport) -> serde_json::Value {
        let mut output = Vec::new();
        JsonFormatter::new(verbosity)
            .format(report, &mut output)
            .unwrap();
        serde_json::from_slice(&output).unwrap()
    }

    fn applied_report() -> RunReport {
        RunReport {
            outcome: RunOutcome::Applied(vec![AppliedUpgrade {
                name: "foo".to_string(),
                scope: Scope::Runtime,
                environment: Some(EnvironmentTag::python("^3.5")),
                from: "^1.0".to_string(),
                to: "^3.1.0".to_string(),
                version: Version::parse("3.1.0").unwrap(),
                fields: 1,
            }]),
            misses: Vec::new(),
            unbounded: vec![Dependency::new(
                "django",
                VersionConstraint::parse(">=3.0").unwrap(),
            )],
            written: true,
            dry_run: false,
        }
    }

    #[test]
    fn test_json_applied() {
        let json = render(Verbosity::Normal, &applied_report());
        assert_eq!(json["outcome"], "applied");
        assert_eq!(json["written"], true);
        assert_eq!(json["dry_run"], false);
        assert_eq!(json["upgrades"][0]["name"], "foo");
        assert_eq!(json["upgrades"][0]["scope"], "dependencies");
        assert_eq!(json["upgrades"][0]["to"], "^3.1.0");
        assert_eq!(json["upgrades"][0]["version"], "3.1.0");
        assert!(json.get("misses").is_none());
        assert!(json.get("unbounded").is_none());
    }

    #[test]
    fn test_json_verbose_lists_unbounded() {
        let json = render(Verbosity::Verbose, &applied_report());
        assert_eq!(json["unbounded"][0]["name"], "django");
        assert_eq!(json["unbounded"][0]["constraint"], ">=3.0");
    }

    #[test]
    fn test_json_up_to_date_with_misses() {
        let report = RunReport {
            outcome: RunOutcome::UpToDate,
            misses: vec![ResolutionMiss {
                name: "ghost".to_string(),
                scope: Scope::Development,
                environment: None,
                reason: "not found".to_string(),
            }],
            unbounded: Vec::new(),
            written: false,
            dry_run: true,
        };
        let json = render(Verbosity::Normal, &report);
        assert_eq!(json["outcome"], "up_to_date");
        assert_eq!(json["upgrades"].as_array().unwrap().len(), 0);
        assert_eq!(json["misses"][0]["scope"], "devDependencies");
    }
}
