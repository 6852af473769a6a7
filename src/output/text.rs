//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Applied upgrades grouped by scope, with colors
//! - Version change type indication (major/minor/patch)
//! - Unresolved and unbounded dependencies in verbose mode

use crate::domain::{Scope, Version, VersionConstraint};
use crate::orchestrator::{AppliedUpgrade, RunOutcome, RunReport};
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;

/// Semantic version change type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionChangeType {
    /// Major version change (breaking)
    Major,
    /// Minor version change (features)
    Minor,
    /// Patch version change (fixes)
    Patch,
    /// No lower bound to compare against
    Unknown,
}

impl VersionChangeType {
    /// Determine the change type from the old constraint to the new version
    pub fn from_upgrade(old_constraint: &str, new: &Version) -> Self {
        let old = VersionConstraint::parse(old_constraint)
            .ok()
            .and_then(|c| c.min_version().cloned());

        match old {
            Some(old) if old.major() != new.major() => VersionChangeType::Major,
            Some(old) if old.minor() != new.minor() => VersionChangeType::Minor,
            Some(_) => VersionChangeType::Patch,
            None => VersionChangeType::Unknown,
        }
    }

    /// Get the display label with color
    pub fn colored_label(&self) -> String {
        match self {
            VersionChangeType::Major => "major".red().bold().to_string(),
            VersionChangeType::Minor => "minor".yellow().to_string(),
            VersionChangeType::Patch => "patch".green().to_string(),
            VersionChangeType::Unknown => "?".dimmed().to_string(),
        }
    }

    /// Get the plain label
    pub fn label(&self) -> &'static str {
        match self {
            VersionChangeType::Major => "major",
            VersionChangeType::Minor => "minor",
            VersionChangeType::Patch => "patch",
            VersionChangeType::Unknown => "?",
        }
    }
}

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    /// Get the dry-run prefix if applicable
    fn dry_run_prefix(&self, dry_run: bool) -> String {
        if !dry_run {
            String::new()
        } else if self.color {
            format!("{} ", "(dry-run)".cyan())
        } else {
            "(dry-run) ".to_string()
        }
    }

    fn format_upgrade_line(
        &self,
        upgrade: &AppliedUpgrade,
        max_name_len: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let change_type = VersionChangeType::from_upgrade(&upgrade.from, &upgrade.version);
        let environment = upgrade
            .environment
            .as_ref()
            .map(|env| format!(" ({})", env))
            .unwrap_or_default();

        if self.color {
            let name_display = format!("{:width$}", upgrade.name, width = max_name_len);
            writeln!(
                writer,
                "  {} {} {} {} [{}]{}",
                name_display,
                upgrade.from.dimmed(),
                "→".dimmed(),
                upgrade.to.bright_white().bold(),
                change_type.colored_label(),
                environment.dimmed()
            )
        } else {
            writeln!(
                writer,
                "  {:width$} {} -> {} [{}]{}",
                upgrade.name,
                upgrade.from,
                upgrade.to,
                change_type.label(),
                environment,
                width = max_name_len
            )
        }
    }

    fn format_applied(
        &self,
        report: &RunReport,
        upgrades: &[AppliedUpgrade],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let prefix = self.dry_run_prefix(report.dry_run);
        let count = upgrades.len();
        let noun = if count == 1 { "dependency" } else { "dependencies" };
        let verb = if report.dry_run {
            "Would upgrade"
        } else {
            "Upgraded"
        };

        if self.verbosity != Verbosity::Quiet {
            if self.color {
                writeln!(
                    writer,
                    "{}{} {} {}",
                    prefix,
                    verb.bold(),
                    count.to_string().green(),
                    noun
                )?;
            } else {
                writeln!(writer, "{}{} {} {}", prefix, verb, count, noun)?;
            }
        }

        let max_name_len = upgrades.iter().map(|u| u.name.len()).max().unwrap_or(0);
        for scope in Scope::all() {
            let in_scope: Vec<_> = upgrades.iter().filter(|u| u.scope == *scope).collect();
            if in_scope.is_empty() {
                continue;
            }
            if self.verbosity != Verbosity::Quiet {
                if self.color {
                    writeln!(writer, "{}", scope.label().cyan())?;
                } else {
                    writeln!(writer, "{}", scope.label())?;
                }
            }
            for upgrade in in_scope {
                self.format_upgrade_line(upgrade, max_name_len, writer)?;
            }
        }

        let untouched: Vec<_> = upgrades.iter().filter(|u| u.fields == 0).collect();
        for upgrade in untouched {
            let message = format!("warning: no version field of {} was rewritten", upgrade.name);
            if self.color {
                writeln!(writer, "{}", message.yellow())?;
            } else {
                writeln!(writer, "{}", message)?;
            }
        }

        Ok(())
    }

    fn format_details(&self, report: &RunReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Verbose {
            if !report.misses.is_empty() {
                writeln!(writer)?;
                writeln!(writer, "{}", self.dim("Could not resolve:"))?;
                for miss in &report.misses {
                    let environment = miss
                        .environment
                        .as_ref()
                        .map(|env| format!(" ({})", env))
                        .unwrap_or_default();
                    writeln!(
                        writer,
                        "  {}{} {}",
                        miss.name,
                        environment,
                        self.dim(&format!("({})", miss.reason))
                    )?;
                }
            }

            if !report.unbounded.is_empty() {
                writeln!(writer)?;
                writeln!(writer, "{}", self.dim("No upper bound:"))?;
                for dependency in &report.unbounded {
                    writeln!(
                        writer,
                        "  {} {}",
                        dependency.name,
                        self.dim(dependency.pretty_constraint())
                    )?;
                }
            }
        } else if self.verbosity == Verbosity::Normal && !report.misses.is_empty() {
            let count = report.misses.len();
            let message = format!(
                "{} {} could not be resolved (use -v for details)",
                count,
                if count == 1 { "dependency" } else { "dependencies" }
            );
            writeln!(writer, "{}", self.dim(&message))?;
        }
        Ok(())
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, report: &RunReport, writer: &mut dyn Write) -> std::io::Result<()> {
        match &report.outcome {
            RunOutcome::UpToDate => {
                if self.verbosity != Verbosity::Quiet {
                    let message = "All dependencies are within their declared ranges.";
                    if self.color {
                        writeln!(writer, "{}", message.green())?;
                    } else {
                        writeln!(writer, "{}", message)?;
                    }
                }
            }
            RunOutcome::NoSelection => {
                if self.verbosity != Verbosity::Quiet {
                    writeln!(writer, "No upgrades selected, manifest left unchanged.")?;
                }
            }
            RunOutcome::Applied(upgrades) => self.format_applied(report, upgrades, writer)?,
        }

        self.format_details(report, writer)
    }
}
