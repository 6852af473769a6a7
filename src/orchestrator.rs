//! Upgrade orchestrator for coordinating the entire workflow
//!
//! This module provides:
//! - Workflow coordination: read → resolve → select → rewrite → write
//! - Sequential candidate resolution for the runtime and development groups
//! - Dry-run mode support
//! - A single manifest write, only after a non-empty approval

use crate::domain::{Dependency, DependencyGroup, EnvironmentTag, Scope, Version};
use crate::error::AppError;
use crate::manifest::{ConstraintRewriter, ManifestDocument, ManifestStore};
use crate::registry::VersionSource;
use crate::selection::{ChoiceSection, Selector};
use crate::update::{ResolutionMiss, UpgradeCandidateFinder};
use serde::Serialize;
use tracing::{debug, info};

/// An approved upgrade applied to the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedUpgrade {
    pub name: String,
    pub scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentTag>,
    /// Constraint before the upgrade
    pub from: String,
    /// Constraint written by the rewriter
    pub to: String,
    pub version: Version,
    /// Number of version fields rewritten
    pub fields: usize,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing exceeds its declared range
    UpToDate,
    /// Upgrades were offered but none approved
    NoSelection,
    /// Approved upgrades, in selection order
    Applied(Vec<AppliedUpgrade>),
}

impl RunOutcome {
    /// Returns true when the document was modified in memory
    pub fn has_changes(&self) -> bool {
        match self {
            RunOutcome::Applied(upgrades) => upgrades.iter().any(|u| u.fields > 0),
            _ => false,
        }
    }

    /// Applied upgrades, empty for the other outcomes
    pub fn applied(&self) -> &[AppliedUpgrade] {
        match self {
            RunOutcome::Applied(upgrades) => upgrades,
            _ => &[],
        }
    }
}

/// Result of one orchestrated run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Dependencies excluded because their source could not be resolved
    pub misses: Vec<ResolutionMiss>,
    /// Dependencies without an upper bound
    pub unbounded: Vec<Dependency>,
    /// Whether the manifest was persisted
    pub written: bool,
    pub dry_run: bool,
}

/// Drives discovery, selection and rewriting for both dependency groups
pub struct UpgradeOrchestrator<'a, S> {
    source: &'a dyn VersionSource,
    selector: S,
    rewriter: ConstraintRewriter,
    dry_run: bool,
    show_progress: bool,
}

impl<'a, S: Selector> UpgradeOrchestrator<'a, S> {
    pub fn new(source: &'a dyn VersionSource, selector: S) -> Self {
        Self {
            source,
            selector,
            rewriter: ConstraintRewriter::default(),
            dry_run: false,
            show_progress: false,
        }
    }

    /// Use a specific rewriter (builder pattern)
    pub fn with_rewriter(mut self, rewriter: ConstraintRewriter) -> Self {
        self.rewriter = rewriter;
        self
    }

    /// Skip the final write (builder pattern)
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Show progress while resolving (builder pattern)
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Discover, select and apply upgrades to `document` in memory
    pub async fn upgrade(
        &mut self,
        document: &mut ManifestDocument,
        runtime: &DependencyGroup,
        dev: &DependencyGroup,
    ) -> Result<RunReport, AppError> {
        let finder = UpgradeCandidateFinder::new(self.source).with_progress(self.show_progress);
        let runtime_search = finder.search(runtime).await;
        let dev_search = finder.search(dev).await;

        let sections = vec![
            ChoiceSection::new(Scope::Runtime, &runtime_search.upgradable),
            ChoiceSection::new(Scope::Development, &dev_search.upgradable),
        ];

        let mut report = RunReport {
            outcome: RunOutcome::UpToDate,
            misses: [runtime_search.misses, dev_search.misses].concat(),
            unbounded: [runtime_search.unbounded, dev_search.unbounded].concat(),
            written: false,
            dry_run: self.dry_run,
        };

        if sections.iter().all(ChoiceSection::is_empty) {
            debug!("every dependency is within its declared range");
            return Ok(report);
        }

        let selected = self.selector.select(&sections)?;
        if selected.is_empty() {
            debug!("no upgrade selected");
            report.outcome = RunOutcome::NoSelection;
            return Ok(report);
        }

        let applied = selected
            .into_iter()
            .map(|choice| {
                let fields = self.rewriter.apply_upgrade(
                    document,
                    choice.scope,
                    &choice.name,
                    &choice.new_version,
                    choice.environment.as_ref(),
                );
                AppliedUpgrade {
                    to: self.rewriter.render(&choice.constraint, &choice.new_version),
                    name: choice.name,
                    scope: choice.scope,
                    environment: choice.environment,
                    from: choice.constraint,
                    version: choice.new_version,
                    fields,
                }
            })
            .collect();

        report.outcome = RunOutcome::Applied(applied);
        Ok(report)
    }

    /// Read the manifest, upgrade it and write it back once
    pub async fn run(&mut self, store: &dyn ManifestStore) -> Result<RunReport, AppError> {
        let document = store.read()?;
        self.run_with_document(store, document).await
    }

    /// Upgrade a document already read from `store` and write it back once
    pub async fn run_with_document(
        &mut self,
        store: &dyn ManifestStore,
        mut document: ManifestDocument,
    ) -> Result<RunReport, AppError> {
        let runtime = document.dependency_group(Scope::Runtime);
        let dev = document.dependency_group(Scope::Development);
        debug!(
            runtime = runtime.len(),
            dev = dev.len(),
            "loaded dependencies from {}",
            document.path().display()
        );

        let mut report = self.upgrade(&mut document, &runtime, &dev).await?;

        if report.outcome.has_changes() && !self.dry_run {
            store.write(&document)?;
            report.written = true;
        } else if self.dry_run {
            info!("dry run, manifest left untouched");
        }

        Ok(report)
    }
}
