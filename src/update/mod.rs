//! Upgrade candidate discovery
//!
//! For every declared dependency the newest version available from its
//! source is resolved, and the dependency is offered for upgrade only when
//! that version lies strictly above the declared maximum bound.

use crate::domain::{Dependency, DependencyGroup, EnvironmentTag, Scope, UpgradePair};
use crate::progress::Progress;
use crate::registry::VersionSource;
use serde::Serialize;
use tracing::{debug, warn};

/// A dependency whose candidate could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionMiss {
    pub name: String,
    pub scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentTag>,
    pub reason: String,
}

/// Outcome of checking one dependency group
#[derive(Debug, Clone, Default)]
pub struct CandidateSearch {
    /// Upgradable dependencies in declaration order
    pub upgradable: Vec<UpgradePair>,
    /// Dependencies excluded because resolution failed
    pub misses: Vec<ResolutionMiss>,
    /// Dependencies without a maximum bound, never upgradable
    pub unbounded: Vec<Dependency>,
}

/// Finds dependencies whose newest version exceeds their declared range
pub struct UpgradeCandidateFinder<'a> {
    source: &'a dyn VersionSource,
    show_progress: bool,
}

impl<'a> UpgradeCandidateFinder<'a> {
    pub fn new(source: &'a dyn VersionSource) -> Self {
        Self {
            source,
            show_progress: false,
        }
    }

    /// Show a progress bar while resolving (builder pattern)
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Upgradable pairs of `group`, in declaration order
    pub async fn find_upgradable(&self, group: &DependencyGroup) -> Vec<UpgradePair> {
        self.search(group).await.upgradable
    }

    /// Check every dependency of `group` one at a time
    pub async fn search(&self, group: &DependencyGroup) -> CandidateSearch {
        let mut result = CandidateSearch::default();
        let mut progress = Progress::new(self.show_progress && !group.is_empty());
        progress.start(
            group.len() as u64,
            &format!("Checking {}", group.scope().label()),
        );

        for dependency in group.iter() {
            progress.set_message(&format!("Checking {}", dependency.name));

            if dependency.constraint.is_unbounded_above() {
                debug!(package = %dependency.name, constraint = %dependency.constraint, "no upper bound, skipping");
                result.unbounded.push(dependency.clone());
                progress.inc();
                continue;
            }

            match self.source.resolve_latest(dependency).await {
                Ok(candidate) => {
                    debug!(
                        package = %dependency.name,
                        source = dependency.source.kind_name(),
                        latest = %candidate.version,
                        "resolved candidate"
                    );
                    if let Some(pair) = UpgradePair::new(dependency.clone(), candidate) {
                        result.upgradable.push(pair);
                    }
                }
                Err(e) => {
                    warn!(package = %dependency.name, "excluding dependency: {}", e);
                    result.misses.push(ResolutionMiss {
                        name: dependency.name.clone(),
                        scope: group.scope(),
                        environment: dependency.environment.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            progress.inc();
        }

        progress.finish_and_clear();
        result
    }
}
