//! Core domain models for poetry-upgrade
//!
//! This module contains the fundamental types used throughout the application:
//! - PEP 440 versions with a total order
//! - Poetry version constraints with computed minimum and maximum bounds
//! - Dependency information structures and dependency groups
//! - Resolved candidates and upgrade pairs

mod candidate;
mod constraint;
mod dependency;
mod version;

pub use candidate::{Candidate, UpgradePair};
pub use constraint::{Bound, ConstraintOperator, VersionConstraint};
pub use dependency::{
    Dependency, DependencyGroup, DependencySource, EnvironmentKind, EnvironmentTag, GitReference,
    Scope,
};
pub use version::{PreRelease, PreReleaseKind, Version};
