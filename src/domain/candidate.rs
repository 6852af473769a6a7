//! Resolved candidates and upgrade pairs

use super::{Dependency, Version};
use std::fmt;

/// A concrete version resolved for a dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Display name of the resolved package
    pub name: String,
    /// Resolved version
    pub version: Version,
}

impl Candidate {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// The version as published
    pub fn pretty_version(&self) -> &str {
        self.version.text()
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// A dependency together with a candidate above its declared maximum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradePair {
    dependency: Dependency,
    candidate: Candidate,
}

impl UpgradePair {
    /// Pairs the two when the candidate lies strictly above the declared
    /// maximum bound; returns None otherwise
    pub fn new(dependency: Dependency, candidate: Candidate) -> Option<Self> {
        if dependency.constraint.is_exceeded_by(&candidate.version) {
            Some(Self {
                dependency,
                candidate,
            })
        } else {
            None
        }
    }

    pub fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }
}

impl fmt::Display for UpgradePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ❯ {}",
            self.dependency.name,
            self.dependency.pretty_constraint(),
            self.candidate.pretty_version()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VersionConstraint;

    fn dep(name: &str, constraint: &str) -> Dependency {
        Dependency::new(name, VersionConstraint::parse(constraint).unwrap())
    }

    fn candidate(name: &str, version: &str) -> Candidate {
        Candidate::new(name, Version::parse(version).unwrap())
    }

    #[test]
    fn test_pair_requires_version_above_max() {
        let pair = UpgradePair::new(dep("requests", "^1.20.0"), candidate("requests", "2.31.0"));
        let pair = pair.unwrap();
        assert_eq!(pair.candidate().pretty_version(), "2.31.0");
        assert_eq!(pair.dependency().name, "requests");
    }

    #[test]
    fn test_pair_rejects_version_equal_to_max() {
        assert!(UpgradePair::new(dep("requests", "^2.20.0"), candidate("requests", "3.0.0")).is_none());
        assert!(UpgradePair::new(dep("attrs", "<=22.1"), candidate("attrs", "22.1")).is_none());
    }

    #[test]
    fn test_pair_rejects_version_inside_range() {
        assert!(UpgradePair::new(dep("requests", "^2.20.0"), candidate("requests", "2.31.0")).is_none());
    }

    #[test]
    fn test_pair_rejects_unbounded_constraint() {
        assert!(UpgradePair::new(dep("django", ">=3.0"), candidate("django", "5.0")).is_none());
    }

    #[test]
    fn test_pair_display() {
        let pair = UpgradePair::new(dep("requests", "^1.20.0"), candidate("requests", "2.31.0")).unwrap();
        assert_eq!(pair.to_string(), "requests ^1.20.0 ❯ 2.31.0");
    }
}
