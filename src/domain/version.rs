//! Python package versions (PEP 440)
//!
//! Handles version formats like:
//! - Release: `1`, `1.2`, `1.2.3.4`
//! - Epoch: `1!2.0`
//! - Pre-release: `1.0a1`, `1.0.beta2`, `1.0rc1`
//! - Post-release: `1.0.post1`, `1.0-1`
//! - Dev-release: `1.0.dev3`
//! - Local label: `1.0+ubuntu1` (ignored for ordering)

use crate::error::VersionError;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^
        v?
        (?:(?P<epoch>\d+)!)?
        (?P<release>\d+(?:\.\d+)*)
        (?:[-_.]?(?P<pre_l>alpha|a|beta|b|preview|pre|rc|c)[-_.]?(?P<pre_n>\d+)?)?
        (?:-(?P<post_n1>\d+)|[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>\d+)?)?
        (?:[-_.]?(?P<dev_l>dev)[-_.]?(?P<dev_n>\d+)?)?
        (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
        $",
    )
    .unwrap()
});

/// Pre-release phase, ordered alpha < beta < release candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreReleaseKind {
    Alpha,
    Beta,
    ReleaseCandidate,
}

/// A pre-release marker such as `a1` or `rc2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreRelease {
    pub kind: PreReleaseKind,
    pub number: u64,
}

/// A published package version
///
/// The original text is kept so that rewritten constraints use the
/// spelling the index published (`^2.31.0`, not a normalized form).
#[derive(Debug, Clone)]
pub struct Version {
    text: String,
    epoch: u64,
    release: Vec<u64>,
    pre: Option<PreRelease>,
    post: Option<u64>,
    dev: Option<u64>,
}

impl Version {
    /// Parse a version string
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        let caps = VERSION_RE
            .captures(trimmed)
            .ok_or_else(|| VersionError::invalid_version(input))?;

        let number = |name: &str| -> Result<Option<u64>, VersionError> {
            caps.name(name)
                .map(|m| {
                    m.as_str()
                        .parse::<u64>()
                        .map_err(|_| VersionError::invalid_version(input))
                })
                .transpose()
        };

        let epoch = number("epoch")?.unwrap_or(0);

        let release = caps["release"]
            .split('.')
            .map(|s| s.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| VersionError::invalid_version(input))?;

        let pre = match caps.name("pre_l") {
            Some(label) => {
                let kind = match label.as_str().to_ascii_lowercase().as_str() {
                    "a" | "alpha" => PreReleaseKind::Alpha,
                    "b" | "beta" => PreReleaseKind::Beta,
                    _ => PreReleaseKind::ReleaseCandidate,
                };
                Some(PreRelease {
                    kind,
                    number: number("pre_n")?.unwrap_or(0),
                })
            }
            None => None,
        };

        let post = match (number("post_n1")?, caps.name("post_l")) {
            (Some(n), _) => Some(n),
            (None, Some(_)) => Some(number("post_n2")?.unwrap_or(0)),
            (None, None) => None,
        };

        let dev = match caps.name("dev_l") {
            Some(_) => Some(number("dev_n")?.unwrap_or(0)),
            None => None,
        };

        Ok(Self {
            text: trimmed.to_string(),
            epoch,
            release,
            pre,
            post,
            dev,
        })
    }

    /// Build a final release version from its segments
    pub fn from_release(release: Vec<u64>) -> Self {
        let text = release
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".");
        Self {
            text,
            epoch: 0,
            release,
            pre: None,
            post: None,
            dev: None,
        }
    }

    /// The version as written by its publisher
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Release segments (`[1, 2, 3]` for `1.2.3`)
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// Number of release segments written
    pub fn precision(&self) -> usize {
        self.release.len()
    }

    /// Release segment at `index`, zero when not written
    pub fn segment(&self, index: usize) -> u64 {
        self.release.get(index).copied().unwrap_or(0)
    }

    pub fn major(&self) -> u64 {
        self.segment(0)
    }

    pub fn minor(&self) -> u64 {
        self.segment(1)
    }

    pub fn patch(&self) -> u64 {
        self.segment(2)
    }

    pub fn pre(&self) -> Option<PreRelease> {
        self.pre
    }

    /// Returns true for pre-releases and dev releases
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    /// The first final release after this one that increments the segment
    /// at `index` (`1.2.3` bumped at 0 is `2.0.0`, at 1 is `1.3.0`)
    pub fn bump(&self, index: usize) -> Self {
        let mut release: Vec<u64> = (0..=index).map(|i| self.segment(i)).collect();
        release[index] += 1;
        while release.len() < 3 {
            release.push(0);
        }

        let mut bumped = Self::from_release(release);
        if self.epoch > 0 {
            bumped.text = format!("{}!{}", self.epoch, bumped.text);
            bumped.epoch = self.epoch;
        }
        bumped
    }

    /// Ordering slot: dev-only releases, then pre-releases, then finals
    fn pre_key(&self) -> (u8, Option<PreRelease>) {
        match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => (0, None),
            (Some(pre), _, _) => (1, Some(pre)),
            _ => (2, None),
        }
    }

    /// Dev releases sort before the same version without a dev marker
    fn dev_key(&self) -> (u8, u64) {
        match self.dev {
            Some(n) => (0, n),
            None => (1, 0),
        }
    }
}

fn compare_release(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let pa = a.get(i).copied().unwrap_or(0);
        let pb = b.get(i).copied().unwrap_or(0);
        match pa.cmp(&pb) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| compare_release(&self.release, &other.release))
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_release() {
        let version = v("2.31.0");
        assert_eq!(version.release(), &[2, 31, 0]);
        assert_eq!(version.major(), 2);
        assert_eq!(version.minor(), 31);
        assert_eq!(version.patch(), 0);
        assert_eq!(version.text(), "2.31.0");
        assert!(!version.is_prerelease());
    }

    #[test]
    fn test_parse_keeps_original_text() {
        assert_eq!(v("1.0RC1").text(), "1.0RC1");
        assert_eq!(v(" 3.2 ").text(), "3.2");
    }

    #[test]
    fn test_parse_prerelease_spellings() {
        assert_eq!(v("1.0a1").pre().unwrap().kind, PreReleaseKind::Alpha);
        assert_eq!(v("1.0.alpha.2").pre().unwrap().number, 2);
        assert_eq!(v("1.0b3").pre().unwrap().kind, PreReleaseKind::Beta);
        assert_eq!(
            v("1.0rc1").pre().unwrap().kind,
            PreReleaseKind::ReleaseCandidate
        );
        assert_eq!(
            v("1.0c1").pre().unwrap().kind,
            PreReleaseKind::ReleaseCandidate
        );
        assert!(v("1.0.dev0").is_prerelease());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("abc").is_err());
        assert!(Version::parse("1.2.*").is_err());
        assert!(Version::parse("^1.2").is_err());
    }

    #[test]
    fn test_trailing_zeros_are_insignificant() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("2"), v("2.0.0.0"));
    }

    #[test]
    fn test_ordering() {
        let ordered = [
            "1.0.dev0", "1.0a1", "1.0a2", "1.0b1", "1.0rc1", "1.0", "1.0.post1", "1.0.1", "1.1",
            "2.0", "1!0.1",
        ];
        for pair in ordered.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_dev_of_prerelease_sorts_before_prerelease() {
        assert!(v("1.0a1.dev1") < v("1.0a1"));
        assert!(v("1.0.post1.dev0") < v("1.0.post1"));
    }

    #[test]
    fn test_local_label_ignored_for_ordering() {
        assert_eq!(v("1.0+ubuntu1"), v("1.0"));
    }

    #[test]
    fn test_bump() {
        assert_eq!(v("1.2.3").bump(0).text(), "2.0.0");
        assert_eq!(v("1.2.3").bump(1).text(), "1.3.0");
        assert_eq!(v("0.0.3").bump(2).text(), "0.0.4");
        assert_eq!(v("1").bump(1).text(), "1.1.0");
        assert_eq!(v("1.2.3.4").bump(2).text(), "1.2.4");
        assert_eq!(v("2!1.0").bump(0).text(), "2!2.0.0");
    }

    #[test]
    fn test_serialize_as_text() {
        let json = serde_json::to_string(&v("2.31.0")).unwrap();
        assert_eq!(json, "\"2.31.0\"");
    }
}
