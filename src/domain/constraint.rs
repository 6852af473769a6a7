//! Poetry version constraints and their computed bounds
//!
//! Handles constraint formats like:
//! - Caret: `^1.2.3` (`>=1.2.3,<2.0.0`)
//! - Tilde: `~1.2.3` (`>=1.2.3,<1.3.0`)
//! - Compatible release: `~=1.2` (`>=1.2,<2.0`)
//! - Exact: `1.2.3`, `==1.2.3`
//! - Wildcard: `*`, `1.2.*`
//! - Comparison: `>=1.2`, `>1.2`, `<=2.0`, `<2.0`, `!=1.5`
//! - Intersections: `>=1.2,<2.0` or `>=1.2 <2.0`
//! - Unions: `^1.0 || ^2.0`

use super::Version;
use crate::error::VersionError;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<op>\^|~=|~|===|==|!=|>=|<=|>|<|=)?\s*(?P<version>[vV]?\d[^\s,|]*|\*)")
        .unwrap()
});

/// One end of a version range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub version: Version,
    pub inclusive: bool,
}

impl Bound {
    pub fn inclusive(version: Version) -> Self {
        Self {
            version,
            inclusive: true,
        }
    }

    pub fn exclusive(version: Version) -> Self {
        Self {
            version,
            inclusive: false,
        }
    }
}

/// Operator of a single-clause constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintOperator {
    Caret,
    Tilde,
    Compatible,
    Exact,
    GreaterOrEqual,
    Greater,
    LessOrEqual,
    Less,
    NotEqual,
    Wildcard,
}

/// A declared version constraint with its computed bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    raw: String,
    min: Option<Bound>,
    max: Option<Bound>,
    /// Operator and prefix as written, for single-clause constraints
    simple: Option<(ConstraintOperator, String)>,
}

impl VersionConstraint {
    /// The constraint that accepts every version (`*`)
    pub fn any() -> Self {
        Self {
            raw: "*".to_string(),
            min: None,
            max: None,
            simple: None,
        }
    }

    /// Parse a Poetry constraint string
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let raw = input.trim();
        if raw.is_empty() || raw == "*" {
            return Ok(Self {
                raw: raw.to_string(),
                ..Self::any()
            });
        }

        let normalized = raw.replace("||", "|");
        let mut members = Vec::new();
        for member in normalized.split('|') {
            members.push(parse_intersection(member, raw)?);
        }

        let simple = match members.as_slice() {
            [single] if single.clauses == 1 => single.simple.clone(),
            _ => None,
        };

        let mut members = members.into_iter();
        // split() always yields at least one member
        let first = members
            .next()
            .ok_or_else(|| VersionError::invalid_constraint(raw, "empty constraint"))?;
        let (min, max) = members.fold((first.min, first.max), |(min, max), member| {
            (looser_min(min, member.min), looser_max(max, member.max))
        });

        Ok(Self {
            raw: raw.to_string(),
            min,
            max,
            simple,
        })
    }

    /// The constraint as declared in the manifest
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn min(&self) -> Option<&Bound> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&Bound> {
        self.max.as_ref()
    }

    /// The lowest version the constraint can accept, if bounded below
    pub fn min_version(&self) -> Option<&Version> {
        self.min.as_ref().map(|b| &b.version)
    }

    /// Returns true when nothing caps the constraint from above
    pub fn is_unbounded_above(&self) -> bool {
        self.max.is_none()
    }

    /// Returns true when `version` lies strictly above the maximum bound.
    ///
    /// A version equal to the maximum never qualifies, inclusive or not.
    pub fn is_exceeded_by(&self, version: &Version) -> bool {
        match &self.max {
            Some(bound) => version > &bound.version,
            None => false,
        }
    }

    /// Operator of a single-clause constraint
    pub fn operator(&self) -> Option<ConstraintOperator> {
        self.simple.as_ref().map(|(op, _)| *op)
    }

    /// Caret constraint accepting `version` and compatible releases
    pub fn caret(version: &Version) -> String {
        format!("^{}", version.text())
    }

    /// Format `new_version` with this constraint's operator, when the
    /// operator can be carried over to a single new version
    pub fn format_updated(&self, new_version: &Version) -> Option<String> {
        let (op, prefix) = self.simple.as_ref()?;
        match op {
            ConstraintOperator::Caret
            | ConstraintOperator::Tilde
            | ConstraintOperator::Exact
            | ConstraintOperator::GreaterOrEqual => Some(format!("{}{}", prefix, new_version)),
            ConstraintOperator::Compatible if new_version.precision() >= 2 => {
                Some(format!("{}{}", prefix, new_version))
            }
            _ => None,
        }
    }
}

/// Bounds of one `|`-separated member
struct Intersection {
    min: Option<Bound>,
    max: Option<Bound>,
    clauses: usize,
    simple: Option<(ConstraintOperator, String)>,
}

fn parse_intersection(member: &str, raw: &str) -> Result<Intersection, VersionError> {
    let mut result = Intersection {
        min: None,
        max: None,
        clauses: 0,
        simple: None,
    };
    let mut last_end = 0;

    for caps in CLAUSE_RE.captures_iter(member) {
        let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
        if !is_separator(&member[last_end..whole.0]) {
            return Err(VersionError::invalid_constraint(
                raw,
                format!("unexpected '{}'", member[last_end..whole.0].trim()),
            ));
        }
        last_end = whole.1;

        let prefix = caps.name("op").map(|m| m.as_str()).unwrap_or("");
        let version = &caps["version"];
        let (op, min, max) = clause_bounds(prefix, version, raw)?;

        result.min = tighter_min(result.min, min);
        result.max = tighter_max(result.max, max);
        result.clauses += 1;
        result.simple = Some((op, prefix.to_string()));
    }

    if !is_separator(&member[last_end..]) {
        return Err(VersionError::invalid_constraint(
            raw,
            format!("unexpected '{}'", member[last_end..].trim()),
        ));
    }
    if result.clauses == 0 {
        return Err(VersionError::invalid_constraint(raw, "empty constraint"));
    }

    Ok(result)
}

fn is_separator(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || c == ',')
}

fn clause_bounds(
    prefix: &str,
    version: &str,
    raw: &str,
) -> Result<(ConstraintOperator, Option<Bound>, Option<Bound>), VersionError> {
    if version == "*" {
        return Ok((ConstraintOperator::Wildcard, None, None));
    }

    if let Some(stem) = version.strip_suffix(".*") {
        let stem = Version::parse(stem)
            .map_err(|_| VersionError::invalid_constraint(raw, "invalid wildcard"))?;
        return match prefix {
            "" | "=" | "==" => {
                let max = stem.bump(stem.precision() - 1);
                Ok((
                    ConstraintOperator::Wildcard,
                    Some(Bound::inclusive(stem)),
                    Some(Bound::exclusive(max)),
                ))
            }
            "!=" => Ok((ConstraintOperator::NotEqual, None, None)),
            _ => Err(VersionError::invalid_constraint(
                raw,
                format!("'{}' cannot be combined with a wildcard", prefix),
            )),
        };
    }

    let parsed = Version::parse(version)
        .map_err(|_| VersionError::invalid_constraint(raw, format!("invalid version '{}'", version)))?;

    let bounds = match prefix {
        "^" => {
            let index = if parsed.major() > 0 || parsed.precision() == 1 {
                0
            } else if parsed.minor() > 0 || parsed.precision() == 2 {
                1
            } else {
                2
            };
            let max = parsed.bump(index);
            (
                ConstraintOperator::Caret,
                Some(Bound::inclusive(parsed)),
                Some(Bound::exclusive(max)),
            )
        }
        "~" => {
            let index = if parsed.precision() == 1 { 0 } else { 1 };
            let max = parsed.bump(index);
            (
                ConstraintOperator::Tilde,
                Some(Bound::inclusive(parsed)),
                Some(Bound::exclusive(max)),
            )
        }
        "~=" => {
            let index = parsed.precision().saturating_sub(2);
            let max = parsed.bump(index);
            (
                ConstraintOperator::Compatible,
                Some(Bound::inclusive(parsed)),
                Some(Bound::exclusive(max)),
            )
        }
        "" | "=" | "==" | "===" => (
            ConstraintOperator::Exact,
            Some(Bound::inclusive(parsed.clone())),
            Some(Bound::inclusive(parsed)),
        ),
        ">=" => (
            ConstraintOperator::GreaterOrEqual,
            Some(Bound::inclusive(parsed)),
            None,
        ),
        ">" => (
            ConstraintOperator::Greater,
            Some(Bound::exclusive(parsed)),
            None,
        ),
        "<=" => (
            ConstraintOperator::LessOrEqual,
            None,
            Some(Bound::inclusive(parsed)),
        ),
        "<" => (ConstraintOperator::Less, None, Some(Bound::exclusive(parsed))),
        "!=" => (ConstraintOperator::NotEqual, None, None),
        other => {
            return Err(VersionError::invalid_constraint(
                raw,
                format!("unknown operator '{}'", other),
            ))
        }
    };

    Ok(bounds)
}

/// Higher of two lower bounds; exclusive wins a tie
fn tighter_min(a: Option<Bound>, b: Option<Bound>) -> Option<Bound> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if a.version > b.version {
            a
        } else if b.version > a.version {
            b
        } else if a.inclusive {
            b
        } else {
            a
        }),
        (a, b) => a.or(b),
    }
}

/// Lower of two upper bounds; exclusive wins a tie
fn tighter_max(a: Option<Bound>, b: Option<Bound>) -> Option<Bound> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if a.version < b.version {
            a
        } else if b.version < a.version {
            b
        } else if a.inclusive {
            b
        } else {
            a
        }),
        (a, b) => a.or(b),
    }
}

/// Lower of two lower bounds for a union; unbounded wins
fn looser_min(a: Option<Bound>, b: Option<Bound>) -> Option<Bound> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if a.version < b.version {
            a
        } else if b.version < a.version {
            b
        } else if a.inclusive {
            a
        } else {
            b
        }),
        _ => None,
    }
}

/// Higher of two upper bounds for a union; unbounded wins
fn looser_max(a: Option<Bound>, b: Option<Bound>) -> Option<Bound> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if a.version > b.version {
            a
        } else if b.version > a.version {
            b
        } else if a.inclusive {
            a
        } else {
            b
        }),
        _ => None,
    }
}

impl FromStr for VersionConstraint {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
