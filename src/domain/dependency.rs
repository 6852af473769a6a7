//! Dependency information structures

use super::VersionConstraint;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Dependency scope of a Poetry project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Scope {
    /// `[tool.poetry.dependencies]`
    #[serde(rename = "dependencies")]
    Runtime,
    /// `[tool.poetry.dev-dependencies]` or the `dev` group
    #[serde(rename = "devDependencies")]
    Development,
}

impl Scope {
    /// Returns all scopes in display order
    pub fn all() -> &'static [Scope] {
        &[Scope::Runtime, Scope::Development]
    }

    /// Section label shown to the operator
    pub fn label(&self) -> &'static str {
        match self {
            Scope::Runtime => "dependencies",
            Scope::Development => "devDependencies",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A key of a variant record that restricts its environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentKind {
    Python,
    Platform,
    Markers,
}

impl EnvironmentKind {
    /// Returns all kinds in display order
    pub fn all() -> &'static [EnvironmentKind] {
        &[
            EnvironmentKind::Python,
            EnvironmentKind::Platform,
            EnvironmentKind::Markers,
        ]
    }

    /// Manifest key holding the qualifier
    pub fn key(&self) -> &'static str {
        match self {
            EnvironmentKind::Python => "python",
            EnvironmentKind::Platform => "platform",
            EnvironmentKind::Markers => "markers",
        }
    }
}

/// Environment qualifiers of one variant of a dependency declaration.
///
/// Two tags are equal only when every qualifier matches, so variants that
/// share a `python` range but differ in `markers` stay distinct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct EnvironmentTag {
    #[serde(skip_serializing_if = "Option::is_none")]
    python: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    markers: Option<String>,
}

impl EnvironmentTag {
    /// Tag with a single qualifier
    pub fn new(kind: EnvironmentKind, value: impl AsRef<str>) -> Self {
        Self::default().with(kind, value)
    }

    /// Tag for a `python = "..."` qualifier
    pub fn python(value: impl AsRef<str>) -> Self {
        Self::new(EnvironmentKind::Python, value)
    }

    /// Adds or replaces a qualifier (builder pattern)
    pub fn with(mut self, kind: EnvironmentKind, value: impl AsRef<str>) -> Self {
        *self.slot(kind) = Some(value.as_ref().trim().to_string());
        self
    }

    /// The value of one qualifier
    pub fn get(&self, kind: EnvironmentKind) -> Option<&str> {
        match kind {
            EnvironmentKind::Python => self.python.as_deref(),
            EnvironmentKind::Platform => self.platform.as_deref(),
            EnvironmentKind::Markers => self.markers.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        EnvironmentKind::all().iter().all(|kind| self.get(*kind).is_none())
    }

    fn slot(&mut self, kind: EnvironmentKind) -> &mut Option<String> {
        match kind {
            EnvironmentKind::Python => &mut self.python,
            EnvironmentKind::Platform => &mut self.platform,
            EnvironmentKind::Markers => &mut self.markers,
        }
    }
}

impl fmt::Display for EnvironmentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for kind in EnvironmentKind::all() {
            if let Some(value) = self.get(*kind) {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{} {}", kind.key(), value)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Git reference pinned by a VCS dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitReference {
    Branch(String),
    Tag(String),
    Rev(String),
}

/// Where a dependency is fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencySource {
    /// Package index (PyPI or compatible)
    Registry,
    /// Git repository
    Vcs {
        url: String,
        reference: Option<GitReference>,
    },
    /// Local or remote archive (wheel or sdist)
    File { path: PathBuf },
    /// Local project directory
    Directory { path: PathBuf },
}

impl DependencySource {
    /// Short name for display and logging
    pub fn kind_name(&self) -> &'static str {
        match self {
            DependencySource::Registry => "registry",
            DependencySource::Vcs { .. } => "vcs",
            DependencySource::File { .. } => "file",
            DependencySource::Directory { .. } => "directory",
        }
    }
}

/// Represents a declared dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Package name as declared
    pub name: String,
    /// Declared version constraint
    pub constraint: VersionConstraint,
    /// Source kind
    pub source: DependencySource,
    /// Environment qualifier when the declaration is one of several variants
    pub environment: Option<EnvironmentTag>,
    /// Whether pre-releases may be proposed
    pub allows_prereleases: bool,
}

impl Dependency {
    /// Creates a registry dependency
    pub fn new(name: impl Into<String>, constraint: VersionConstraint) -> Self {
        Self {
            name: name.into(),
            constraint,
            source: DependencySource::Registry,
            environment: None,
            allows_prereleases: false,
        }
    }

    /// Sets the source kind (builder pattern)
    pub fn with_source(mut self, source: DependencySource) -> Self {
        self.source = source;
        self
    }

    /// Sets the environment qualifier (builder pattern)
    pub fn with_environment(mut self, environment: EnvironmentTag) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Allows pre-release candidates (builder pattern)
    pub fn allowing_prereleases(mut self, allow: bool) -> Self {
        self.allows_prereleases = allow;
        self
    }

    /// The constraint as written in the manifest
    pub fn pretty_constraint(&self) -> &str {
        self.constraint.raw()
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.constraint)?;
        if let Some(ref environment) = self.environment {
            write!(f, " ({})", environment)?;
        }
        Ok(())
    }
}

/// Ordered dependencies of one scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGroup {
    scope: Scope,
    dependencies: Vec<Dependency>,
}

impl DependencyGroup {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(scope: Scope, dependencies: Vec<Dependency>) -> Self {
        Self {
            scope,
            dependencies,
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn push(&mut self, dependency: Dependency) {
        self.dependencies.push(dependency);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter()
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}
