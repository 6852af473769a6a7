//! Format-preserving view of a Poetry `pyproject.toml`
//!
//! Handles:
//! - tool.poetry.dependencies (runtime scope)
//! - tool.poetry.dev-dependencies (development scope)
//! - tool.poetry.group.dev.dependencies (development scope, Poetry 1.2+)
//!
//! Entries are either a constraint string or one or more variant records
//! (inline table, table, array of inline tables, array of tables).

use crate::domain::{
    Dependency, DependencyGroup, DependencySource, EnvironmentKind, EnvironmentTag, GitReference,
    Scope, VersionConstraint,
};
use crate::error::ManifestError;
use std::fmt;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item, TableLike};
use tracing::warn;

/// Key holding the interpreter requirement, never a dependency
pub const PYTHON_KEY: &str = "python";

const RUNTIME_PATH: &[&str] = &["tool", "poetry", "dependencies"];
const LEGACY_DEV_PATH: &[&str] = &["tool", "poetry", "dev-dependencies"];
const GROUP_DEV_PATH: &[&str] = &["tool", "poetry", "group", "dev", "dependencies"];

const ARCHIVE_SUFFIXES: &[&str] = &[".whl", ".tar.gz", ".zip", ".tar.bz2", ".tgz"];

/// One record of a dependency declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    /// Version constraint, absent for pure git/path declarations
    pub version: Option<String>,
    pub environment: Option<EnvironmentTag>,
    pub source: DependencySource,
    pub allows_prereleases: bool,
}

impl VariantRecord {
    fn from_table(table: &dyn TableLike) -> Self {
        Self {
            version: get_str(table, "version").map(str::to_string),
            environment: environment_of(table),
            source: source_of(table),
            allows_prereleases: table
                .get("allow-prereleases")
                .and_then(Item::as_bool)
                .unwrap_or(false),
        }
    }
}

/// Shape of a dependency entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyEntry {
    /// `requests = "^2.20.0"`
    Scalar(String),
    /// `foo = [{ version = "^1.0", python = "~2.7" }, ...]` and single tables
    Variants(Vec<VariantRecord>),
}

impl DependencyEntry {
    /// Reads an entry, returning None for shapes that hold no dependency
    pub fn from_item(item: &Item) -> Option<Self> {
        if let Some(s) = item.as_str() {
            return Some(DependencyEntry::Scalar(s.to_string()));
        }

        if let Some(table) = item.as_table_like() {
            return Some(DependencyEntry::Variants(vec![VariantRecord::from_table(
                table,
            )]));
        }

        if let Some(array) = item.as_array() {
            let records = array
                .iter()
                .filter_map(|value| value.as_inline_table())
                .map(|table| VariantRecord::from_table(table))
                .collect();
            return Some(DependencyEntry::Variants(records));
        }

        if let Some(tables) = item.as_array_of_tables() {
            let records = tables
                .iter()
                .map(|table| VariantRecord::from_table(table))
                .collect();
            return Some(DependencyEntry::Variants(records));
        }

        None
    }
}

/// Parsed manifest keeping comments, ordering and quoting intact
#[derive(Debug, Clone)]
pub struct ManifestDocument {
    path: PathBuf,
    doc: DocumentMut,
}

impl ManifestDocument {
    /// Parse manifest content; `path` is used for error messages
    pub fn parse(content: &str, path: impl Into<PathBuf>) -> Result<Self, ManifestError> {
        let path = path.into();
        let doc: DocumentMut = content
            .parse()
            .map_err(|e: toml_edit::TomlError| ManifestError::toml_parse_error(&path, e.to_string()))?;

        let is_poetry = doc
            .get("tool")
            .and_then(|tool| tool.get("poetry"))
            .is_some_and(|poetry| poetry.is_table_like());
        if !is_poetry {
            return Err(ManifestError::NotPoetryProject { path });
        }

        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Key paths of the declared tables holding `scope`, in merge order.
    ///
    /// The development scope merges `dev-dependencies` with the `dev` group,
    /// as Poetry does.
    pub fn section_paths(&self, scope: Scope) -> Vec<&'static [&'static str]> {
        let candidates: &[&'static [&'static str]] = match scope {
            Scope::Runtime => &[RUNTIME_PATH],
            Scope::Development => &[LEGACY_DEV_PATH, GROUP_DEV_PATH],
        };
        candidates
            .iter()
            .copied()
            .filter(|path| self.lookup(path).is_some_and(Item::is_table_like))
            .collect()
    }

    /// The declared dependency tables of `scope`
    pub fn sections(&self, scope: Scope) -> Vec<&dyn TableLike> {
        self.section_paths(scope)
            .into_iter()
            .filter_map(|path| self.lookup(path).and_then(Item::as_table_like))
            .collect()
    }

    pub(crate) fn lookup_mut(&mut self, path: &[&str]) -> Option<&mut Item> {
        let mut item = self.doc.as_item_mut();
        for key in path {
            item = item.get_mut(key)?;
        }
        Some(item)
    }

    /// A table under `[tool]`, such as `[tool.poetry-upgrade]`
    pub fn tool_table(&self, name: &str) -> Option<&dyn TableLike> {
        self.lookup(&["tool", name]).and_then(Item::as_table_like)
    }

    /// The entry declared for `name` in `scope`
    pub fn entry(&self, scope: Scope, name: &str) -> Option<DependencyEntry> {
        if name == PYTHON_KEY {
            return None;
        }
        self.sections(scope)
            .into_iter()
            .find_map(|section| section.get(name))
            .and_then(DependencyEntry::from_item)
    }

    /// All entries of `scope` in document order
    pub fn entries(&self, scope: Scope) -> Vec<(String, DependencyEntry)> {
        self.sections(scope)
            .into_iter()
            .flat_map(|section| section.iter())
            .filter(|(name, _)| *name != PYTHON_KEY)
            .filter_map(|(name, item)| {
                DependencyEntry::from_item(item).map(|entry| (name.to_string(), entry))
            })
            .collect()
    }

    /// Dependencies of `scope`, one per variant record, in document order
    pub fn dependency_group(&self, scope: Scope) -> DependencyGroup {
        let mut group = DependencyGroup::new(scope);

        for (name, entry) in self.entries(scope) {
            match entry {
                DependencyEntry::Scalar(raw) => match VersionConstraint::parse(&raw) {
                    Ok(constraint) => group.push(Dependency::new(name, constraint)),
                    Err(e) => warn!(package = %name, scope = %scope, "skipping dependency: {}", e),
                },
                DependencyEntry::Variants(records) => {
                    for record in records {
                        let constraint = match record.version.as_deref() {
                            Some(raw) => match VersionConstraint::parse(raw) {
                                Ok(constraint) => constraint,
                                Err(e) => {
                                    warn!(package = %name, scope = %scope, "skipping dependency: {}", e);
                                    continue;
                                }
                            },
                            None => VersionConstraint::any(),
                        };

                        let mut dependency = Dependency::new(name.clone(), constraint)
                            .with_source(record.source)
                            .allowing_prereleases(record.allows_prereleases);
                        if let Some(environment) = record.environment {
                            dependency = dependency.with_environment(environment);
                        }
                        group.push(dependency);
                    }
                }
            }
        }

        group
    }

    fn lookup(&self, path: &[&str]) -> Option<&Item> {
        let mut item = self.doc.as_item();
        for key in path {
            item = item.get(key)?;
        }
        Some(item)
    }
}

impl fmt::Display for ManifestDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.doc)
    }
}

fn get_str<'a>(table: &'a dyn TableLike, key: &str) -> Option<&'a str> {
    table.get(key).and_then(Item::as_str)
}

/// The qualifier that tells variants of one dependency apart
pub(crate) fn environment_of(table: &dyn TableLike) -> Option<EnvironmentTag> {
    let tag = EnvironmentKind::all()
        .iter()
        .fold(EnvironmentTag::default(), |tag, kind| match get_str(table, kind.key()) {
            Some(value) => tag.with(*kind, value),
            None => tag,
        });
    (!tag.is_empty()).then_some(tag)
}

fn source_of(table: &dyn TableLike) -> DependencySource {
    if let Some(url) = get_str(table, "git") {
        let reference = get_str(table, "branch")
            .map(|b| GitReference::Branch(b.to_string()))
            .or_else(|| get_str(table, "tag").map(|t| GitReference::Tag(t.to_string())))
            .or_else(|| get_str(table, "rev").map(|r| GitReference::Rev(r.to_string())));
        return DependencySource::Vcs {
            url: url.to_string(),
            reference,
        };
    }

    if let Some(path) = get_str(table, "path") {
        let is_archive = ARCHIVE_SUFFIXES.iter().any(|suffix| path.ends_with(suffix));
        return if is_archive {
            DependencySource::File { path: path.into() }
        } else {
            DependencySource::Directory { path: path.into() }
        };
    }

    if let Some(url) = get_str(table, "url") {
        return DependencySource::File { path: url.into() };
    }

    DependencySource::Registry
}
