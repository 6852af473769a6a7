//! Constraint rewriting on the in-memory manifest
//!
//! Only the `version` strings of the approved entry are replaced. Keys,
//! ordering, comments and records for other environments stay as they are.

use super::document::{environment_of, ManifestDocument, PYTHON_KEY};
use crate::domain::{EnvironmentTag, Scope, Version, VersionConstraint};
use crate::error::ConfigError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use toml_edit::{Item, TableLike, Value};
use tracing::{debug, warn};

/// How a new constraint is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RewriteStrategy {
    /// Always `^<new version>`
    #[default]
    Caret,
    /// Keep a simple operator (`~`, `==`, `>=`, ...) and fall back to caret
    #[serde(rename = "preserve")]
    PreserveOperator,
}

impl FromStr for RewriteStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "caret" => Ok(RewriteStrategy::Caret),
            "preserve" => Ok(RewriteStrategy::PreserveOperator),
            _ => Err(ConfigError::InvalidStrategy {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RewriteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewriteStrategy::Caret => write!(f, "caret"),
            RewriteStrategy::PreserveOperator => write!(f, "preserve"),
        }
    }
}

/// Applies approved upgrades to a manifest document
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintRewriter {
    strategy: RewriteStrategy,
}

impl ConstraintRewriter {
    pub fn new(strategy: RewriteStrategy) -> Self {
        Self { strategy }
    }

    /// The constraint that replaces `old` for `new_version`
    pub fn render(&self, old: &str, new_version: &Version) -> String {
        match self.strategy {
            RewriteStrategy::Caret => VersionConstraint::caret(new_version),
            RewriteStrategy::PreserveOperator => VersionConstraint::parse(old)
                .ok()
                .and_then(|constraint| constraint.format_updated(new_version))
                .unwrap_or_else(|| VersionConstraint::caret(new_version)),
        }
    }

    /// Rewrite the entry `name` of `scope` for `new_version`.
    ///
    /// Variant records tagged for another environment than `environment`
    /// are left alone. Returns the number of version fields rewritten.
    pub fn apply_upgrade(
        &self,
        document: &mut ManifestDocument,
        scope: Scope,
        name: &str,
        new_version: &Version,
        environment: Option<&EnvironmentTag>,
    ) -> usize {
        if name == PYTHON_KEY {
            return 0;
        }

        let mut found = false;
        let mut rewritten = 0;
        for path in document.section_paths(scope) {
            let Some(item) = document
                .lookup_mut(path)
                .and_then(|section| section.get_mut(name))
            else {
                continue;
            };
            found = true;
            rewritten += self.rewrite_item(item, new_version, environment);
        }

        if !found {
            warn!(package = %name, scope = %scope, "no manifest entry to rewrite");
        } else if rewritten == 0 {
            warn!(package = %name, scope = %scope, "no matching version field to rewrite");
        }
        rewritten
    }

    fn rewrite_item(
        &self,
        item: &mut Item,
        new_version: &Version,
        environment: Option<&EnvironmentTag>,
    ) -> usize {
        match item {
            Item::Value(value @ Value::String(_)) => self.replace_string(value, new_version),
            Item::Value(Value::InlineTable(table)) => {
                self.rewrite_record(table, new_version, environment)
            }
            Item::Value(Value::Array(array)) => array
                .iter_mut()
                .filter_map(Value::as_inline_table_mut)
                .map(|table| self.rewrite_record(table, new_version, environment))
                .sum(),
            Item::Table(table) => self.rewrite_record(table, new_version, environment),
            Item::ArrayOfTables(tables) => tables
                .iter_mut()
                .map(|table| self.rewrite_record(table, new_version, environment))
                .sum(),
            _ => 0,
        }
    }

    fn rewrite_record(
        &self,
        record: &mut dyn TableLike,
        new_version: &Version,
        environment: Option<&EnvironmentTag>,
    ) -> usize {
        if let Some(tag) = environment_of(&*record) {
            if environment != Some(&tag) {
                debug!(environment = %tag, "leaving variant for another environment");
                return 0;
            }
        }

        match record.get_mut("version").and_then(Item::as_value_mut) {
            Some(value) => self.replace_string(value, new_version),
            None => 0,
        }
    }

    fn replace_string(&self, value: &mut Value, new_version: &Version) -> usize {
        let Some(old) = value.as_str() else {
            return 0;
        };
        let updated = self.render(old, new_version);
        debug!(old = %old, new = %updated, "rewriting constraint");

        let decor = value.decor().clone();
        *value = Value::from(updated);
        *value.decor_mut() = decor;
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EnvironmentKind;

    const MANIFEST: &str = r#"[tool.poetry]
name = "demo"

[tool.poetry.dependencies]
python = "^3.8"
requests = "^2.20.0"  # http
foo = [
    { version = "^1.0", python = "~2.7" },
    { version = "^2.0", python = "^3.5" },
]
bar = { version = "~1.2", extras = ["cli"] }
mylib = { git = "https://example.com/mylib.git" }
"#;

    fn doc() -> ManifestDocument {
        ManifestDocument::parse(MANIFEST, "pyproject.toml").unwrap()
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_scalar_entry_becomes_caret() {
        let mut doc = doc();
        let n = ConstraintRewriter::default().apply_upgrade(
            &mut doc,
            Scope::Runtime,
            "requests",
            &v("2.31.0"),
            None,
        );
        assert_eq!(n, 1);
        assert_eq!(
            doc.to_string(),
            MANIFEST.replace(r#"requests = "^2.20.0""#, r#"requests = "^2.31.0""#)
        );
    }

    #[test]
    fn test_only_matching_variant_is_rewritten() {
        let mut doc = doc();
        let tag = EnvironmentTag::python("^3.5");
        let n = ConstraintRewriter::default().apply_upgrade(
            &mut doc,
            Scope::Runtime,
            "foo",
            &v("2.5.0"),
            Some(&tag),
        );
        assert_eq!(n, 1);
        assert_eq!(
            doc.to_string(),
            MANIFEST.replace(
                r#"{ version = "^2.0", python = "^3.5" }"#,
                r#"{ version = "^2.5.0", python = "^3.5" }"#
            )
        );
    }

    #[test]
    fn test_untagged_upgrade_skips_tagged_variants() {
        let mut doc = doc();
        let n = ConstraintRewriter::default().apply_upgrade(
            &mut doc,
            Scope::Runtime,
            "foo",
            &v("3.0.0"),
            None,
        );
        assert_eq!(n, 0);
        assert_eq!(doc.to_string(), MANIFEST);
    }

    #[test]
    fn test_tag_kind_must_match() {
        let mut doc = doc();
        let tag = EnvironmentTag::new(EnvironmentKind::Platform, "^3.5");
        let n = ConstraintRewriter::default().apply_upgrade(
            &mut doc,
            Scope::Runtime,
            "foo",
            &v("2.5.0"),
            Some(&tag),
        );
        assert_eq!(n, 0);
    }

    #[test]
    fn test_variants_sharing_python_are_told_apart_by_markers() {
        const SPLIT: &str = r#"[tool.poetry]

[tool.poetry.dependencies]
foo = [
    { version = "^1.0", python = "^3.8", markers = "sys_platform == 'linux'" },
    { version = "^0.5", python = "^3.8", markers = "sys_platform == 'win32'" },
]
"#;
        let mut doc = ManifestDocument::parse(SPLIT, "pyproject.toml").unwrap();
        let linux = doc
            .dependency_group(Scope::Runtime)
            .iter()
            .next()
            .and_then(|dep| dep.environment.clone())
            .unwrap();

        let n = ConstraintRewriter::default().apply_upgrade(
            &mut doc,
            Scope::Runtime,
            "foo",
            &v("2.0.0"),
            Some(&linux),
        );
        assert_eq!(n, 1);
        assert_eq!(
            doc.to_string(),
            SPLIT.replace(
                r#"{ version = "^1.0", python = "^3.8""#,
                r#"{ version = "^2.0.0", python = "^3.8""#
            )
        );
    }

    #[test]
    fn test_dev_entry_in_group_table_is_rewritten() {
        const MERGED: &str = "[tool.poetry]\n\n[tool.poetry.dev-dependencies]\npytest = \"^6.0\"\n\n[tool.poetry.group.dev.dependencies]\nblack = \"^22.0\"\n";
        let mut doc = ManifestDocument::parse(MERGED, "pyproject.toml").unwrap();
        let n = ConstraintRewriter::default().apply_upgrade(
            &mut doc,
            Scope::Development,
            "black",
            &v("24.1.0"),
            None,
        );
        assert_eq!(n, 1);
        assert_eq!(
            doc.to_string(),
            MERGED.replace("black = \"^22.0\"", "black = \"^24.1.0\"")
        );
    }

    #[test]
    fn test_inline_table_keeps_other_keys() {
        let mut doc = doc();
        ConstraintRewriter::default().apply_upgrade(
            &mut doc,
            Scope::Runtime,
            "bar",
            &v("2.0.1"),
            None,
        );
        assert!(doc
            .to_string()
            .contains(r#"bar = { version = "^2.0.1", extras = ["cli"] }"#));
    }

    #[test]
    fn test_record_without_version_is_untouched() {
        let mut doc = doc();
        let n = ConstraintRewriter::default().apply_upgrade(
            &mut doc,
            Scope::Runtime,
            "mylib",
            &v("1.0.0"),
            None,
        );
        assert_eq!(n, 0);
        assert_eq!(doc.to_string(), MANIFEST);
    }

    #[test]
    fn test_python_key_and_missing_entries_are_ignored() {
        let mut doc = doc();
        let rewriter = ConstraintRewriter::default();
        assert_eq!(
            rewriter.apply_upgrade(&mut doc, Scope::Runtime, "python", &v("3.12"), None),
            0
        );
        assert_eq!(
            rewriter.apply_upgrade(&mut doc, Scope::Runtime, "missing", &v("1.0"), None),
            0
        );
        assert_eq!(
            rewriter.apply_upgrade(&mut doc, Scope::Development, "requests", &v("3.0.1"), None),
            0
        );
        assert_eq!(doc.to_string(), MANIFEST);
    }

    #[test]
    fn test_preserve_strategy_keeps_operator() {
        let mut doc = doc();
        let rewriter = ConstraintRewriter::new(RewriteStrategy::PreserveOperator);
        rewriter.apply_upgrade(&mut doc, Scope::Runtime, "bar", &v("1.4.0"), None);
        assert!(doc.to_string().contains(r#"version = "~1.4.0""#));
    }

    #[test]
    fn test_render() {
        let caret = ConstraintRewriter::new(RewriteStrategy::Caret);
        assert_eq!(caret.render("~1.2", &v("1.4.0")), "^1.4.0");
        assert_eq!(caret.render("==1.0", &v("2.0")), "^2.0");

        let preserve = ConstraintRewriter::new(RewriteStrategy::PreserveOperator);
        assert_eq!(preserve.render("==1.0", &v("2.0")), "==2.0");
        assert_eq!(preserve.render(">=1.0,<2.0", &v("2.1")), "^2.1");
        assert_eq!(preserve.render("<2.0", &v("2.1")), "^2.1");
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("caret".parse::<RewriteStrategy>().unwrap(), RewriteStrategy::Caret);
        assert_eq!(
            "Preserve".parse::<RewriteStrategy>().unwrap(),
            RewriteStrategy::PreserveOperator
        );
        assert!("tilde".parse::<RewriteStrategy>().is_err());
        assert_eq!(RewriteStrategy::PreserveOperator.to_string(), "preserve");
    }
}
