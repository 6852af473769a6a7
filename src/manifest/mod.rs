//! Poetry manifest handling
//!
//! This module provides functionality to:
//! - Locate, read and atomically write `pyproject.toml`
//! - Extract the runtime and development dependency groups
//! - Rewrite version constraints without disturbing the rest of the file

mod document;
mod rewriter;
mod store;

pub use document::{DependencyEntry, ManifestDocument, VariantRecord, PYTHON_KEY};
pub use rewriter::{ConstraintRewriter, RewriteStrategy};
pub use store::{FileManifestStore, ManifestStore, MANIFEST_FILENAME};
