//! poetry-upgrade - Interactive upgrade of Poetry dependency constraints
//!
//! This library provides the pieces of the `poetry-upgrade` command:
//! - Version and constraint semantics (domain)
//! - Format-preserving pyproject.toml reading and rewriting (manifest)
//! - Latest version resolution from PyPI, git, and local paths (registry)
//! - Upgrade discovery, selection, and orchestration

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod registry;
pub mod selection;
pub mod update;
