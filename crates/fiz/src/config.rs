//! Configuration types for Fiz compilation.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file; every field has a default, so an empty file is valid.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level application configuration.
//! - [`ImportConfig`] - Where imports are read from and how deep they may nest.
//!
//! # Example
//!
//! ```
//! # use fiz::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.imports().max_depth(), 16);
//! assert!(config.imports().cache());
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::import::DEFAULT_MAX_DEPTH;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Import configuration section.
    #[serde(default)]
    imports: ImportConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the given import configuration.
    pub fn new(imports: ImportConfig) -> Self {
        Self { imports }
    }

    /// Returns the import configuration.
    pub fn imports(&self) -> &ImportConfig {
        &self.imports
    }
}

/// Import resolution settings.
///
/// ```toml
/// [imports]
/// root = "recipes"
/// max_depth = 8
/// cache = false
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// Directory that import locations are relative to. Unset means the
    /// current directory, or the input file's directory in the CLI.
    #[serde(default)]
    root: Option<PathBuf>,

    /// Longest chain of nested imports accepted.
    #[serde(default = "default_max_depth")]
    max_depth: usize,

    /// Whether compiled imports are memoized per location.
    #[serde(default = "default_cache")]
    cache: bool,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_cache() -> bool {
    true
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            root: None,
            max_depth: default_max_depth(),
            cache: default_cache(),
        }
    }
}

impl ImportConfig {
    /// Creates a new [`ImportConfig`].
    ///
    /// # Arguments
    ///
    /// * `root` - Directory import locations are relative to.
    /// * `max_depth` - Longest accepted chain of nested imports.
    /// * `cache` - Whether compiled imports are memoized.
    pub fn new(root: Option<PathBuf>, max_depth: usize, cache: bool) -> Self {
        Self {
            root,
            max_depth,
            cache,
        }
    }

    /// Returns a copy with `root` as the import directory.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Returns the configured import directory, if any.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn cache(&self) -> bool {
        self.cache
    }
}
