//! Import resolvers.
//!
//! An [`ImportResolver`] turns an import location into a compiled [`Dag`].
//! The compiler only ever talks to this trait, so callers pick where recipes
//! come from:
//!
//! - [`FileResolver`]: recipe files below a root directory
//! - [`MemoryResolver`]: a fixed table of sources, handy for tests and editors
//! - [`CachingResolver`]: compiles a [`SourceLoader`]'s recipes once per location
//! - [`NoImports`]: rejects every import
//!
//! Resolvers are shared by every import of a compilation and must be
//! `Send + Sync`.

use std::{
    collections::HashMap,
    fs, io,
    path::{Component, Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use indexmap::IndexMap;
use log::{debug, info};

use fiz_core::dag::Dag;

use crate::{
    elaborate::Builder,
    import::{ImportChain, ImportError, Reach},
};

/// Extension appended to file locations written without one.
pub const FILE_EXTENSION: &str = "fiz";

/// Source of imported recipes.
#[async_trait]
pub trait ImportResolver: Send + Sync {
    /// Produce the compiled dag for `location`.
    ///
    /// `chain` already ends with `location`; resolvers that compile source
    /// must pass it on so nested imports are checked against it.
    async fn resolve(&self, location: &str, chain: &ImportChain) -> Result<Dag, ImportError>;
}

/// Parse and compile the source of an import.
///
/// Nested imports go back through `resolver`. Warnings raised inside the
/// imported recipe are logged, not returned.
pub async fn compile_source(
    resolver: &dyn ImportResolver,
    location: &str,
    source: &str,
    chain: &ImportChain,
) -> Result<Dag, ImportError> {
    let recipe = fiz_parser::parse(source).map_err(|source| ImportError::Parse {
        location: location.to_string(),
        source,
    })?;
    let (dag, diagnostics) = Builder::new(resolver).build(&recipe, chain).await;
    debug!(location, warnings = diagnostics.len(); "Compiled import");
    Ok(dag)
}

/// Raw recipe text behind import locations.
///
/// Loaders only fetch source. [`CachingResolver`] compiles what they load,
/// and the bundled loaders also resolve imports on their own.
pub trait SourceLoader: Send + Sync {
    /// Fetch the recipe source stored at `location`.
    fn load(&self, location: &str) -> Result<String, ImportError>;
}

/// Resolves imports from a table of in-memory sources.
#[derive(Debug, Default, Clone)]
pub struct MemoryResolver {
    sources: IndexMap<String, String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `source` under `location`, replacing any previous entry.
    pub fn with_source(mut self, location: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(location, source);
        self
    }

    pub fn insert(&mut self, location: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(location.into(), source.into());
    }
}

impl SourceLoader for MemoryResolver {
    fn load(&self, location: &str) -> Result<String, ImportError> {
        self.sources
            .get(location)
            .cloned()
            .ok_or_else(|| ImportError::NotFound {
                location: location.to_string(),
            })
    }
}

#[async_trait]
impl ImportResolver for MemoryResolver {
    async fn resolve(&self, location: &str, chain: &ImportChain) -> Result<Dag, ImportError> {
        let source = self.load(location)?;
        compile_source(self, location, &source, chain).await
    }
}

/// Resolves imports from recipe files below a root directory.
///
/// `"pantry"` and `"pantry.fiz"` both read `<root>/pantry.fiz`. Locations
/// never leave the root: absolute paths and `..` segments are not found.
/// Files are read synchronously.
#[derive(Debug, Clone)]
pub struct FileResolver {
    root: PathBuf,
}

impl FileResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file a location refers to.
    ///
    /// # Errors
    ///
    /// [`ImportError::NotFound`] when the location points outside the root.
    pub fn path_for(&self, location: &str) -> Result<PathBuf, ImportError> {
        let relative = Path::new(location);
        let inside = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !inside {
            debug!(location; "Import location leaves the import root");
            return Err(ImportError::NotFound {
                location: location.to_string(),
            });
        }
        let mut path = self.root.join(relative);
        if path.extension().is_none() {
            path.set_extension(FILE_EXTENSION);
        }
        Ok(path)
    }
}

impl SourceLoader for FileResolver {
    fn load(&self, location: &str) -> Result<String, ImportError> {
        let path = self.path_for(location)?;
        debug!(location, path:? = path; "Reading import");
        fs::read_to_string(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => ImportError::NotFound {
                location: location.to_string(),
            },
            _ => ImportError::Io {
                location: location.to_string(),
                source: err,
            },
        })
    }
}

#[async_trait]
impl ImportResolver for FileResolver {
    async fn resolve(&self, location: &str, chain: &ImportChain) -> Result<Dag, ImportError> {
        let source = self.load(location)?;
        compile_source(self, location, &source, chain).await
    }
}

/// Compiles the sources of a [`SourceLoader`] and memoizes the result.
///
/// Nested imports of a cached recipe go through the same cache. Every hit
/// hands out a deep copy with fresh ids, so two imports of the same location
/// never share element ids.
///
/// A compilation is only reused where compiling again would give the same
/// dag: recipes with an import cut as a cycle or for depth are never stored,
/// and a stored recipe is skipped when the current chain already holds one
/// of its imports or lacks the depth they need. Failures are not cached.
#[derive(Debug)]
pub struct CachingResolver<L> {
    loader: L,
    cache: Mutex<HashMap<String, (Dag, Reach)>>,
}

impl<L: SourceLoader> CachingResolver<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Number of memoized locations.
    pub fn len(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, location: &str, chain: &ImportChain) -> Option<(Dag, Reach)> {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache
            .get(location)
            .filter(|(_, reach)| reach.fits(chain))
            .map(|(dag, reach)| (dag.with_fresh_ids(), reach.clone()))
    }

    fn store(&self, location: &str, dag: &Dag, reach: Reach) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.insert(location.to_string(), (dag.with_fresh_ids(), reach));
    }
}

#[async_trait]
impl<L: SourceLoader> ImportResolver for CachingResolver<L> {
    async fn resolve(&self, location: &str, chain: &ImportChain) -> Result<Dag, ImportError> {
        if let Some((dag, reach)) = self.cached(location, chain) {
            debug!(location; "Import cache hit");
            chain.record_reuse(&reach);
            return Ok(dag);
        }
        let source = self.loader.load(location)?;
        let dag = compile_source(self, location, &source, chain).await?;
        let reach = chain.reach();
        if reach.is_truncated() {
            debug!(location; "Import depends on its chain, not cached");
        } else {
            self.store(location, &dag, reach);
            info!(location; "Import cached");
        }
        Ok(dag)
    }
}

/// Rejects every import.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImports;

#[async_trait]
impl ImportResolver for NoImports {
    async fn resolve(&self, location: &str, _chain: &ImportChain) -> Result<Dag, ImportError> {
        Err(ImportError::Unsupported {
            location: location.to_string(),
        })
    }
}
