//! Import coordination.
//!
//! Every import statement goes through [`fetch`], which checks the in-flight
//! [`ImportChain`] before delegating to the [`ImportResolver`]. The chain is
//! passed down by value: each branch of the import tree extends its own copy,
//! so sibling imports of the same location are fine while an import of a
//! location already being compiled further up fails fast.
//!
//! Each entered location also gets a [`Reach`] record shared by every copy of
//! the chain below it. Caching resolvers use it to tell whether a compiled
//! recipe depends on the chain it was compiled under.
//!
//! Imported dags end up in the importer in one of two ways:
//!
//! - [`adopt`]: attached as a named child level (`name @ "loc"`, or any import
//!   on the right-hand side of an assignment)
//! - [`absorb`]: merged into the importing level (bare `@ "loc"`)

use std::{
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use indexmap::IndexSet;
use log::debug;
use thiserror::Error;

use fiz_core::{dag::Dag, identifier::Id};
use fiz_parser::error::{ErrorCode, ParseError};

use crate::resolver::ImportResolver;

/// Longest accepted chain of nested imports unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Errors raised while importing another recipe.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cyclic import: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    #[error("import of `{location}` exceeds the maximum depth of {max_depth}")]
    DepthExceeded { location: String, max_depth: usize },

    #[error("import `{location}` not found")]
    NotFound { location: String },

    #[error("failed to read import `{location}`: {source}")]
    Io {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("import `{location}` failed to parse: {source}")]
    Parse {
        location: String,
        #[source]
        source: ParseError,
    },

    #[error("imports are not supported here (`{location}`)")]
    Unsupported { location: String },
}

impl ImportError {
    /// Error code of the warning reported for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Cycle { .. } => ErrorCode::E305,
            Self::DepthExceeded { .. } => ErrorCode::E306,
            Self::NotFound { .. } | Self::Io { .. } | Self::Parse { .. } | Self::Unsupported { .. } => {
                ErrorCode::E304
            }
        }
    }
}

/// What the compilation of one import location reached below it.
#[derive(Debug, Default, Clone)]
pub struct Reach {
    locations: IndexSet<String>,
    height: usize,
    truncated: bool,
}

impl Reach {
    /// Every location imported below, directly or not.
    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.locations.iter().map(String::as_str)
    }

    /// Longest run of nested imports below.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether some import below failed as a cycle or for depth.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Whether compiling under `chain` would give the same dag.
    ///
    /// `chain` must already end with the location this reach belongs to.
    pub fn fits(&self, chain: &ImportChain) -> bool {
        !self.truncated
            && chain.depth() + self.height <= chain.max_depth()
            && self.locations().all(|location| !chain.contains(location))
    }
}

/// The ordered locations currently being imported on one branch.
#[derive(Debug, Clone)]
pub struct ImportChain {
    locations: IndexSet<String>,
    reaches: Vec<Arc<Mutex<Reach>>>,
    max_depth: usize,
}

impl Default for ImportChain {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl ImportChain {
    /// An empty chain accepting up to `max_depth` nested imports.
    pub fn new(max_depth: usize) -> Self {
        Self {
            locations: IndexSet::new(),
            reaches: Vec::new(),
            max_depth,
        }
    }

    /// Locations in the order they were entered, outermost first.
    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.locations.iter().map(String::as_str)
    }

    pub fn depth(&self) -> usize {
        self.locations.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn contains(&self, location: &str) -> bool {
        self.locations.contains(location)
    }

    /// Returns the chain extended with `location`.
    ///
    /// # Errors
    ///
    /// [`ImportError::Cycle`] when `location` is already on the chain, and
    /// [`ImportError::DepthExceeded`] when the chain is already at its
    /// maximum depth.
    pub fn enter(&self, location: &str) -> Result<ImportChain, ImportError> {
        if self.contains(location) {
            let chain = self
                .locations
                .iter()
                .cloned()
                .chain(std::iter::once(location.to_string()))
                .collect();
            return Err(ImportError::Cycle { chain });
        }
        if self.depth() >= self.max_depth {
            return Err(ImportError::DepthExceeded {
                location: location.to_string(),
                max_depth: self.max_depth,
            });
        }
        let mut extended = self.clone();
        extended.locations.insert(location.to_string());
        extended.reaches.push(Arc::default());
        Ok(extended)
    }

    /// Snapshot of what has been reached below the innermost location.
    pub fn reach(&self) -> Reach {
        self.reaches
            .last()
            .map(|reach| lock(reach).clone())
            .unwrap_or_default()
    }

    /// Records a successful import of `location` from the innermost level.
    pub(crate) fn record_import(&self, location: &str) {
        let depth = self.depth();
        for (index, reach) in self.reaches.iter().enumerate() {
            let mut reach = lock(reach);
            reach.locations.insert(location.to_string());
            reach.height = reach.height.max(depth - index);
        }
    }

    /// Records an import below every entered location that was cut short.
    pub(crate) fn record_cut(&self) {
        for reach in &self.reaches {
            lock(reach).truncated = true;
        }
    }

    /// Records a reused compilation of the innermost location.
    ///
    /// Its imports count as reached by every enclosing location.
    pub fn record_reuse(&self, reused: &Reach) {
        let depth = self.depth();
        for (index, reach) in self.reaches.iter().enumerate() {
            let mut reach = lock(reach);
            reach.locations.extend(reused.locations.iter().cloned());
            reach.height = reach.height.max(depth - 1 - index + reused.height);
            reach.truncated |= reused.truncated;
        }
    }
}

fn lock(reach: &Mutex<Reach>) -> MutexGuard<'_, Reach> {
    reach.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resolve `location` on behalf of `dag`, recording it as used.
///
/// The resolver receives the chain already extended with `location`.
pub(crate) async fn fetch(
    resolver: &dyn ImportResolver,
    dag: &mut Dag,
    location: &str,
    chain: &ImportChain,
) -> Result<Dag, ImportError> {
    let inner = chain.enter(location).inspect_err(|_| chain.record_cut())?;
    chain.record_import(location);
    dag.add_used_import(location);
    debug!(location, depth = inner.depth(); "Resolving import");
    resolver.resolve(location, &inner).await
}

/// Attach an imported dag below `dag` under a fresh id and `name`.
pub(crate) fn adopt(dag: &mut Dag, imported: Dag, name: &str) -> Id {
    dag.add_child_dag(imported.reidentify(Id::fresh(), name))
}

/// Merge an imported dag into `dag`; imported entries overwrite colliding keys.
pub(crate) fn absorb(dag: &mut Dag, imported: Dag) {
    dag.merge(imported);
}
