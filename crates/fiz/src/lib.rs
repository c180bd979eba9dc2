//! Fiz - A recipe language compiled into styled dependency graphs.
//!
//! Recipes chain function calls through variables, group them into
//! namespaces, pull in other recipes with imports, and attach reusable
//! styles. This crate compiles them into a tree of [`dag::Dag`] levels that
//! renderers and tutorials can walk.

pub mod compilation;
pub mod config;
pub mod import;
pub mod inspect;
pub mod resolver;
pub mod style;

mod elaborate;
mod error;

pub use fiz_core::{dag, identifier, path};
pub use fiz_parser::{ast, error as diagnostics};

pub use compilation::Compilation;
pub use error::FizError;

use log::{debug, info, trace};

use fiz_parser::ast::Recipe;

use config::AppConfig;
use elaborate::Builder;
use import::ImportChain;
use resolver::{CachingResolver, FileResolver, ImportResolver};

/// Compiler from recipe source to a [`Compilation`].
///
/// Imports are resolved through the configured [`ImportResolver`]. The
/// default compiler reads them from files below the configured import root,
/// caching each location.
///
/// # Examples
///
/// ```rust
/// use fiz::{Compiler, config::AppConfig, resolver::MemoryResolver};
///
/// let resolver = MemoryResolver::new().with_source("pantry", "flour = mill(wheat())");
/// let compiler = Compiler::new(AppConfig::default(), resolver);
///
/// let source = r#"
///     pantry @ "pantry"
///     dough = knead(pantry.flour, water())
///     bake(dough)
/// "#;
///
/// let compilation = futures::executor::block_on(compiler.compile(source))
///     .expect("Failed to compile");
/// assert_eq!(compilation.dag().node_names(), ["bake", "knead", "water"]);
/// assert!(compilation.diagnostics().is_empty());
/// ```
pub struct Compiler {
    config: AppConfig,
    resolver: Box<dyn ImportResolver>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::from_config(AppConfig::default())
    }
}

impl Compiler {
    /// Create a compiler resolving imports through `resolver`.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration; its import depth bound applies
    /// * `resolver` - Source of imported recipes
    pub fn new(config: AppConfig, resolver: impl ImportResolver + 'static) -> Self {
        Self {
            config,
            resolver: Box::new(resolver),
        }
    }

    /// Create a compiler reading imports from files as configured.
    ///
    /// Locations are relative to `imports.root`, or to the current directory
    /// when it is unset.
    pub fn from_config(config: AppConfig) -> Self {
        let imports = config.imports();
        let files = FileResolver::new(imports.root().unwrap_or(std::path::Path::new(".")));
        let resolver: Box<dyn ImportResolver> = if imports.cache() {
            Box::new(CachingResolver::new(files))
        } else {
            Box::new(files)
        };
        Self { config, resolver }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse and compile `source`.
    ///
    /// # Errors
    ///
    /// Returns [`FizError::Parse`] if any statement fails to parse. Problems
    /// found while building the graph never fail the compilation; they are
    /// reported in [`Compilation::diagnostics`].
    pub async fn compile(&self, source: &str) -> Result<Compilation, FizError> {
        info!("Compiling recipe");
        let recipe =
            fiz_parser::parse(source).map_err(|err| FizError::new_parse_error(err, source))?;
        debug!(statements = recipe.statements.len(); "Recipe parsed successfully");
        Ok(self.compile_recipe(&recipe).await)
    }

    /// Parse and compile `source`, skipping statements that fail to parse.
    ///
    /// Parse errors are returned among the diagnostics, ahead of the
    /// warnings raised while building.
    pub async fn compile_lenient(&self, source: &str) -> Compilation {
        info!("Compiling recipe leniently");
        let (recipe, mut diagnostics) = fiz_parser::parse_lenient(source);
        let (dag, warnings) = self.compile_recipe(&recipe).await.into_parts();
        diagnostics.extend(warnings);
        Compilation::new(dag, diagnostics)
    }

    /// Compile an already parsed recipe.
    pub async fn compile_recipe(&self, recipe: &Recipe) -> Compilation {
        let chain = ImportChain::new(self.config.imports().max_depth());
        let (dag, diagnostics) = Builder::new(self.resolver.as_ref())
            .build(recipe, &chain)
            .await;
        trace!(dag:% = dag; "Compiled dag");
        Compilation::new(dag, diagnostics)
    }

    /// Compile the recipe at an import location, as if it were imported.
    ///
    /// The location itself is on the import chain, so a recipe importing
    /// itself is reported as a cycle.
    ///
    /// # Errors
    ///
    /// Returns [`FizError::Import`] if the location cannot be resolved.
    pub async fn compile_location(&self, location: &str) -> Result<dag::Dag, FizError> {
        info!(location; "Compiling import location");
        let chain = ImportChain::new(self.config.imports().max_depth()).enter(location)?;
        Ok(self.resolver.resolve(location, &chain).await?)
    }
}
