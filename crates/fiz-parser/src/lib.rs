//! # Fiz Parser
//!
//! Parser for the Fiz recipe language. This crate turns source text into the
//! syntax tree of [`ast`], and provides the diagnostic types shared by every
//! compilation phase.
//!
//! ## Usage
//!
//! ```
//! # use fiz_parser::{parse, error::ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         w = water()
//!         hot = heat(w)
//!         serve(hot)
//!     "#;
//!
//!     let recipe = parse(source)?;
//!     assert_eq!(recipe.statements.len(), 3);
//!     Ok(())
//! }
//! ```

pub mod ast;
pub mod error;
mod parser;
mod span;

pub use span::{Span, Spanned};

use std::cell::RefCell;

use log::{debug, info};

use ast::Recipe;
use error::{Diagnostic, DiagnosticCollector, ParseError};

/// Parse source text into a recipe, failing if any statement is malformed.
///
/// # Errors
///
/// Returns a [`ParseError`] holding every diagnostic when at least one
/// statement could not be parsed.
pub fn parse(source: &str) -> Result<Recipe, ParseError> {
    let (recipe, diagnostics) = parse_lenient(source);
    if diagnostics.iter().any(|d| d.severity().is_error()) {
        return Err(ParseError::new(diagnostics));
    }
    Ok(recipe)
}

/// Parse source text, keeping every statement that parsed.
///
/// Malformed statements are skipped and reported in the returned diagnostics.
/// This never fails, which suits editors that compile on every keystroke.
pub fn parse_lenient(source: &str) -> (Recipe, Vec<Diagnostic>) {
    debug!(bytes = source.len(); "Parsing recipe");

    let collector = RefCell::new(DiagnosticCollector::new());
    let recipe = parser::build_recipe(source, &collector);
    let diagnostics = collector.into_inner().into_diagnostics();

    info!(
        statements = recipe.statements.len(),
        diagnostics = diagnostics.len();
        "Recipe parsed"
    );
    (recipe, diagnostics)
}
