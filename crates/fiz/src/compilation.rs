//! The result of compiling a recipe.

use fiz_core::dag::Dag;
use fiz_parser::error::Diagnostic;

/// A compiled recipe: the root dag plus every diagnostic raised on the way.
///
/// Diagnostics are warnings unless the recipe was compiled leniently, in
/// which case parse errors for skipped statements appear here as well.
#[derive(Debug, Clone)]
pub struct Compilation {
    dag: Dag,
    diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub fn new(dag: Dag, diagnostics: Vec<Diagnostic>) -> Self {
        Self { dag, diagnostics }
    }

    pub fn dag(&self) -> &Dag {
        &self.dag
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns `true` if any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity().is_error())
    }

    pub fn into_parts(self) -> (Dag, Vec<Diagnostic>) {
        (self.dag, self.diagnostics)
    }
}
