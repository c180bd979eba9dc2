//! Collector for accumulating diagnostics during a processing phase.
//!
//! The [`DiagnosticCollector`] lets the parser and the graph builder report
//! every problem they find instead of stopping at the first one.

use crate::error::{Diagnostic, ParseError};

/// A collector for accumulating diagnostics during a processing phase.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    ///
    /// Error diagnostics mark the collector as failed.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Returns `true` if at least one error was emitted.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Borrow the diagnostics emitted so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Finish collection and return a result.
    ///
    /// - If there are errors, returns `Err(ParseError)` with all diagnostics.
    /// - If there are no errors, returns `Ok(())`; warnings are discarded.
    pub fn finish(self) -> Result<(), ParseError> {
        if self.has_errors {
            Err(ParseError::new(self.diagnostics))
        } else {
            Ok(())
        }
    }

    /// Consume the collector and return every diagnostic, errors and
    /// warnings alike, in emission order.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
