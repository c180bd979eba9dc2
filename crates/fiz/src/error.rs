//! Error types for Fiz operations.
//!
//! This module provides the main error type [`FizError`] which wraps the
//! conditions that abort a whole compilation. Problems confined to a single
//! statement never surface here; they become warnings in
//! [`Compilation::diagnostics`](crate::Compilation::diagnostics).

use std::io;

use thiserror::Error;

use fiz_parser::error::ParseError;

use crate::import::ImportError;

/// The main error type for Fiz operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the source text next to the structured
/// diagnostics so callers can render labeled snippets.
#[derive(Debug, Error)]
pub enum FizError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Import error: {0}")]
    Import(#[from] ImportError),
}

impl FizError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
