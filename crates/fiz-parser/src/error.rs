//! Error and diagnostic system for Fiz recipes.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Labeled spans for source context
//! - Severity levels
//! - Diagnostic collector for accumulating multiple problems
//!
//! The parser reports syntax errors with it, and the graph builder in the
//! `fiz` crate reports recoverable build warnings with the same types, so
//! both phases render uniformly.
//!
//! # Example
//!
//! ```
//! # use fiz_parser::error::{Diagnostic, ErrorCode};
//! # use fiz_parser::Span;
//!
//! let diag = Diagnostic::warning("undefined variable `flour`")
//!     .with_code(ErrorCode::E300)
//!     .with_label(Span::new(5..10), "not bound at this level")
//!     .with_help("assign it before using it as an argument");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub use collector::DiagnosticCollector;
pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
