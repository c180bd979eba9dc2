//! Severity levels for diagnostics.
//!
//! This module defines the severity of diagnostic messages,
//! distinguishing between fatal errors and advisory warnings.

use std::fmt;

/// The severity level of a diagnostic.
///
/// Severity determines how the diagnostic should be handled:
/// - [`Severity::Error`] marks source that did not parse
/// - [`Severity::Warning`] marks a recoverable problem in a parsed recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A statement could not be parsed. Strict parsing fails on errors.
    Error,

    /// A statement was parsed but part of it was dropped while building
    /// the graph. Compilation continues.
    Warning,
}

impl Severity {
    /// Returns `true` if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns `true` if this is a warning severity.
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert!(Severity::Warning.is_warning());
    }
}
