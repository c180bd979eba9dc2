//! Error codes for the Fiz diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexical errors
//! - `E1xx` - Statement parsing errors
//! - `E3xx` - Graph building and import errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexical Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A description line or quoted value was opened but never closed on the
    /// same line.
    E001,

    /// Unexpected character.
    ///
    /// A character was encountered that cannot start any construct.
    E002,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    ///
    /// The statement could not be parsed. Parsing resumes at the next
    /// newline or `;`.
    E100,

    // =========================================================================
    // Building Errors (E3xx)
    // =========================================================================
    /// Undefined variable.
    ///
    /// A call argument or alias source names a variable that is not bound at
    /// the current level.
    E300,

    /// Undefined style tag.
    ///
    /// A named style references a tag that has not been declared yet.
    E301,

    /// Unresolved qualified path.
    ///
    /// A segment of a qualified variable does not name a child level.
    E302,

    /// Malformed edge endpoint.
    ///
    /// An edge could not be added because an endpoint is not an element of
    /// the level holding it.
    E303,

    /// Import failure.
    ///
    /// The resolver could not produce a graph for an import location.
    E304,

    /// Cyclic import.
    ///
    /// An import location is already being resolved further up the chain.
    E305,

    /// Import depth exceeded.
    ///
    /// The import chain reached the configured maximum depth.
    E306,

    /// Statement without graph meaning.
    ///
    /// A bare variable reference used as a statement has no effect.
    E307,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E100 => "E100",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E305 => "E305",
            ErrorCode::E306 => "E306",
            ErrorCode::E307 => "E307",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E300 => "undefined variable",
            ErrorCode::E301 => "undefined style tag",
            ErrorCode::E302 => "unresolved qualified path",
            ErrorCode::E303 => "malformed edge endpoint",
            ErrorCode::E304 => "import failure",
            ErrorCode::E305 => "cyclic import",
            ErrorCode::E306 => "import depth exceeded",
            ErrorCode::E307 => "statement has no effect",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
