//! Rendering of compiler output through miette.
//!
//! Parse errors and build warnings both carry spans into the recipe text, so
//! they become [`SourceDiagnostic`]s with snippets. Failures without a
//! location, such as unreadable files or unresolved top-level imports, become
//! [`PlainError`]s. One [`Reportable`] is produced per diagnostic so each gets
//! its own report.

use std::fmt;

use miette::{LabeledSpan, Severity as MietteSeverity, SourceCode, SourceSpan};
use thiserror::Error;

use fiz::FizError;
use fiz_parser::{
    Span,
    error::{Diagnostic, Severity},
};

/// A diagnostic paired with the recipe text its labels point into.
#[derive(Debug)]
pub struct SourceDiagnostic<'a> {
    diag: &'a Diagnostic,
    src: &'a str,
}

impl<'a> SourceDiagnostic<'a> {
    pub fn new(diag: &'a Diagnostic, src: &'a str) -> Self {
        Self { diag, src }
    }
}

impl fmt::Display for SourceDiagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.diag.message())
    }
}

impl std::error::Error for SourceDiagnostic<'_> {}

impl miette::Diagnostic for SourceDiagnostic<'_> {
    fn code<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        let code = self.diag.code()?;
        Some(Box::new(code))
    }

    fn severity(&self) -> Option<MietteSeverity> {
        match self.diag.severity() {
            Severity::Error => Some(MietteSeverity::Error),
            Severity::Warning => Some(MietteSeverity::Warning),
        }
    }

    fn help<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        let help = self.diag.help()?;
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.src as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if self.diag.labels().is_empty() {
            return None;
        }
        let src_len = self.src.len();
        let labels = self.diag.labels().iter().map(move |label| {
            let text = Some(label.message().to_owned());
            let span = clamp(label.span(), src_len);
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(text, span)
            } else {
                LabeledSpan::new_with_span(text, span)
            }
        });
        Some(Box::new(labels))
    }
}

/// A [`FizError`] with nothing to point at in the recipe text.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct PlainError<'a>(pub &'a FizError);

impl miette::Diagnostic for PlainError<'_> {
    fn code<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        match self.0 {
            FizError::Io(_) => Some(Box::new("fiz::io")),
            FizError::Import(_) => Some(Box::new("fiz::import")),
            FizError::Parse { .. } => None,
        }
    }
}

/// One report for the terminal.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum Reportable<'a> {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Diagnostic(SourceDiagnostic<'a>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Error(PlainError<'a>),
}

/// Keeps a span inside the source; end-of-input spans shrink to zero width.
fn clamp(span: Span, src_len: usize) -> SourceSpan {
    let start = span.start().min(src_len);
    let end = span.end().clamp(start, src_len);
    SourceSpan::new(start.into(), end - start)
}

/// Reports for a failed run: one per parse diagnostic, otherwise a single one.
pub fn to_reportables(err: &FizError) -> Vec<Reportable<'_>> {
    match err {
        FizError::Parse { err: parse, src } => diagnostics_to_reportables(parse.diagnostics(), src),
        FizError::Io(_) | FizError::Import(_) => vec![Reportable::Error(PlainError(err))],
    }
}

/// Reports for diagnostics raised against `src`, such as a run's warnings.
pub fn diagnostics_to_reportables<'a>(
    diagnostics: &'a [Diagnostic],
    src: &'a str,
) -> Vec<Reportable<'a>> {
    diagnostics
        .iter()
        .map(|diag| Reportable::Diagnostic(SourceDiagnostic::new(diag, src)))
        .collect()
}

#[cfg(test)]
mod tests {
    use miette::Diagnostic as _;

    use fiz::import::ImportError;
    use fiz_parser::error::{ErrorCode, ParseError};

    use super::*;

    fn code_of(reportable: &Reportable<'_>) -> Option<String> {
        reportable.code().map(|code| code.to_string())
    }

    #[test]
    fn test_parse_error_reports_each_diagnostic() {
        let source = "f(\n)(\ng()";
        let diags = vec![
            Diagnostic::error("expected `)`")
                .with_code(ErrorCode::E100)
                .with_label(Span::new(2..3), "call left open"),
            Diagnostic::error("unexpected `)`")
                .with_code(ErrorCode::E002)
                .with_label(Span::new(3..4), "no call to close")
                .with_help("remove the parenthesis"),
        ];
        let err = FizError::new_parse_error(ParseError::new(diags), source);

        let reportables = to_reportables(&err);
        let messages: Vec<String> = reportables.iter().map(ToString::to_string).collect();
        assert_eq!(messages, ["expected `)`", "unexpected `)`"]);
        assert_eq!(code_of(&reportables[0]).as_deref(), Some("E100"));
        assert_eq!(
            reportables[1].help().map(|help| help.to_string()).as_deref(),
            Some("remove the parenthesis")
        );
        assert_eq!(reportables[1].severity(), Some(MietteSeverity::Error));
    }

    #[test]
    fn test_import_failure_is_a_single_plain_report() {
        let err = FizError::Import(ImportError::NotFound {
            location: "pantry".to_string(),
        });

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);
        assert!(matches!(reportables[0], Reportable::Error(_)));
        assert_eq!(reportables[0].to_string(), "Import error: import `pantry` not found");
        assert_eq!(code_of(&reportables[0]).as_deref(), Some("fiz::import"));
        assert!(reportables[0].labels().is_none());
    }

    #[test]
    fn test_warnings_render_as_warnings() {
        let diags = vec![
            Diagnostic::warning("undefined variable `a`")
                .with_code(ErrorCode::E300)
                .with_label(Span::new(2..3), "not bound at this level"),
        ];
        let reportables = diagnostics_to_reportables(&diags, "f(a)");
        assert_eq!(reportables[0].severity(), Some(MietteSeverity::Warning));
        assert_eq!(code_of(&reportables[0]).as_deref(), Some("E300"));
    }

    #[test]
    fn test_labels_keep_their_role() {
        let diag = Diagnostic::warning("edge dropped")
            .with_label(Span::new(6..7), "used here")
            .with_secondary_label(Span::new(0..1), "declared here");
        let source = SourceDiagnostic::new(&diag, "x = f()\ng(x)");

        let labels: Vec<LabeledSpan> = source.labels().into_iter().flatten().collect();
        let primary: Vec<bool> = labels.iter().map(LabeledSpan::primary).collect();
        assert_eq!(primary, [true, false]);
        assert_eq!(labels[1].label(), Some("declared here"));
    }

    #[test]
    fn test_spans_past_the_end_are_clamped() {
        let span = clamp(Span::new(4..5), 4);
        assert_eq!((span.offset(), span.len()), (4, 0));

        let span = clamp(Span::new(1..3), 4);
        assert_eq!((span.offset(), span.len()), (1, 2));
    }
}
