//! Parser for Fiz recipe source text.
//!
//! The parser works directly on characters: style values are raw text running
//! to the end of the line, so a separate token stage would only get in the
//! way. Parsing is error tolerant. A statement that fails to parse is
//! reported as a diagnostic and skipped up to the next newline or `;`, and
//! missing closing delimiters are accepted at end of input.
//!
//! The public entry point is [`build_recipe`].

use std::cell::RefCell;

use winnow::{
    Parser as _,
    combinator::{alt, cut_err, eof, opt, peek, preceded, repeat, separated, terminated},
    error::{ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stateful, Stream},
    token::{any, one_of, rest, take_until, take_while},
};

use fiz_core::path::QualifiedPath;

use crate::{
    ast::{
        Alias, Assignment, AssignmentRhs, Call, Import, LocalVar, NamedStyle, Namespace, Recipe,
        Statement, Style, StyleBinding, StyleEntry, Value,
    },
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    span::{Span, Spanned},
};

/// Rich diagnostic information for committed parse failures.
///
/// Attached to winnow errors via `.context()`; the error span covers from
/// `start` to the position where parsing stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParseContext {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    start: usize,
}

/// Source input carrying the collector that receives recovered errors from
/// nested statement lists.
type Input<'a> = Stateful<LocatingSlice<&'a str>, &'a RefCell<DiagnosticCollector>>;
type IResult<O> = ModalResult<O, ContextError<ParseContext>>;

/// Wrap `value` with the span from `start` to the current position.
fn spanned<T>(value: T, start: usize, input: &Input<'_>) -> Spanned<T> {
    Spanned::new(value, Span::new(start..input.current_token_start()))
}

fn backtrack<O>() -> IResult<O> {
    Err(ErrMode::Backtrack(ContextError::new()))
}

/// Parse a `// ...` comment up to, not including, the newline
fn line_comment(input: &mut Input<'_>) -> IResult<()> {
    ("//", take_while(0.., |c: char| c != '\n'))
        .void()
        .parse_next(input)
}

/// Parse a `/* ... */` comment; an unclosed comment runs to end of input
fn block_comment(input: &mut Input<'_>) -> IResult<()> {
    (
        "/*",
        alt(((take_until(0.., "*/"), "*/").void(), rest.void())),
    )
        .void()
        .parse_next(input)
}

/// Skip spaces, tabs, and comments without crossing a line break
fn inline_ws(input: &mut Input<'_>) -> IResult<()> {
    repeat(
        0..,
        alt((
            take_while(1.., [' ', '\t', '\r']).void(),
            line_comment,
            block_comment,
        )),
    )
    .parse_next(input)
}

/// Skip whitespace, line breaks, and comments
fn multiline_ws(input: &mut Input<'_>) -> IResult<()> {
    repeat(
        0..,
        alt((
            take_while(1.., [' ', '\t', '\r', '\n']).void(),
            line_comment,
            block_comment,
        )),
    )
    .parse_next(input)
}

/// Skip anything that separates statements or style entries
fn separators(input: &mut Input<'_>) -> IResult<()> {
    repeat(
        0..,
        alt((
            take_while(1.., [' ', '\t', '\r', '\n', ';']).void(),
            line_comment,
            block_comment,
        )),
    )
    .parse_next(input)
}

/// Accept a closing delimiter, or its absence at end of input
fn closing<'a>(delimiter: char) -> impl FnMut(&mut Input<'a>) -> IResult<()> {
    move |input: &mut Input<'a>| alt((delimiter.void(), eof.void())).parse_next(input)
}

/// Parse an identifier: `[A-Za-z_][A-Za-z0-9_]*`
fn identifier(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    let start = input.current_token_start();
    let name = (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)?;
    Ok(spanned(name.to_string(), start, input))
}

/// Parse identifiers joined with `.`
fn qualified_name(input: &mut Input<'_>) -> IResult<Spanned<QualifiedPath>> {
    let start = input.current_token_start();
    let segments: Vec<Spanned<String>> = separated(1.., identifier, '.').parse_next(input)?;
    let path = segments.into_iter().map(Spanned::into_inner).collect();
    Ok(spanned(path, start, input))
}

/// Parse a single- or double-quoted string on one line, without the quotes
fn quoted(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    let start = input.current_token_start();
    let quote = one_of(['"', '\'']).parse_next(input)?;

    // Commit after the opening quote so the error points at the string
    let content = cut_err(terminated(
        take_while(0.., move |c: char| c != quote && c != '\n'),
        quote,
    ))
    .context(ParseContext {
        code: ErrorCode::E001,
        message: "unterminated string literal",
        help: Some("close the string on the same line"),
        start,
    })
    .parse_next(input)?;

    Ok(spanned(content.to_string(), start, input))
}

/// Parse a `#tag` reference inside a style block or binding
fn tag_reference(input: &mut Input<'_>) -> IResult<Spanned<QualifiedPath>> {
    preceded('#', qualified_name).parse_next(input)
}

/// Parse a `key: value` style property
///
/// Unquoted values run to the end of the line, `;`, or `}` and are trimmed.
fn property(input: &mut Input<'_>) -> IResult<StyleEntry> {
    let key = take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || c == '-' || c == '_'
    })
    .parse_next(input)?;
    (inline_ws, ':', inline_ws).parse_next(input)?;

    let value = alt((
        quoted.map(Spanned::into_inner),
        take_while(0.., |c: char| !matches!(c, '\n' | ';' | '}'))
            .map(|raw: &str| raw.trim().to_string()),
    ))
    .parse_next(input)?;

    Ok(StyleEntry::Property {
        key: key.to_string(),
        value,
    })
}

/// Parse a `{...}` style block of tags, properties, and description lines
fn style_block(input: &mut Input<'_>) -> IResult<Style> {
    '{'.parse_next(input)?;

    let mut style = Style::default();
    loop {
        separators(input)?;
        if let Some(tag) = opt(tag_reference).parse_next(input)? {
            style.tags.push(tag);
        } else if let Some(line) = opt(quoted).parse_next(input)? {
            style.entries.push(StyleEntry::Description(line.into_inner()));
        } else if let Some(entry) = opt(property).parse_next(input)? {
            style.entries.push(entry);
        } else {
            break;
        }
    }

    closing('}').parse_next(input)?;
    Ok(style)
}

/// Parse an optional style block following an element on the same line
fn trailing_style(input: &mut Input<'_>) -> IResult<Option<Style>> {
    opt(preceded(inline_ws, style_block)).parse_next(input)
}

/// Parse a call argument: a nested call or a (qualified) variable
fn value(input: &mut Input<'_>) -> IResult<Value> {
    alt((call.map(Value::Call), qualified_name.map(Value::Variable))).parse_next(input)
}

/// Parse a parenthesized, comma-separated argument list
fn argument_list(input: &mut Input<'_>) -> IResult<Vec<Value>> {
    '('.parse_next(input)?;

    let mut args = Vec::new();
    loop {
        multiline_ws(input)?;
        let Some(arg) = opt(value).parse_next(input)? else {
            break;
        };
        args.push(arg);
        multiline_ws(input)?;
        if opt(',').parse_next(input)?.is_none() {
            break;
        }
    }

    multiline_ws(input)?;
    closing(')').parse_next(input)?;
    Ok(args)
}

/// Parse `name(args){style}`
fn call(input: &mut Input<'_>) -> IResult<Spanned<Call>> {
    let start = input.current_token_start();
    let name = identifier(input)?;
    inline_ws(input)?;
    let args = argument_list(input)?;
    let style = trailing_style(input)?;
    Ok(spanned(Call { name, args, style }, start, input))
}

/// Parse `name[statements](args){style}` with an optional name
fn namespace(input: &mut Input<'_>) -> IResult<Spanned<Namespace>> {
    let start = input.current_token_start();
    let name = opt(terminated(identifier, inline_ws)).parse_next(input)?;
    '['.parse_next(input)?;

    let statements = statement_list(input, true)?;
    closing(']').parse_next(input)?;

    let args = opt(preceded(inline_ws, argument_list))
        .parse_next(input)?
        .unwrap_or_default();
    let style = trailing_style(input)?;

    Ok(spanned(
        Namespace {
            name,
            statements,
            args,
            style,
        },
        start,
        input,
    ))
}

/// Parse `name @ "location"` or `@ "location"`
///
/// A missing location yields an empty one.
fn import(input: &mut Input<'_>) -> IResult<Spanned<Import>> {
    let start = input.current_token_start();
    let name = opt(terminated(identifier, inline_ws)).parse_next(input)?;
    '@'.parse_next(input)?;
    inline_ws(input)?;

    let location_start = input.current_token_start();
    let location = match opt(quoted).parse_next(input)? {
        Some(location) => location,
        None => spanned(String::new(), location_start, input),
    };

    Ok(spanned(Import { location, name }, start, input))
}

/// Parse a variable declared on the left of `=`
fn local_var(input: &mut Input<'_>) -> IResult<LocalVar> {
    let name = identifier(input)?;
    let style = trailing_style(input)?;
    Ok(LocalVar { name, style })
}

fn assignment_rhs(input: &mut Input<'_>) -> IResult<AssignmentRhs> {
    alt((
        import.map(AssignmentRhs::Import),
        namespace.map(AssignmentRhs::Namespace),
        call.map(AssignmentRhs::Call),
    ))
    .parse_next(input)
}

/// Parse an assignment `a, b = rhs`, or an alias `y = x.y`
fn assignment_or_alias(input: &mut Input<'_>) -> IResult<Statement> {
    let lhs: Vec<LocalVar> =
        separated(1.., local_var, (inline_ws, ',', inline_ws)).parse_next(input)?;
    (inline_ws, '=', inline_ws).parse_next(input)?;

    if let Some(rhs) = opt(assignment_rhs).parse_next(input)? {
        return Ok(Statement::Assignment(Assignment { lhs, rhs }));
    }

    // Only a single variable may alias another
    let Ok([lhs]) = <[LocalVar; 1]>::try_from(lhs) else {
        return backtrack();
    };
    let rhs = qualified_name(input)?;
    Ok(Statement::Alias(Alias { lhs, rhs }))
}

/// Parse `#name{...}`
fn named_style(input: &mut Input<'_>) -> IResult<NamedStyle> {
    let name = preceded('#', identifier).parse_next(input)?;
    inline_ws(input)?;
    let style = style_block(input)?;
    Ok(NamedStyle { name, style })
}

/// Parse `%keyword{#a #b.c}`
fn style_binding(input: &mut Input<'_>) -> IResult<StyleBinding> {
    let keyword = preceded('%', identifier).parse_next(input)?;
    (inline_ws, '{').parse_next(input)?;

    let mut tags = Vec::new();
    loop {
        separators(input)?;
        let Some(tag) = opt(tag_reference).parse_next(input)? else {
            break;
        };
        tags.push(tag);
    }

    closing('}').parse_next(input)?;
    Ok(StyleBinding { keyword, tags })
}

/// Parse a single statement of any kind
fn statement(input: &mut Input<'_>) -> IResult<Statement> {
    alt((
        named_style.map(Statement::NamedStyle),
        style_binding.map(Statement::StyleBinding),
        import.map(|import| Statement::Import(import.into_inner())),
        assignment_or_alias,
        namespace.map(|namespace| Statement::Namespace(namespace.into_inner())),
        call.map(|call| Statement::Call(call.into_inner())),
        qualified_name.map(Statement::Variable),
    ))
    .parse_next(input)
}

/// Require that nothing but trailing whitespace follows a statement on its line
fn statement_end(input: &mut Input<'_>) -> IResult<()> {
    (
        inline_ws,
        peek(alt(('\n'.void(), ';'.void(), ']'.void(), eof.void()))),
    )
        .void()
        .parse_next(input)
}

/// Convert a committed failure into a diagnostic.
fn committed_diagnostic(err: &ContextError<ParseContext>, error_pos: usize) -> Diagnostic {
    match err.context().next() {
        Some(ParseContext {
            code,
            message,
            help,
            start,
        }) => {
            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(Span::new(*start..error_pos), code.description());
            if let Some(help) = help {
                diag = diag.with_help(*help);
            }
            diag
        }
        None => Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(
                Span::new(error_pos..error_pos.saturating_add(1)),
                ErrorCode::E002.description(),
            ),
    }
}

/// Consume the remainder of a broken statement, up to the next separator.
fn statement_remainder(input: &mut Input<'_>, nested: bool) -> IResult<usize> {
    take_while(0.., |c: char| {
        !matches!(c, '\n' | ';') && !(nested && c == ']')
    })
    .map(str::len)
    .parse_next(input)
}

/// Skip a statement that failed without consuming input.
///
/// Always consumes at least one character so the statement loop progresses.
fn skip_statement(input: &mut Input<'_>, nested: bool) -> IResult<()> {
    if statement_remainder(input, nested)? == 0 && input.eof_offset() > 0 {
        any.void().parse_next(input)?;
    }
    Ok(())
}

/// Parse one statement and the end of its line, returning where the
/// statement itself ended.
fn terminated_statement(input: &mut Input<'_>) -> IResult<(Statement, usize)> {
    let parsed = statement(input)?;
    let end = input.current_token_start();
    statement_end(input)?;
    Ok((parsed, end))
}

/// Parse statements until end of input, or until `]` when `nested`.
///
/// Failed statements are reported to the input's collector and skipped.
fn statement_list(input: &mut Input<'_>, nested: bool) -> IResult<Vec<Spanned<Statement>>> {
    let mut statements = Vec::new();
    loop {
        separators(input)?;
        if input.eof_offset() == 0 {
            break;
        }
        if nested && opt(peek(']')).parse_next(input)?.is_some() {
            break;
        }

        let checkpoint = input.checkpoint();
        let start = input.current_token_start();
        match terminated_statement(input) {
            Ok((parsed, end)) => statements.push(Spanned::new(parsed, Span::new(start..end))),
            Err(ErrMode::Cut(err)) => {
                let diag = committed_diagnostic(&err, input.current_token_start());
                input.state.borrow_mut().emit(diag);
                statement_remainder(input, nested)?;
            }
            Err(_) => {
                input.reset(&checkpoint);
                skip_statement(input, nested)?;
                let span = Span::new(start..input.current_token_start());
                input.state.borrow_mut().emit(
                    Diagnostic::error("unexpected token")
                        .with_code(ErrorCode::E100)
                        .with_label(span, "expected a statement")
                        .with_help(
                            "statements are calls, assignments, namespaces, imports, or style declarations",
                        ),
                );
            }
        }
    }
    Ok(statements)
}

/// Parse a recipe, reporting recovered errors to `diagnostics`.
pub fn build_recipe(source: &str, diagnostics: &RefCell<DiagnosticCollector>) -> Recipe {
    let mut input = Stateful {
        input: LocatingSlice::new(source),
        state: diagnostics,
    };

    match statement_list(&mut input, false) {
        Ok(statements) => Recipe { statements },
        Err(err) => {
            let error_pos = input.current_token_start();
            let diag = match err {
                ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => {
                    committed_diagnostic(&ctx, error_pos)
                }
                ErrMode::Incomplete(_) => committed_diagnostic(&ContextError::new(), error_pos),
            };
            diagnostics.borrow_mut().emit(diag);
            Recipe::default()
        }
    }
}
