//! Syntax tree of a parsed recipe.
//!
//! The tree keeps source order and spans; it performs no name resolution.
//! Statement and argument kinds are closed enums so consumers can match them
//! exhaustively.

use fiz_core::path::QualifiedPath;

use crate::span::Spanned;

/// A whole recipe: the statements of the unnamed top-level namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recipe {
    pub statements: Vec<Spanned<Statement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `f(a, b){style}`
    Call(Call),
    /// `a{style}, b = <call | namespace | import>`
    Assignment(Assignment),
    /// `y{style} = x.y`
    Alias(Alias),
    /// `#name{...}`
    NamedStyle(NamedStyle),
    /// `%keyword{#a #b}`
    StyleBinding(StyleBinding),
    /// `name[...](args){style}`
    Namespace(Namespace),
    /// `name @ "location"` or `@ "location"`
    Import(Import),
    /// A bare variable reference. Has no effect on the graph.
    Variable(Spanned<QualifiedPath>),
}

/// A function call: one graph node plus one edge per argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: Spanned<String>,
    pub args: Vec<Value>,
    pub style: Option<Style>,
}

/// A call or namespace argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Call(Spanned<Call>),
    Variable(Spanned<QualifiedPath>),
}

/// A variable on the left-hand side of an assignment or alias.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVar {
    pub name: Spanned<String>,
    pub style: Option<Style>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub lhs: Vec<LocalVar>,
    pub rhs: AssignmentRhs,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentRhs {
    Call(Spanned<Call>),
    Namespace(Spanned<Namespace>),
    Import(Spanned<Import>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub lhs: LocalVar,
    pub rhs: Spanned<QualifiedPath>,
}

/// The contents of a `{...}` style block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    /// Referenced style tags, in source order.
    pub tags: Vec<Spanned<QualifiedPath>>,
    /// Local entries, in source order.
    pub entries: Vec<StyleEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleEntry {
    /// `key: value`
    Property { key: String, value: String },
    /// A quoted free-text line.
    Description(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedStyle {
    pub name: Spanned<String>,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleBinding {
    pub keyword: Spanned<String>,
    pub tags: Vec<Spanned<QualifiedPath>>,
}

/// A bracketed block of statements compiled into its own child level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    pub name: Option<Spanned<String>>,
    pub statements: Vec<Spanned<Statement>>,
    pub args: Vec<Value>,
    pub style: Option<Style>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    /// Empty when the source omits the location.
    pub location: Spanned<String>,
    pub name: Option<Spanned<String>>,
}
