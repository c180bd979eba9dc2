//! Fiz Core Types and Definitions
//!
//! This crate provides the foundational types for compiled Fiz recipes. It
//! includes:
//!
//! - **Identifiers**: Globally unique element identifiers ([`identifier::Id`])
//! - **Paths**: Qualified names reaching across nesting levels ([`path::QualifiedPath`])
//! - **Styles**: Style tags and flattened property maps ([`style`] module)
//! - **Dag**: The per-level dependency graph and its invariants ([`dag`] module)

pub mod dag;
pub mod identifier;
pub mod path;
pub mod style;
