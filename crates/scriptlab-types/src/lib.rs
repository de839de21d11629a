//! Shared types for scriptlab.
//!
//! This crate defines the AST node types, source spans, structured script
//! errors, and other shared data structures used by the lexer, parser and
//! evaluator.

mod error;
mod span;
pub mod ast;

pub use error::{ErrorCategory, ErrorCode, ScriptError, ScriptErrors, MAX_ERRORS};
pub use span::{SourceFile, Span};
