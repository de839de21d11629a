use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of errors reported before fail-fast.
pub const MAX_ERRORS: usize = 20;

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Syntax,
    Structure,
}

/// Numeric error code (E100–E299).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Syntax errors (E100–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNTERMINATED_STRING: Self = Self(101);
    pub const UNTERMINATED_COMMENT: Self = Self(102);
    pub const INVALID_ESCAPE: Self = Self(103);
    pub const UNEXPECTED_CHARACTER: Self = Self(104);
    pub const INVALID_ASSIGNMENT_TARGET: Self = Self(105);
    pub const MISSING_INITIALIZER: Self = Self(106);
    pub const ILLEGAL_JUMP: Self = Self(107);
    pub const UNEXPECTED_END: Self = Self(108);

    // ── Structure errors (E200–E299) ──
    pub const STRUCTURAL_LIMIT_EXCEEDED: Self = Self(200);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            200..=299 => ErrorCategory::Structure,
            _ => ErrorCategory::Syntax,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Structure => write!(f, "structure"),
        }
    }
}

/// A structured front-end error raised while lexing or parsing a script.
///
/// Hosts render these directly; they must not parse the display string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} ({span})")]
pub struct ScriptError {
    /// Script name.
    pub file: String,
    /// Error code (e.g., E100).
    pub code: ErrorCode,
    /// Error category (derived from code).
    pub category: ErrorCategory,
    /// Human-readable error message.
    pub message: String,
    /// Source location.
    #[serde(flatten)]
    pub span: Span,
    /// The exact source line for context.
    pub source_line: String,
}

impl ScriptError {
    /// Create a new error.
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
        }
    }
}

/// Errors collected by one front-end pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptErrors {
    pub errors: Vec<ScriptError>,
    pub total_errors: usize,
}

impl ScriptErrors {
    /// Create an empty collection.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add an error, respecting the MAX_ERRORS limit.
    pub fn push_error(&mut self, error: ScriptError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Append every error from another pass.
    pub fn extend(&mut self, other: ScriptErrors) {
        for error in other.errors {
            self.push_error(error);
        }
    }

    /// The first error, which is the one surfaced to the user.
    pub fn first(&self) -> Option<&ScriptError> {
        self.errors.first()
    }
}
