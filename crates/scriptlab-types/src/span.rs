use serde::{Deserialize, Serialize};
use std::fmt;

/// A region of script text, 1-based in both line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    #[serde(rename = "line")]
    pub start_line: u32,
    #[serde(rename = "column")]
    pub start_col: u32,
    pub end_line: u32,
    #[serde(rename = "end_column")]
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Zero-width span, used for end-of-input and single-character faults.
    pub fn point(line: u32, col: u32) -> Self {
        Span {
            start_line: line,
            start_col: col,
            end_line: line,
            end_col: col,
        }
    }

    fn start(&self) -> (u32, u32) {
        (self.start_line, self.start_col)
    }

    fn end(&self) -> (u32, u32) {
        (self.end_line, self.end_col)
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        let (start_line, start_col) = self.start().min(other.start());
        let (end_line, end_col) = self.end().max(other.end());
        Span {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// A named script, kept alongside its tokens so diagnostics can quote the
/// offending line.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        SourceFile {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Text of the 1-based `line_number`, without its terminator.
    pub fn line(&self, line_number: u32) -> Option<&str> {
        let index = usize::try_from(line_number.checked_sub(1)?).ok()?;
        self.source
            .split('\n')
            .nth(index)
            .map(|text| text.strip_suffix('\r').unwrap_or(text))
    }
}
