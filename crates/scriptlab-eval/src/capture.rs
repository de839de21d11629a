//! Output capture buffer for one evaluation.

use crate::error::{EvalError, EvalResult};

/// Ordered, append-only log lines of a single run.
#[derive(Debug, Clone)]
pub struct OutputCapture {
    lines: Vec<String>,
    max_lines: usize,
}

impl OutputCapture {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: Vec::new(),
            max_lines,
        }
    }

    /// Append one line. Fails once the buffer already holds `max_lines`.
    pub fn push(&mut self, line: String) -> EvalResult<()> {
        if self.lines.len() >= self.max_lines {
            return Err(EvalError::OutputLimitExceeded(self.max_lines));
        }
        self.lines.push(line);
        Ok(())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}
