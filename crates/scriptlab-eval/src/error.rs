//! Runtime error types for the scriptlab evaluator.

use crate::value::Value;

/// Evaluation error: script-visible exceptions plus the sandbox limits that
/// end a run outright.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvalError {
    /// Wrong kind of value for an operation: calling a non-function,
    /// reading a property of `undefined`, assigning to a constant.
    #[error("{0}")]
    TypeError(String),
    /// Reading a name that was never declared, or a `let`/`const` before
    /// its declaration ran.
    #[error("{0}")]
    ReferenceError(String),
    /// Out-of-range argument or call depth.
    #[error("{0}")]
    RangeError(String),
    /// Malformed input to `JSON.parse`, or a duplicate declaration.
    #[error("{0}")]
    SyntaxError(String),
    /// A value raised by `throw`.
    #[error("uncaught exception")]
    Thrown(Value),
    /// Step budget exhausted.
    #[error("Execution step limit exceeded ({0} steps)")]
    GasExhausted(u64),
    /// Wall-clock deadline passed.
    #[error("Script execution timed out")]
    Timeout,
    /// The cancellation token was raised.
    #[error("Script execution was cancelled")]
    Cancelled,
    #[error("Heap object limit exceeded ({0} objects)")]
    HeapLimitExceeded(usize),
    #[error("Output line limit exceeded ({0} lines)")]
    OutputLimitExceeded(usize),
}

impl EvalError {
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError(message.into())
    }

    pub fn reference_error(message: impl Into<String>) -> Self {
        Self::ReferenceError(message.into())
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        Self::RangeError(message.into())
    }

    /// Whether `try`/`catch` may intercept this error. Sandbox limits are
    /// never catchable and skip `finally` blocks.
    pub fn is_catchable(&self) -> bool {
        matches!(
            self,
            Self::TypeError(_)
                | Self::ReferenceError(_)
                | Self::RangeError(_)
                | Self::SyntaxError(_)
                | Self::Thrown(_)
        )
    }

    /// Constructor name for errors raised by the runtime itself.
    pub fn error_name(&self) -> Option<&'static str> {
        match self {
            Self::TypeError(_) => Some("TypeError"),
            Self::ReferenceError(_) => Some("ReferenceError"),
            Self::RangeError(_) => Some("RangeError"),
            Self::SyntaxError(_) => Some("SyntaxError"),
            _ => None,
        }
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_the_bare_message() {
        let err = EvalError::reference_error("x is not defined");
        assert_eq!(err.to_string(), "x is not defined");
        assert_eq!(err.error_name(), Some("ReferenceError"));
    }

    #[test]
    fn test_limits_are_not_catchable() {
        assert!(EvalError::type_error("t").is_catchable());
        assert!(EvalError::Thrown(Value::Null).is_catchable());
        assert!(!EvalError::GasExhausted(10).is_catchable());
        assert!(!EvalError::Timeout.is_catchable());
        assert!(!EvalError::Cancelled.is_catchable());
        assert!(!EvalError::HeapLimitExceeded(1).is_catchable());
        assert!(!EvalError::OutputLimitExceeded(1).is_catchable());
    }
}
