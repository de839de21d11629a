//! scriptlab tree-walking evaluator and sandbox executor.
//!
//! Executes scripts directly from the AST produced by `scriptlab-parser`.
//! Each run owns its heap, scopes and output buffer; evaluation is bounded
//! by a step budget, call depth, heap size, output size, an optional
//! deadline and a cancellation token.

mod builtins;
pub mod capture;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod format;
pub mod heap;
pub mod sandbox;
pub mod value;

pub use capture::OutputCapture;
pub use error::{EvalError, EvalResult};
pub use evaluator::{EvalLimits, Evaluator};
pub use sandbox::{
    CancelToken, ExecutionOutcome, ExecutionResult, Sandbox, SandboxConfig, NO_OUTPUT_MESSAGE,
};
pub use value::Value;
