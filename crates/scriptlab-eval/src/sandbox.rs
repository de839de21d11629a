//! Isolated script execution with output capture.
//!
//! Every call gets a fresh [`Evaluator`]: nothing survives between runs. The
//! only capability a script sees is `console.log` (and its alias `log`).
//! Native builds evaluate on a dedicated worker thread reached through a
//! channel, so a runaway script can be abandoned once its timeout passes.

use crate::error::EvalError;
use crate::evaluator::{EvalLimits, Evaluator};
use scriptlab_types::SourceFile;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Line reported for a run that finished without logging anything.
pub const NO_OUTPUT_MESSAGE: &str = "Code executed successfully (no output)";

/// Name given to scripts in error locations.
const SCRIPT_NAME: &str = "script.js";

/// Extra time the caller waits past the evaluator's own deadline before it
/// abandons the worker.
#[cfg(not(target_arch = "wasm32"))]
const WORKER_GRACE: Duration = Duration::from_millis(250);

#[cfg(not(target_arch = "wasm32"))]
const WORKER_STACK_SIZE: usize = 64 * 1024 * 1024;

// ══════════════════════════════════════════════════════════════════════════════
// Configuration
// ══════════════════════════════════════════════════════════════════════════════

/// Resource limits applied to every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxConfig {
    /// Evaluation steps before the run is stopped.
    pub step_limit: u64,
    /// Wall-clock limit; `None` waits forever.
    pub timeout: Option<Duration>,
    pub max_call_depth: usize,
    pub max_heap_objects: usize,
    pub max_output_lines: usize,
}

impl Default for SandboxConfig {
    #[cfg(not(target_arch = "wasm32"))]
    fn default() -> Self {
        Self {
            step_limit: 10_000_000,
            timeout: Some(Duration::from_secs(5)),
            max_call_depth: 256,
            max_heap_objects: 100_000,
            max_output_lines: 10_000,
        }
    }

    /// The browser build runs inline on a small stack without a clock.
    #[cfg(target_arch = "wasm32")]
    fn default() -> Self {
        Self {
            step_limit: 2_000_000,
            timeout: None,
            max_call_depth: 64,
            max_heap_objects: 50_000,
            max_output_lines: 5_000,
        }
    }
}

impl SandboxConfig {
    fn limits(&self) -> EvalLimits {
        EvalLimits {
            gas_limit: self.step_limit,
            max_call_depth: self.max_call_depth,
            max_heap_objects: self.max_heap_objects,
            max_output_lines: self.max_output_lines,
            deadline: deadline_after(self.timeout),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn deadline_after(timeout: Option<Duration>) -> Option<std::time::Instant> {
    timeout.map(|t| std::time::Instant::now() + t)
}

#[cfg(target_arch = "wasm32")]
fn deadline_after(_timeout: Option<Duration>) -> Option<std::time::Instant> {
    None
}

// ══════════════════════════════════════════════════════════════════════════════
// Cancellation
// ══════════════════════════════════════════════════════════════════════════════

/// Shared flag that stops a running evaluation at its next poll.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Results
// ══════════════════════════════════════════════════════════════════════════════

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Completed,
    /// Syntax error or uncaught runtime error.
    Faulted,
    TimedOut,
    Cancelled,
    /// Step, heap or output limit reached.
    BudgetExhausted,
}

impl ExecutionOutcome {
    fn from_error(err: &EvalError) -> Self {
        match err {
            EvalError::GasExhausted(_)
            | EvalError::HeapLimitExceeded(_)
            | EvalError::OutputLimitExceeded(_) => Self::BudgetExhausted,
            EvalError::Timeout => Self::TimedOut,
            EvalError::Cancelled => Self::Cancelled,
            _ => Self::Faulted,
        }
    }
}

/// Outcome of one sandboxed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Logged lines in call order.
    pub output_lines: Vec<String>,
    /// `Error: <description>` when the run faulted.
    pub error_message: Option<String>,
    /// Whether the output matched the expected output. Only set by a
    /// caller that has expected output to compare against.
    pub matched_expected: bool,
    pub outcome: ExecutionOutcome,
    /// Evaluation steps consumed.
    pub steps: u64,
}

impl ExecutionResult {
    fn failed(output_lines: Vec<String>, message: String, outcome: ExecutionOutcome, steps: u64) -> Self {
        Self {
            output_lines,
            error_message: Some(format!("Error: {message}")),
            matched_expected: false,
            outcome,
            steps,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_message.is_none()
    }

    /// Text for the output panel: the error when there is one, otherwise
    /// the logged lines.
    pub fn display_text(&self) -> String {
        match &self.error_message {
            Some(message) => message.clone(),
            None => self.output_lines.join("\n"),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Executor
// ══════════════════════════════════════════════════════════════════════════════

/// Runs scripts in isolation under a [`SandboxConfig`].
#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    config: SandboxConfig,
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Run `script` with a fresh cancellation token.
    pub fn execute(&self, script: &str) -> ExecutionResult {
        self.execute_with(script, &CancelToken::new())
    }

    /// Run `script` on a worker thread. Returns as soon as the worker
    /// reports back or the timeout passes; in the latter case `token` is
    /// raised so the worker stops at its next poll.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn execute_with(&self, script: &str, token: &CancelToken) -> ExecutionResult {
        use std::sync::mpsc;

        let (tx, rx) = mpsc::channel();
        let worker_sandbox = self.clone();
        let worker_token = token.clone();
        let script = script.to_string();
        let spawned = std::thread::Builder::new()
            .name("scriptlab-sandbox".to_string())
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || {
                let result = worker_sandbox.execute_inline(&script, &worker_token);
                // The receiver is gone if the caller already timed out.
                let _ = tx.send(result);
            });
        if let Err(err) = spawned {
            return ExecutionResult::failed(
                Vec::new(),
                format!("could not start sandbox worker: {err}"),
                ExecutionOutcome::Faulted,
                0,
            );
        }

        let received = match self.config.timeout {
            Some(timeout) => rx.recv_timeout(timeout + WORKER_GRACE),
            None => rx.recv().map_err(|_| mpsc::RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                token.cancel();
                tracing::warn!(
                    timeout_ms = self.config.timeout.map_or(0, |t| t.as_millis() as u64),
                    "sandbox worker did not finish in time"
                );
                ExecutionResult::failed(
                    Vec::new(),
                    EvalError::Timeout.to_string(),
                    ExecutionOutcome::TimedOut,
                    0,
                )
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => ExecutionResult::failed(
                Vec::new(),
                "Script execution crashed".to_string(),
                ExecutionOutcome::Faulted,
                0,
            ),
        }
    }

    /// Browser builds have no threads; run in place.
    #[cfg(target_arch = "wasm32")]
    pub fn execute_with(&self, script: &str, token: &CancelToken) -> ExecutionResult {
        self.execute_inline(script, token)
    }

    /// Parse and evaluate `script` on the current thread.
    pub fn execute_inline(&self, script: &str, token: &CancelToken) -> ExecutionResult {
        let source = SourceFile::new(SCRIPT_NAME, script);
        let parsed = scriptlab_parser::parse_script(&source);
        let program = match (parsed.program, parsed.errors.first()) {
            (Some(program), None) => program,
            (_, first) => {
                let message = first
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "Unexpected end of input".to_string());
                tracing::debug!(error = %message, "script failed to parse");
                return ExecutionResult::failed(Vec::new(), message, ExecutionOutcome::Faulted, 0);
            }
        };

        let mut evaluator = Evaluator::new(self.config.limits()).with_cancel(token.clone());
        let run = evaluator.run(&program);
        let steps = evaluator.gas_used();
        let result = match run {
            Ok(()) => {
                let mut output_lines = evaluator.into_output();
                if output_lines.is_empty() {
                    output_lines.push(NO_OUTPUT_MESSAGE.to_string());
                }
                ExecutionResult {
                    output_lines,
                    error_message: None,
                    matched_expected: false,
                    outcome: ExecutionOutcome::Completed,
                    steps,
                }
            }
            Err(err) => {
                let outcome = ExecutionOutcome::from_error(&err);
                let message = evaluator.describe_error(&err);
                if outcome == ExecutionOutcome::TimedOut {
                    tracing::warn!(steps, "script timed out");
                }
                ExecutionResult::failed(evaluator.into_output(), message, outcome, steps)
            }
        };
        tracing::debug!(
            steps = result.steps,
            outcome = ?result.outcome,
            lines = result.output_lines.len(),
            "script finished"
        );
        result
    }
}
