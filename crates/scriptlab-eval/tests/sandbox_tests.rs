//! Sandbox tests: limits, isolation and cancellation.
//!
//! Covers:
//! - step budget, wall-clock timeout and call depth
//! - output and heap limits
//! - no state shared between runs
//! - no ambient capabilities beyond `console.log`
//! - cancellation and determinism

use scriptlab_eval::{
    CancelToken, ExecutionOutcome, ExecutionResult, Sandbox, SandboxConfig, NO_OUTPUT_MESSAGE,
};
use std::time::{Duration, Instant};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn run(source: &str) -> ExecutionResult {
    Sandbox::default().execute(source)
}

fn run_with(config: SandboxConfig, source: &str) -> ExecutionResult {
    Sandbox::new(config).execute(source)
}

// ══════════════════════════════════════════════════════════════════════════════
// Budgets
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_step_limit_stops_infinite_loop() {
    let config = SandboxConfig {
        step_limit: 1000,
        ..SandboxConfig::default()
    };
    let result = run_with(config, "while (true) {}");
    assert_eq!(result.outcome, ExecutionOutcome::BudgetExhausted);
    assert_eq!(
        result.error_message.as_deref(),
        Some("Error: Execution step limit exceeded (1000 steps)")
    );
    assert!(!result.matched_expected);
}

#[test]
fn test_timeout_stops_infinite_loop() {
    let config = SandboxConfig {
        step_limit: u64::MAX,
        timeout: Some(Duration::from_millis(100)),
        ..SandboxConfig::default()
    };
    let started = Instant::now();
    let result = run_with(config, "let i = 0; while (true) { i++ }");
    assert_eq!(result.outcome, ExecutionOutcome::TimedOut);
    assert_eq!(
        result.error_message.as_deref(),
        Some("Error: Script execution timed out")
    );
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_output_before_timeout_is_reported() {
    let config = SandboxConfig {
        step_limit: u64::MAX,
        timeout: Some(Duration::from_millis(100)),
        ..SandboxConfig::default()
    };
    let result = run_with(config, "log('started'); for (;;) {}");
    assert_eq!(result.outcome, ExecutionOutcome::TimedOut);
    assert_eq!(result.output_lines, vec!["started"]);
}

#[test]
fn test_unbounded_recursion() {
    let result = run("function f() { return f() } f()");
    assert_eq!(result.outcome, ExecutionOutcome::Faulted);
    assert_eq!(
        result.error_message.as_deref(),
        Some("Error: Maximum call stack size exceeded")
    );
}

#[test]
fn test_recursion_error_is_catchable() {
    let result = run("function f() { return f() } try { f() } catch (e) { log(e.name, e.message) }");
    assert_eq!(
        result.output_lines,
        vec!["RangeError Maximum call stack size exceeded"]
    );
}

#[test]
fn test_output_line_limit() {
    let config = SandboxConfig {
        max_output_lines: 10,
        ..SandboxConfig::default()
    };
    let result = run_with(config, "for (let i = 0; i < 100; i++) log(i)");
    assert_eq!(result.outcome, ExecutionOutcome::BudgetExhausted);
    assert_eq!(result.output_lines.len(), 10);
    assert_eq!(result.output_lines[9], "9");
    assert_eq!(
        result.error_message.as_deref(),
        Some("Error: Output line limit exceeded (10 lines)")
    );
}

#[test]
fn test_heap_limit() {
    let config = SandboxConfig {
        max_heap_objects: 1000,
        ..SandboxConfig::default()
    };
    let result = run_with(config, "const keep = []; while (true) keep.push({})");
    assert_eq!(result.outcome, ExecutionOutcome::BudgetExhausted);
    let message = result.error_message.unwrap_or_default();
    assert!(message.starts_with("Error: Heap object limit exceeded"), "{message}");
}

#[test]
fn test_budget_errors_cannot_be_caught() {
    let config = SandboxConfig {
        step_limit: 1000,
        ..SandboxConfig::default()
    };
    let result = run_with(config, "try { while (true) {} } catch (e) { log('caught') }");
    assert_eq!(result.outcome, ExecutionOutcome::BudgetExhausted);
    assert!(result.output_lines.is_empty());
}

#[test]
fn test_steps_are_reported() {
    let small = run("log(1)");
    let large = run("let s = 0; for (let i = 0; i < 1000; i++) s += i; log(s)");
    assert!(small.steps > 0);
    assert!(large.steps > small.steps);
    assert_eq!(large.output_lines, vec!["499500"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Isolation
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_runs_share_no_state() {
    let sandbox = Sandbox::default();
    let first = sandbox.execute("var leaked = 42; globalThing = 1; log(leaked)");
    assert_eq!(first.output_lines, vec!["42"]);
    let second = sandbox.execute("log(typeof leaked, typeof globalThing)");
    assert_eq!(second.output_lines, vec!["undefined undefined"]);
}

#[test]
fn test_builtins_cannot_be_poisoned_across_runs() {
    let sandbox = Sandbox::default();
    sandbox.execute("Math.max = () => 0");
    let result = sandbox.execute("log(Math.max(1, 2))");
    assert_eq!(result.output_lines, vec!["2"]);
}

#[test]
fn test_no_ambient_capabilities() {
    let result = run("log(typeof fetch, typeof setTimeout, typeof require, typeof process)");
    assert_eq!(
        result.output_lines,
        vec!["undefined undefined undefined undefined"]
    );
}

#[test]
fn test_empty_script() {
    let result = run("");
    assert!(result.is_success());
    assert_eq!(result.output_lines, vec![NO_OUTPUT_MESSAGE]);
    let comments_only = run("// nothing here\n/* still nothing */");
    assert_eq!(comments_only.output_lines, vec![NO_OUTPUT_MESSAGE]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Cancellation & determinism
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_cancelled_token_stops_run() {
    let token = CancelToken::new();
    token.cancel();
    let result = Sandbox::default().execute_with("while (true) {}", &token);
    assert_eq!(result.outcome, ExecutionOutcome::Cancelled);
    assert_eq!(
        result.error_message.as_deref(),
        Some("Error: Script execution was cancelled")
    );
}

#[test]
fn test_repeated_runs_are_identical() {
    let src = "const xs = [3, 1, 2].map(x => x * Math.random()); log(xs.length, Math.random())";
    let first = run(src);
    let second = run(src);
    assert_eq!(first, second);
}

#[test]
fn test_result_serializes_for_hosts() {
    let result = run("log('hi')");
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["output_lines"][0], "hi");
    assert_eq!(json["outcome"], "completed");
    assert_eq!(json["error_message"], serde_json::Value::Null);
}
