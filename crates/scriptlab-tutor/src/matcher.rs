//! Expected-output matching.

use scriptlab_eval::{ExecutionResult, Sandbox};

/// Join `observed` with newlines, trim both sides and compare exactly.
pub fn matches<S: AsRef<str>>(observed: &[S], expected: &str) -> bool {
    let joined = observed
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");
    joined.trim() == expected.trim()
}

/// Set `matched_expected` on a finished run. Faulted runs and runs without
/// expected output never match.
pub fn check(mut result: ExecutionResult, expected: Option<&str>) -> ExecutionResult {
    result.matched_expected = match expected {
        Some(expected) if result.is_success() => matches(result.output_lines.as_slice(), expected),
        _ => false,
    };
    result
}

/// Run `script` and check it against `expected`.
pub fn execute_against(sandbox: &Sandbox, script: &str, expected: Option<&str>) -> ExecutionResult {
    check(sandbox.execute(script), expected)
}
