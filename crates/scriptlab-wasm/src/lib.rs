//! scriptlab sandbox as a WASM module for browser environments.
//!
//! Exposes script execution, expected-output checking and highlighting via
//! `wasm-bindgen`, suitable for running in a browser Web Worker. There is
//! no wall-clock deadline in the browser build; runs are bounded by the
//! step budget, and the host may terminate the worker.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { execute_against, highlight } from 'scriptlab-wasm';
//!
//! await init();
//!
//! const result = JSON.parse(execute_against('log("Hello, World!")', "Hello, World!"));
//! // { output_lines: ["Hello, World!"], error_message: null, matched_expected: true, ... }
//! ```

use scriptlab_tutor::{matcher, ExecutionResult, Sandbox};
use serde::Serialize;
use wasm_bindgen::prelude::*;

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        format!(
            r#"{{"output_lines":[],"error_message":"Error: Serialization error: {}","matched_expected":false,"outcome":"faulted","steps":0}}"#,
            e
        )
    })
}

fn run(script: &str, expected: Option<&str>) -> ExecutionResult {
    matcher::execute_against(&Sandbox::default(), script, expected)
}

/// Run a script and capture its output.
///
/// Returns a JSON `ExecutionResult`:
/// ```json
/// {
///   "output_lines": ["3"],
///   "error_message": null,
///   "matched_expected": false,
///   "outcome": "completed",
///   "steps": 12
/// }
/// ```
#[wasm_bindgen]
pub fn execute(script: &str) -> String {
    to_json(&run(script, None))
}

/// Run a script and compare its output with `expected`.
///
/// An absent or empty `expected` disables the comparison.
#[wasm_bindgen]
pub fn execute_against(script: &str, expected: Option<String>) -> String {
    let expected = expected.filter(|e| !e.is_empty());
    to_json(&run(script, expected.as_deref()))
}

/// Highlight a script as HTML (`<span class="code-keyword">…</span>` etc.).
#[wasm_bindgen]
pub fn highlight(script: &str) -> String {
    scriptlab_tutor::highlight(script)
}

/// Return the package version string.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_execute_returns_result_json() {
        let json: Value = serde_json::from_str(&execute("log(1 + 2)")).unwrap();
        assert_eq!(json["output_lines"], serde_json::json!(["3"]));
        assert_eq!(json["outcome"], "completed");
        assert_eq!(json["matched_expected"], false);
    }

    #[test]
    fn test_execute_against() {
        let hit: Value =
            serde_json::from_str(&execute_against("log('ok')", Some("ok".to_string()))).unwrap();
        assert_eq!(hit["matched_expected"], true);
        let unchecked: Value =
            serde_json::from_str(&execute_against("log('ok')", Some(String::new()))).unwrap();
        assert_eq!(unchecked["matched_expected"], false);
    }

    #[test]
    fn test_fault_json() {
        let json: Value = serde_json::from_str(&execute("x.y")).unwrap();
        assert_eq!(json["error_message"], "Error: x is not defined");
        assert_eq!(json["outcome"], "faulted");
    }

    #[test]
    fn test_highlight_and_version() {
        assert_eq!(highlight("let"), r#"<span class="code-keyword">let</span>"#);
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}
