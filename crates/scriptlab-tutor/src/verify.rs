//! Catalog verification: run every tutorial's own code and check it
//! against its expected output.

use crate::catalog::CatalogStore;
use crate::matcher;
use crate::tutorial::{Tutorial, TutorialId};
use scriptlab_eval::{ExecutionResult, Sandbox};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyStatus {
    Passed,
    /// Ran cleanly but printed something else.
    Mismatch,
    /// Raised a fault or hit a limit.
    Faulted,
    /// No expected output to compare against.
    Unchecked,
}

/// Verification outcome for one tutorial.
#[derive(Debug, Clone, Serialize)]
pub struct TutorialCheck {
    pub id: TutorialId,
    pub title: String,
    pub status: VerifyStatus,
    /// The failure's error message or the observed output.
    pub detail: Option<String>,
}

impl fmt::Display for TutorialCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = match self.status {
            VerifyStatus::Passed => "✓",
            VerifyStatus::Unchecked => "-",
            VerifyStatus::Mismatch | VerifyStatus::Faulted => "✗",
        };
        write!(f, "  {mark} [{}] {}", self.id, self.title)?;
        match (&self.status, &self.detail) {
            (VerifyStatus::Mismatch, Some(output)) => write!(f, ": got {output:?}"),
            (VerifyStatus::Faulted, Some(error)) => write!(f, ": {error}"),
            (VerifyStatus::Unchecked, _) => f.write_str(" (no expected output)"),
            _ => Ok(()),
        }
    }
}

/// Results for a whole catalog.
#[derive(Debug, Clone, Serialize)]
pub struct VerifySummary {
    pub checks: Vec<TutorialCheck>,
    pub passed: usize,
    pub failed: usize,
    pub unchecked: usize,
}

impl VerifySummary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for VerifySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            writeln!(f, "{check}")?;
        }
        writeln!(
            f,
            "\n{} passed, {} failed, {} unchecked",
            self.passed, self.failed, self.unchecked
        )
    }
}

fn check_tutorial(tutorial: &Tutorial, result: ExecutionResult) -> TutorialCheck {
    let expected = tutorial.expected_output.as_deref();
    let result = matcher::check(result, expected);
    let (status, detail) = if let Some(error) = result.error_message {
        (VerifyStatus::Faulted, Some(error))
    } else if expected.is_none() {
        (VerifyStatus::Unchecked, None)
    } else if result.matched_expected {
        (VerifyStatus::Passed, None)
    } else {
        (VerifyStatus::Mismatch, Some(result.output_lines.join("\n")))
    };
    TutorialCheck {
        id: tutorial.id,
        title: tutorial.title.clone(),
        status,
        detail,
    }
}

/// Run each tutorial's default code in a fresh sandbox run.
pub fn verify_catalog(catalog: &CatalogStore, sandbox: &Sandbox) -> VerifySummary {
    let mut checks = Vec::with_capacity(catalog.len());
    for tutorial in catalog {
        let check = check_tutorial(tutorial, sandbox.execute(&tutorial.code));
        tracing::debug!(id = check.id, status = ?check.status, "tutorial verified");
        checks.push(check);
    }

    let count = |status| checks.iter().filter(|c| c.status == status).count();
    let passed = count(VerifyStatus::Passed);
    let unchecked = count(VerifyStatus::Unchecked);
    let failed = checks.len() - passed - unchecked;

    VerifySummary {
        checks,
        passed,
        failed,
        unchecked,
    }
}
