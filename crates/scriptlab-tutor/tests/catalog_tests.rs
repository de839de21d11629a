//! Catalog loading and verification tests.
//!
//! Covers:
//! - JSON file provider: bare arrays, API envelopes, missing/bad files
//! - provider failures falling back to the built-in tutorial
//! - the bundled sample catalog passing its own checks
//! - highlighting every sample tutorial

use scriptlab_tutor::{
    highlight, verify_catalog, CatalogError, CatalogProvider, CatalogStore, JsonFileProvider,
    NotificationLevel, RecordingSink, Sandbox, SampleProvider, TutorSession, Tutorial,
    VerifyStatus,
};
use std::path::Path;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn write_catalog(dir: &Path, contents: &str) -> JsonFileProvider {
    let path = dir.join("tutorials.json");
    std::fs::write(&path, contents).expect("write catalog");
    JsonFileProvider::new(path)
}

struct FailingProvider;

impl CatalogProvider for FailingProvider {
    fn fetch_all(&self) -> Result<Vec<Tutorial>, CatalogError> {
        Err(CatalogError::Provider("service unavailable".to_string()))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Providers
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_json_file_bare_array() {
    let temp = tempfile::tempdir().expect("tempdir");
    let provider = write_catalog(
        temp.path(),
        r#"[
            {"Id": 1, "title": "One", "code": "log(1)", "expected_output": "1"},
            {"Id": 2, "title": "Two", "code": "log(2)", "hint": "two"}
        ]"#,
    );
    let tutorials = provider.fetch_all().expect("fetch");
    assert_eq!(tutorials.len(), 2);
    assert_eq!(tutorials[1].hint_text(), "two");
}

#[test]
fn test_json_file_envelope() {
    let temp = tempfile::tempdir().expect("tempdir");
    let provider = write_catalog(
        temp.path(),
        r#"{"success": true, "data": [{"Id": 4, "title": "Four", "Tags": "a,b"}]}"#,
    );
    let tutorials = provider.fetch_all().expect("fetch");
    assert_eq!(tutorials[0].tags, vec!["a", "b"]);
}

#[test]
fn test_missing_file_is_io_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let provider = JsonFileProvider::new(temp.path().join("nope.json"));
    assert!(matches!(provider.fetch_all(), Err(CatalogError::Io { .. })));
}

#[test]
fn test_parse_error_names_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let provider = write_catalog(temp.path(), "[{");
    let err = provider.fetch_all().unwrap_err();
    assert!(matches!(err, CatalogError::Parse { .. }));
    assert!(err.to_string().contains("tutorials.json"), "{err}");
}

#[test]
fn test_provider_failure_falls_back() {
    let session = TutorSession::load(Sandbox::default(), RecordingSink::new(), &FailingProvider);
    let state = session.state().expect("ready");
    assert_eq!(state.catalog().len(), 1);
    assert_eq!(state.cursor(), 0);
    assert_eq!(state.script(), r#"console.log("Hello, World!");"#);
    let history = session.sink().history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].level, NotificationLevel::Error);
    assert_eq!(history[0].message, "Failed to load tutorials");
}

#[test]
fn test_fallback_tutorial_runs_and_matches() {
    let mut session = TutorSession::load(Sandbox::default(), RecordingSink::new(), &FailingProvider);
    let result = session.run().expect("run");
    assert_eq!(result.output_lines, vec!["Hello, World!"]);
    assert!(result.matched_expected);
}

// ══════════════════════════════════════════════════════════════════════════════
// Sample catalog
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_sample_catalog_verifies() {
    let catalog = CatalogStore::new(SampleProvider.fetch_all().expect("sample catalog"));
    let summary = verify_catalog(&catalog, &Sandbox::default());
    assert!(summary.all_passed(), "{summary}");
    assert!(summary.passed >= 6, "{summary}");
    assert!(summary
        .checks
        .iter()
        .any(|c| c.status == VerifyStatus::Unchecked));
}

#[test]
fn test_sample_ids_are_unique() {
    let tutorials = SampleProvider.fetch_all().expect("sample catalog");
    assert!(CatalogStore::try_new(tutorials).is_ok());
}

#[test]
fn test_sample_code_highlights() {
    for tutorial in SampleProvider.fetch_all().expect("sample catalog") {
        let html = highlight(&tutorial.code);
        assert!(html.contains("<span class=\"code-"), "{}", tutorial.title);
        assert!(!html.contains("<span class=\"code-keyword\"><span"));
    }
}
