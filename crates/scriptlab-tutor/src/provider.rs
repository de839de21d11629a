//! Tutorial catalog providers.
//!
//! A provider hands over the full tutorial list in one call. Catalog
//! documents use the record API's shape: either a bare JSON array of
//! records or an envelope `{ "success": true, "data": [...] }`.

use crate::error::CatalogError;
use crate::tutorial::Tutorial;
use serde_json::Value as Json;
use std::path::{Path, PathBuf};

/// Source of the tutorial catalog.
pub trait CatalogProvider {
    fn fetch_all(&self) -> Result<Vec<Tutorial>, CatalogError>;

    /// Short label for logs.
    fn describe(&self) -> String {
        "catalog".to_string()
    }
}

/// Parse a catalog document.
pub fn parse_catalog(text: &str) -> Result<Vec<Tutorial>, CatalogError> {
    parse_document(text, Path::new("<inline>"))
}

fn parse_document(text: &str, path: &Path) -> Result<Vec<Tutorial>, CatalogError> {
    let parse_error = |source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let document: Json = serde_json::from_str(text).map_err(parse_error)?;
    let records = match document {
        Json::Array(items) => Json::Array(items),
        Json::Object(mut envelope) => {
            if envelope.get("success") == Some(&Json::Bool(false)) {
                let message = envelope
                    .get("message")
                    .and_then(Json::as_str)
                    .unwrap_or("catalog request failed");
                return Err(CatalogError::Provider(message.to_string()));
            }
            match envelope.remove("data") {
                Some(Json::Null) | None => return Ok(Vec::new()),
                Some(data) => data,
            }
        }
        _ => {
            return Err(CatalogError::Provider(
                "catalog must be an array or an object with a `data` array".to_string(),
            ))
        }
    };
    serde_json::from_value(records).map_err(parse_error)
}

// ══════════════════════════════════════════════════════════════════════════════
// Providers
// ══════════════════════════════════════════════════════════════════════════════

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    tutorials: Vec<Tutorial>,
}

impl StaticProvider {
    pub fn new(tutorials: Vec<Tutorial>) -> Self {
        Self { tutorials }
    }
}

impl CatalogProvider for StaticProvider {
    fn fetch_all(&self) -> Result<Vec<Tutorial>, CatalogError> {
        Ok(self.tutorials.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory tutorials", self.tutorials.len())
    }
}

/// Catalog read from a JSON file on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogProvider for JsonFileProvider {
    fn fetch_all(&self) -> Result<Vec<Tutorial>, CatalogError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| CatalogError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_document(&text, &self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

const SAMPLE_CATALOG: &str = include_str!("../data/sample_catalog.json");

/// The catalog bundled with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleProvider;

impl CatalogProvider for SampleProvider {
    fn fetch_all(&self) -> Result<Vec<Tutorial>, CatalogError> {
        parse_catalog(SAMPLE_CATALOG)
    }

    fn describe(&self) -> String {
        "built-in sample catalog".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_array() {
        let tutorials = parse_catalog(r#"[{"Id": 1, "title": "A"}, {"Id": 2}]"#).unwrap();
        assert_eq!(tutorials.len(), 2);
        assert_eq!(tutorials[1].id, 2);
    }

    #[test]
    fn test_envelope() {
        let tutorials = parse_catalog(r#"{"success": true, "data": [{"Id": 5}]}"#).unwrap();
        assert_eq!(tutorials[0].id, 5);
        assert!(parse_catalog(r#"{"data": null}"#).unwrap().is_empty());
    }

    #[test]
    fn test_failed_envelope_carries_message() {
        let err = parse_catalog(r#"{"success": false, "message": "quota exceeded"}"#).unwrap_err();
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(parse_catalog("{"), Err(CatalogError::Parse { .. })));
        assert!(matches!(
            parse_catalog(r#"[{"title": "no id"}]"#),
            Err(CatalogError::Parse { .. })
        ));
        assert!(matches!(parse_catalog("42"), Err(CatalogError::Provider(_))));
    }

    #[test]
    fn test_sample_catalog_loads() {
        let tutorials = SampleProvider.fetch_all().unwrap();
        assert!(tutorials.len() >= 5);
        let fallback = Tutorial::fallback();
        assert_eq!(tutorials[0].code, fallback.code);
        assert_eq!(tutorials[0].expected_output, fallback.expected_output);
        assert_eq!(tutorials[0].tags, vec!["basics", "output"]);
        assert!(tutorials.iter().any(|t| t.expected_output.is_none()));
    }
}
