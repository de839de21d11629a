//! Tutorial records.
//!
//! Records arrive from the catalog API as loosely-typed JSON: optional
//! fields may be missing, empty or `null`, and tags are a comma-separated
//! string. [`Tutorial`] normalizes all of that once at load time so the rest
//! of the engine never sees an absent script.

use serde::{Deserialize, Serialize};

/// Externally assigned, stable tutorial identifier.
pub type TutorialId = u64;

/// Script shown when a record carries no code.
pub const PLACEHOLDER_CODE: &str = r#"console.log("Hello, World!");"#;

/// Hint text shown when a tutorial has none.
pub const NO_HINT_MESSAGE: &str = "No hint available for this tutorial.";

pub const DEFAULT_TITLE: &str = "JavaScript Tutorial";
pub const DEFAULT_DESCRIPTION: &str = "Interactive JavaScript tutorial";

/// One script example with optional expected output and hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TutorialRecord")]
pub struct Tutorial {
    #[serde(rename = "Id")]
    pub id: TutorialId,
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub title: String,
    pub description: String,
    /// Default script text; never empty.
    pub code: String,
    /// `None` means runs are not checked.
    pub expected_output: Option<String>,
    pub hint: Option<String>,
    #[serde(rename = "Tags", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Tutorial {
    pub fn new(id: TutorialId, title: impl Into<String>, code: impl Into<String>) -> Self {
        Self::from(TutorialRecord {
            id,
            title: Some(title.into()),
            code: Some(code.into()),
            ..TutorialRecord::default()
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_empty(Some(description.into()))
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
        self
    }

    pub fn with_expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = non_empty(Some(expected.into()));
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = non_empty(Some(hint.into()));
        self
    }

    /// The tutorial used when no catalog could be loaded.
    pub fn fallback() -> Self {
        Tutorial::new(1, "Hello World", PLACEHOLDER_CODE)
            .with_description("Learn how to display text with console.log()")
            .with_expected_output("Hello, World!")
            .with_hint(
                "Use console.log() to display text in the console. \
                 Don't forget the quotes around your text!",
            )
    }

    /// Hint to display, falling back to [`NO_HINT_MESSAGE`].
    pub fn hint_text(&self) -> &str {
        self.hint.as_deref().unwrap_or(NO_HINT_MESSAGE)
    }

    pub fn has_expected_output(&self) -> bool {
        self.expected_output.is_some()
    }
}

/// Wire shape of a tutorial record.
#[derive(Debug, Default, Deserialize)]
struct TutorialRecord {
    #[serde(rename = "Id", alias = "id")]
    id: TutorialId,
    #[serde(rename = "Name", alias = "name", default)]
    name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(alias = "expectedOutput", default)]
    expected_output: Option<String>,
    #[serde(default)]
    hint: Option<String>,
    #[serde(rename = "Tags", alias = "tags", default)]
    tags: Option<TagsField>,
}

/// Tags are stored as `"a,b"` but also accepted as a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagsField {
    Text(String),
    List(Vec<String>),
}

impl TagsField {
    fn into_tags(self) -> Vec<String> {
        let raw = match self {
            TagsField::Text(text) => text.split(',').map(str::to_string).collect(),
            TagsField::List(list) => list,
        };
        raw.into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

/// Only an empty string counts as missing; whitespace is kept as given.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl From<TutorialRecord> for Tutorial {
    fn from(record: TutorialRecord) -> Self {
        Self {
            id: record.id,
            name: non_empty(record.name),
            title: non_empty(record.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: non_empty(record.description)
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            code: non_empty(record.code).unwrap_or_else(|| PLACEHOLDER_CODE.to_string()),
            expected_output: non_empty(record.expected_output),
            hint: non_empty(record.hint),
            tags: record.tags.map(TagsField::into_tags).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_fields_and_aliases() {
        let json = r#"{
            "Id": 7,
            "Name": "loops",
            "title": "Loops",
            "code": "for (let i = 0; i < 3; i++) log(i)",
            "expectedOutput": "0\n1\n2",
            "Tags": "basics, loops,"
        }"#;
        let tutorial: Tutorial = serde_json::from_str(json).unwrap();
        assert_eq!(tutorial.id, 7);
        assert_eq!(tutorial.name.as_deref(), Some("loops"));
        assert_eq!(tutorial.expected_output.as_deref(), Some("0\n1\n2"));
        assert_eq!(tutorial.tags, vec!["basics", "loops"]);
        assert_eq!(tutorial.description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn test_whitespace_expected_output_is_still_checked() {
        let json = r#"{"id": 4, "code": "log(' ')", "expected_output": "  "}"#;
        let tutorial: Tutorial = serde_json::from_str(json).unwrap();
        assert_eq!(tutorial.expected_output.as_deref(), Some("  "));
        assert!(tutorial.has_expected_output());
        assert!(crate::matcher::matches(&[" "], "  "));
    }

    #[test]
    fn test_missing_and_empty_fields_fall_back() {
        let json = r#"{"id": 3, "code": "", "expected_output": "", "hint": null}"#;
        let tutorial: Tutorial = serde_json::from_str(json).unwrap();
        assert_eq!(tutorial.code, PLACEHOLDER_CODE);
        assert_eq!(tutorial.title, DEFAULT_TITLE);
        assert_eq!(tutorial.expected_output, None);
        assert_eq!(tutorial.hint_text(), NO_HINT_MESSAGE);
        assert!(!tutorial.has_expected_output());
    }

    #[test]
    fn test_missing_id_is_rejected() {
        assert!(serde_json::from_str::<Tutorial>(r#"{"title": "x"}"#).is_err());
    }

    #[test]
    fn test_serialized_form_reloads() {
        let original = Tutorial::fallback();
        let json = serde_json::to_string(&original).unwrap();
        assert!(json.contains(r#""Id":1"#));
        let reloaded: Tutorial = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, original);
    }

    #[test]
    fn test_fallback_tutorial() {
        let tutorial = Tutorial::fallback();
        assert_eq!(tutorial.id, 1);
        assert_eq!(tutorial.title, "Hello World");
        assert_eq!(tutorial.code, r#"console.log("Hello, World!");"#);
        assert_eq!(tutorial.expected_output.as_deref(), Some("Hello, World!"));
        assert!(tutorial.hint_text().contains("console.log()"));
    }
}
