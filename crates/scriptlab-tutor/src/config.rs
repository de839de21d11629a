//! Lab configuration stored as TOML.
//!
//! ```toml
//! [sandbox]
//! step_limit = 10000000
//! timeout_ms = 5000
//!
//! [catalog]
//! path = "tutorials.json"
//! ```
//!
//! Every field is optional; a missing file yields the defaults.

use crate::error::ConfigError;
use scriptlab_eval::SandboxConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub sandbox: SandboxSettings,
    pub catalog: CatalogSettings,
}

/// Sandbox limits. `timeout_ms = 0` is rejected; omit the key to keep the
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSettings {
    pub step_limit: u64,
    pub timeout_ms: u64,
    pub max_call_depth: usize,
    pub max_heap_objects: usize,
    pub max_output_lines: usize,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        let defaults = SandboxConfig::default();
        Self {
            step_limit: defaults.step_limit,
            timeout_ms: defaults
                .timeout
                .map_or(5_000, |t| t.as_millis().min(u64::MAX as u128) as u64),
            max_call_depth: defaults.max_call_depth,
            max_heap_objects: defaults.max_heap_objects,
            max_output_lines: defaults.max_output_lines,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// JSON catalog file; the built-in sample catalog when unset.
    pub path: Option<PathBuf>,
}

impl LabConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.sandbox;
        let limits = [
            ("sandbox.step_limit", s.step_limit == 0),
            ("sandbox.timeout_ms", s.timeout_ms == 0),
            ("sandbox.max_call_depth", s.max_call_depth == 0),
            ("sandbox.max_heap_objects", s.max_heap_objects == 0),
            ("sandbox.max_output_lines", s.max_output_lines == 0),
        ];
        for (name, is_zero) in limits {
            if is_zero {
                return Err(ConfigError::Invalid(format!("{name} must be > 0")));
            }
        }
        Ok(())
    }

    pub fn sandbox_config(&self) -> SandboxConfig {
        let s = &self.sandbox;
        SandboxConfig {
            step_limit: s.step_limit,
            timeout: Some(Duration::from_millis(s.timeout_ms)),
            max_call_depth: s.max_call_depth,
            max_heap_objects: s.max_heap_objects,
            max_output_lines: s.max_output_lines,
        }
    }

    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: LabConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// Load config from a TOML file. A missing file returns the defaults.
pub fn load_config(path: &Path) -> Result<LabConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(LabConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    LabConfig::from_toml(&text, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(config, LabConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("scriptlab.toml");
        std::fs::write(
            &path,
            "[sandbox]\ntimeout_ms = 250\n\n[catalog]\npath = \"lessons.json\"\n",
        )
        .expect("write");
        let config = load_config(&path).expect("load");
        assert_eq!(config.sandbox.timeout_ms, 250);
        assert_eq!(config.sandbox.step_limit, SandboxSettings::default().step_limit);
        assert_eq!(config.catalog.path, Some(PathBuf::from("lessons.json")));
        assert_eq!(
            config.sandbox_config().timeout,
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_zero_limit_rejected() {
        let err = LabConfig::from_toml("[sandbox]\nstep_limit = 0\n", Path::new("x.toml"))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid config: sandbox.step_limit must be > 0");
    }

    #[test]
    fn test_unparseable_file() {
        let err = LabConfig::from_toml("[sandbox\n", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_serialized_defaults_reload() {
        let text = toml::to_string(&LabConfig::default()).expect("serialize");
        let reloaded = LabConfig::from_toml(&text, Path::new("defaults.toml")).expect("reload");
        assert_eq!(reloaded, LabConfig::default());
    }
}
