//! Error types for the tutorial engine.

use crate::tutorial::TutorialId;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain a tutorial catalog from a provider.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate tutorial id {0}")]
    DuplicateId(TutorialId),
    /// Provider-specific failure, e.g. a rejected remote response.
    #[error("{0}")]
    Provider(String),
}

/// Rejected navigation request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("tutorial index {index} is out of range (catalog has {len})")]
    InvalidIndex { index: usize, len: usize },
    #[error("no tutorial with id {0}")]
    UnknownId(TutorialId),
}

/// Rejected session command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("tutorial catalog is still loading")]
    CatalogPending,
    #[error("a run is already in progress")]
    RunInProgress,
    #[error("no run is in progress")]
    NoRunInProgress,
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}
