//! scriptlab tutorial engine.
//!
//! Ties the sandbox to a tutorial catalog: tutorials are loaded from a
//! [`CatalogProvider`] into a [`CatalogStore`], the [`TutorState`] state
//! machine tracks the active tutorial, editor text and hint, and runs are
//! checked against the tutorial's expected output.

pub mod catalog;
pub mod config;
pub mod error;
pub mod highlight;
pub mod matcher;
pub mod navigator;
pub mod notify;
pub mod provider;
pub mod session;
pub mod tutorial;
pub mod verify;

pub use catalog::{CatalogStore, Progress};
pub use config::{load_config, LabConfig};
pub use error::{CatalogError, ConfigError, NavigationError, SessionError};
pub use highlight::{highlight, highlight_ansi};
pub use matcher::{execute_against, matches};
pub use navigator::{EditorState, Transition, TutorState};
pub use notify::{Notification, NotificationLevel, NotificationSink, RecordingSink, TracingSink};
pub use provider::{CatalogProvider, JsonFileProvider, SampleProvider, StaticProvider};
pub use session::{SessionPhase, TutorSession};
pub use tutorial::{Tutorial, TutorialId};
pub use verify::{verify_catalog, VerifyStatus, VerifySummary};

pub use scriptlab_eval::{ExecutionOutcome, ExecutionResult, Sandbox, SandboxConfig};
