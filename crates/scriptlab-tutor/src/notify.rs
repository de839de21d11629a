//! Notifications raised by the navigator and session.

use serde::Serialize;
use std::fmt;

pub const RESET_MESSAGE: &str = "Code reset to tutorial example";
pub const MATCH_MESSAGE: &str = "Perfect! You got the expected output! 🎉";
pub const FAULT_MESSAGE: &str = "There was an error in your code. Check the output panel for details.";
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load tutorials";

/// `Loaded: <title>`, raised after navigating to a tutorial.
pub fn loaded_message(title: &str) -> String {
    format!("Loaded: {title}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "success",
            NotificationLevel::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Receiver for user-facing notifications (toasts, status lines).
pub trait NotificationSink {
    fn notify(&mut self, notification: Notification);

    fn info(&mut self, message: &str) {
        self.notify(Notification::info(message));
    }

    fn success(&mut self, message: &str) {
        self.notify(Notification::success(message));
    }

    fn error(&mut self, message: &str) {
        self.notify(Notification::error(message));
    }
}

/// Keeps every notification in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    history: Vec<Notification>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[Notification] {
        &self.history
    }

    pub fn last(&self) -> Option<&Notification> {
        self.history.last()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.history)
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&mut self, notification: Notification) {
        self.history.push(notification);
    }
}

/// Forwards notifications to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&mut self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => tracing::error!(text = %notification.message, "notification"),
            _ => tracing::info!(level = %notification.level, text = %notification.message, "notification"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let mut sink = RecordingSink::new();
        sink.info(&loaded_message("Loops"));
        sink.success(MATCH_MESSAGE);
        sink.error(FAULT_MESSAGE);
        let levels: Vec<_> = sink.history().iter().map(|n| n.level).collect();
        assert_eq!(
            levels,
            vec![
                NotificationLevel::Info,
                NotificationLevel::Success,
                NotificationLevel::Error
            ]
        );
        assert_eq!(sink.history()[0].message, "Loaded: Loops");
        assert_eq!(sink.drain().len(), 3);
        assert!(sink.last().is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Notification::info(RESET_MESSAGE).to_string(),
            "[info] Code reset to tutorial example"
        );
    }
}
