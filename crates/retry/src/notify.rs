//! User-facing notifications emitted while retrying.
//!
//! The executor only knows the [`NotificationSink`] trait; whatever shows the
//! messages (toasts, a status bar, logs) plugs in behind it.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
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

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    /// Announcement of the upcoming attempt `next` (1-indexed).
    pub fn retrying(next: u32, max_attempts: u32) -> Self {
        Self::info(format!("Retrying... Attempt {next} of {max_attempts}"))
    }

    /// Terminal failure after all attempts were used.
    pub fn exhausted(max_attempts: u32, message: &str) -> Self {
        Self::error(format!("Failed after {max_attempts} attempts: {message}"))
    }
}

/// Destination for notifications.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<S> NotificationSink for Arc<S>
where
    S: NotificationSink + ?Sized,
{
    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}

/// Routes notifications to the tracing pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => {
                tracing::info!(target: "housebazaar::notify", "{}", notification.message)
            }
            NotificationLevel::Error => {
                tracing::error!(target: "housebazaar::notify", "{}", notification.message)
            }
        }
    }
}

/// Discards notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl NotificationSink for NoopSink {
    fn notify(&self, _notification: Notification) {}
}

/// Keeps every notification in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    /// Messages of the given level, in order.
    pub fn messages(&self, level: NotificationLevel) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|n| n.level == level)
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        // A panicking writer cannot leave a half-pushed Vec behind.
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.lock().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_retry_and_failure_messages() {
        assert_eq!(
            Notification::retrying(2, 3).message,
            "Retrying... Attempt 2 of 3"
        );
        assert_eq!(
            Notification::exhausted(3, "server error"),
            Notification::error("Failed after 3 attempts: server error")
        );
    }

    #[test]
    fn recording_sink_keeps_order_and_filters_by_level() {
        let sink = Arc::new(RecordingSink::new());
        let shared: Arc<dyn NotificationSink> = sink.clone();

        shared.notify(Notification::info("one"));
        shared.notify(Notification::error("two"));
        shared.notify(Notification::info("three"));

        assert_eq!(sink.notifications().len(), 3);
        assert_eq!(sink.messages(NotificationLevel::Info), vec!["one", "three"]);
        assert_eq!(sink.messages(NotificationLevel::Error), vec!["two"]);

        sink.clear();
        assert!(sink.notifications().is_empty());
    }
}
