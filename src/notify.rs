//! Notification port
//!
//! Notifications are fire-and-forget. The engine reports the result as a
//! [`Delivery`] next to the grant instead of surfacing it as an error.

use serde::Serialize;
use tracing::info;

/// Error type for notification delivery
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification channel unavailable: {0}")]
    Unavailable(String),
}

/// Category of a notification, used by delivery backends for routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Reward,
    Streak,
    Badge,
    Challenge,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reward => "reward",
            Self::Streak => "streak",
            Self::Badge => "badge",
            Self::Challenge => "challenge",
        }
    }
}

/// Notification service collaborator
pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        kind: NoticeKind,
    ) -> Result<(), NotifyError>;
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        kind: NoticeKind,
    ) -> Result<(), NotifyError> {
        info!(user_id, kind = kind.as_str(), "{}: {}", title, message);
        Ok(())
    }
}

/// Drops every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _: &str, _: &str, _: &str, _: NoticeKind) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Result of the best-effort notification attached to a grant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "error")]
pub enum Delivery {
    /// Nothing was sent (no grant, or notifications disabled)
    #[default]
    Skipped,
    Sent,
    Failed(String),
}

impl Delivery {
    pub fn from_result(result: Result<(), NotifyError>) -> Self {
        match result {
            Ok(()) => Self::Sent,
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}
