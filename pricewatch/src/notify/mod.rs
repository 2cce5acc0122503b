pub mod ifttt;

use async_trait::async_trait;
use thiserror::Error;

pub use ifttt::IftttRealtimeNotifier;

#[derive(Error, Debug)]
pub enum NotifyError {
    /// The channel answered, but refused the notification.
    #[error("notification rejected with status {status}")]
    Rejected { status: reqwest::StatusCode },

    /// Transport failure or timeout; the channel never answered.
    #[error("notification channel unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("failed to build notification client: {0}")]
    Build(#[source] reqwest::Error),
}

/// Outbound subscriber channel. One call per firing trigger.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, trigger_identity: &str) -> Result<(), NotifyError>;
}
