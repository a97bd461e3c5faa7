//! User-facing success/error messages.

use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

pub trait NotificationSink: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

impl Notification {
    pub fn message(&self) -> &str {
        match self {
            Self::Success(message) | Self::Error(message) => message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Writes notifications to the tracing log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn success(&self, message: &str) {
        info!(target: "notification", "{message}");
    }

    fn error(&self, message: &str) {
        warn!(target: "notification", "{message}");
    }
}

/// Forwards notifications to a view over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new(tx: UnboundedSender<Notification>) -> Self {
        Self { tx }
    }

    fn forward(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::debug!("notification receiver dropped");
        }
    }
}

impl NotificationSink for ChannelNotifier {
    fn success(&self, message: &str) {
        self.forward(Notification::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.forward(Notification::Error(message.to_string()));
    }
}
