//! Outbound notifications (email).
//!
//! Delivery is fire-and-forget: [`send_best_effort`] logs and discards any
//! failure so it can never fail the caller's request.

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Message {
    /// Greeting sent right after a successful registration.
    pub fn welcome(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: "Welcome to our service".to_string(),
            body: "Thank you for registering with our service!".to_string(),
        }
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &Message) -> Result<(), NotifyError>;
}

/// Notifier that writes each message to the log instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &Message) -> Result<(), NotifyError> {
        info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            "email sent"
        );
        Ok(())
    }
}

pub async fn send_best_effort(notifier: &dyn Notifier, message: &Message) {
    if let Err(e) = notifier.send(message).await {
        warn!(to = %message.to, error = %e, "notification dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Refusing;

    #[async_trait::async_trait]
    impl Notifier for Refusing {
        async fn send(&self, _message: &Message) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery("smtp down".to_string()))
        }
    }

    #[test]
    fn welcome_message_addresses_the_new_user() {
        let m = Message::welcome("noreply@shop.test", "ann@example.com");
        assert_eq!(m.to, "ann@example.com");
        assert_eq!(m.subject, "Welcome to our service");
    }

    #[tokio::test]
    async fn delivery_failures_are_swallowed() {
        let m = Message::welcome("noreply@shop.test", "ann@example.com");
        send_best_effort(&Refusing, &m).await;
        send_best_effort(&LogNotifier, &m).await;
    }
}
