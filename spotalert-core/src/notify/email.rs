//! SMTP email channel.
//!
//! Port 465 uses implicit TLS; any other port negotiates STARTTLS.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChannelError, NotificationChannel};
use crate::domain::Notification;

const IMPLICIT_TLS_PORT: u16 = 465;

/// Non-secret SMTP options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub timeout_secs: u64,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: IMPLICIT_TLS_PORT,
            timeout_secs: 20,
        }
    }
}

pub struct EmailChannel {
    transport: SmtpTransport,
    from: Mailbox,
    to: Mailbox,
}

impl EmailChannel {
    /// `target` defaults to `sender` when absent.
    pub fn new(
        sender: &str,
        password: &str,
        target: Option<&str>,
        settings: &EmailSettings,
    ) -> Result<Self, ChannelError> {
        let from: Mailbox = sender
            .parse()
            .map_err(|e| ChannelError::InvalidMessage(format!("sender address: {e}")))?;
        let to: Mailbox = target
            .unwrap_or(sender)
            .parse()
            .map_err(|e| ChannelError::InvalidMessage(format!("target address: {e}")))?;

        let builder = if settings.smtp_port == IMPLICIT_TLS_PORT {
            SmtpTransport::relay(&settings.smtp_host)
        } else {
            SmtpTransport::starttls_relay(&settings.smtp_host)
        }
        .map_err(|e| ChannelError::Transport(format!("SMTP setup: {e}")))?;

        let transport = builder
            .port(settings.smtp_port)
            .credentials(Credentials::new(sender.to_string(), password.to_string()))
            .timeout(Some(Duration::from_secs(settings.timeout_secs)))
            .build();

        Ok(Self { transport, from, to })
    }

    fn message(&self, notification: &Notification) -> Result<Message, ChannelError> {
        build_message(self.from.clone(), self.to.clone(), notification)
    }
}

fn build_message(
    from: Mailbox,
    to: Mailbox,
    notification: &Notification,
) -> Result<Message, ChannelError> {
    Message::builder()
        .from(from)
        .to(to)
        .subject(notification.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(notification.body.clone())
        .map_err(|e| ChannelError::InvalidMessage(e.to_string()))
}

impl NotificationChannel for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        let message = self.message(notification)?;
        self.transport
            .send(&message)
            .map(|_| ())
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }
}
