//! Pushover push-notification channel.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{truncate_chars, ChannelError, NotificationChannel};
use crate::domain::Notification;

pub const DEFAULT_ENDPOINT: &str = "https://api.pushover.net/1/messages.json";

/// Pushover limits, in characters.
const MAX_TITLE: usize = 250;
const MAX_MESSAGE: usize = 1024;

/// Non-secret Pushover options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushoverSettings {
    pub endpoint: String,
    /// -2..=1; 2 (emergency) needs retry/expire parameters and is not supported.
    pub priority: i8,
    pub timeout_secs: u64,
}

impl Default for PushoverSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            priority: 1,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PushoverReply {
    status: i32,
    #[serde(default)]
    errors: Vec<String>,
}

pub struct PushoverChannel {
    client: reqwest::blocking::Client,
    settings: PushoverSettings,
    user_key: String,
    api_token: String,
}

impl PushoverChannel {
    pub fn new(
        user_key: impl Into<String>,
        api_token: impl Into<String>,
        settings: PushoverSettings,
    ) -> Result<Self, ChannelError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ChannelError::Transport(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            settings,
            user_key: user_key.into(),
            api_token: api_token.into(),
        })
    }
}

impl NotificationChannel for PushoverChannel {
    fn name(&self) -> &str {
        "pushover"
    }

    fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        let title = truncate_chars(&notification.subject, MAX_TITLE);
        let message = truncate_chars(&notification.body, MAX_MESSAGE);
        let priority = self.settings.priority.to_string();

        let resp = self
            .client
            .post(&self.settings.endpoint)
            .form(&[
                ("token", self.api_token.as_str()),
                ("user", self.user_key.as_str()),
                ("title", title.as_str()),
                ("message", message.as_str()),
                ("priority", priority.as_str()),
            ])
            .send()
            .map_err(|e| ChannelError::Transport(e.without_url().to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| ChannelError::Transport(e.without_url().to_string()))?;
        let reply: Option<PushoverReply> = serde_json::from_str(&body).ok();

        match reply {
            Some(reply) if status.is_success() && reply.status == 1 => Ok(()),
            Some(reply) => Err(ChannelError::Rejected {
                status: status.as_u16(),
                detail: if reply.errors.is_empty() {
                    format!("status {}", reply.status)
                } else {
                    reply.errors.join("; ")
                },
            }),
            None => Err(ChannelError::Rejected {
                status: status.as_u16(),
                detail: truncate_chars(&body, 200),
            }),
        }
    }
}
