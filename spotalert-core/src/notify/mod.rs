//! Notification channels and the fan-out dispatcher.
//!
//! Each channel owns its transport and its own timeout. The dispatcher runs
//! them in parallel and turns every failure into a [`ChannelResult`] value;
//! nothing a channel does can stop another channel from being attempted.

pub mod email;
pub mod pushover;

pub use email::{EmailChannel, EmailSettings};
pub use pushover::{PushoverChannel, PushoverSettings};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::Notification;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("rejected by service (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

/// A configured outbound notification channel.
///
/// Only fully configured channels exist; a channel missing half of its
/// credentials is never constructed.
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &str;

    fn send(&self, notification: &Notification) -> Result<(), ChannelError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ChannelOutcome {
    Delivered,
    Failed(String),
}

/// Outcome of one channel for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelResult {
    pub channel_name: String,
    pub outcome: ChannelOutcome,
}

impl ChannelResult {
    pub fn is_delivered(&self) -> bool {
        self.outcome == ChannelOutcome::Delivered
    }
}

/// Send `notification` through every channel concurrently.
///
/// Returns one result per channel, in the order the channels were given.
/// Blocks until every channel has finished.
pub fn dispatch(
    notification: &Notification,
    channels: &[Box<dyn NotificationChannel>],
) -> Vec<ChannelResult> {
    channels
        .par_iter()
        .map(|channel| {
            let outcome = match channel.send(notification) {
                Ok(()) => {
                    info!(channel = channel.name(), "notification delivered");
                    ChannelOutcome::Delivered
                }
                Err(e) => {
                    warn!(channel = channel.name(), error = %e, "notification failed");
                    ChannelOutcome::Failed(e.to_string())
                }
            };
            ChannelResult {
                channel_name: channel.name().to_string(),
                outcome,
            }
        })
        .collect()
}

/// Cut `s` to at most `max` characters, marking the cut with an ellipsis.
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
