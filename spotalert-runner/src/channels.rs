//! Builds the configured notification channels from config + secrets.

use tracing::{debug, warn};

use spotalert_core::notify::{EmailChannel, NotificationChannel, PushoverChannel};

use crate::config::PipelineConfig;
use crate::secrets::Secrets;

/// Every channel whose credentials are complete.
///
/// A channel missing half its credential pair is skipped quietly; one that
/// has credentials but fails to construct (e.g. an unparsable address) is
/// skipped with a warning so the other channels still run.
pub fn build_channels(config: &PipelineConfig, secrets: &Secrets) -> Vec<Box<dyn NotificationChannel>> {
    let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

    match secrets.pushover() {
        Some((user, token)) => match PushoverChannel::new(user, token, config.pushover.clone()) {
            Ok(channel) => channels.push(Box::new(channel)),
            Err(e) => warn!(channel = "pushover", error = %e, "channel disabled"),
        },
        None => debug!(channel = "pushover", "credentials incomplete, channel disabled"),
    }

    match secrets.email() {
        Some((sender, password)) => {
            match EmailChannel::new(sender, password, secrets.email_target.as_deref(), &config.email) {
                Ok(channel) => channels.push(Box::new(channel)),
                Err(e) => warn!(channel = "email", error = %e, "channel disabled"),
            }
        }
        None => debug!(channel = "email", "credentials incomplete, channel disabled"),
    }

    channels
}
