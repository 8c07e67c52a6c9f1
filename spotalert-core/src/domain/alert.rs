//! Alert-side domain types: detected intervals and composed notifications.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A maximal run of consecutive below-threshold samples.
///
/// `end` is exclusive: the last contributing sample's timestamp plus one
/// resolution step. Lives for one pipeline run only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertInterval {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub min_price: Decimal,
    pub sample_count: usize,
}

impl AlertInterval {
    /// True if `timestamp` lies in `[start, end)`.
    pub fn covers(&self, timestamp: DateTime<FixedOffset>) -> bool {
        self.start <= timestamp && timestamp < self.end
    }
}

/// Channel-agnostic message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}
