//! PriceSeries: one market day of spot prices at a fixed cadence.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detect::ProductionWindow;

/// A single spot price observation.
///
/// `timestamp` is the start of the delivery period in market-local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: DateTime<FixedOffset>,
    pub price_per_mwh: Decimal,
}

impl PriceSample {
    pub fn new(timestamp: DateTime<FixedOffset>, price_per_mwh: Decimal) -> Self {
        Self {
            timestamp,
            price_per_mwh,
        }
    }

    /// Price converted to EUR/kWh. Only used for presentation.
    pub fn price_per_kwh(&self) -> Decimal {
        self.price_per_mwh / Decimal::ONE_THOUSAND
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeriesError {
    #[error("unsupported resolution: {minutes} minutes (expected 15, 30 or 60)")]
    UnsupportedResolution { minutes: i64 },

    #[error("samples out of order at index {index}: {previous} is not before {current}")]
    NotIncreasing {
        index: usize,
        previous: DateTime<FixedOffset>,
        current: DateTime<FixedOffset>,
    },

    #[error("sample at index {index} ({timestamp}) is off the {minutes}-minute grid")]
    OffCadence {
        index: usize,
        timestamp: DateTime<FixedOffset>,
        minutes: i64,
    },
}

/// Immutable, validated price curve for one delivery day.
///
/// Invariants (checked by [`PriceSeries::new`]):
/// - timestamps strictly increase
/// - every gap between neighbours is a whole multiple of `resolution`
///
/// Series built from upstream data are contiguous; a gap only appears after
/// [`PriceSeries::restrict_to_hours`] drops samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceSeries {
    day: NaiveDate,
    resolution: Duration,
    samples: Vec<PriceSample>,
}

impl PriceSeries {
    pub fn new(
        day: NaiveDate,
        resolution: Duration,
        samples: Vec<PriceSample>,
    ) -> Result<Self, SeriesError> {
        let minutes = resolution.num_minutes();
        if !matches!(minutes, 15 | 30 | 60) || resolution != Duration::minutes(minutes) {
            return Err(SeriesError::UnsupportedResolution { minutes });
        }

        for (index, pair) in samples.windows(2).enumerate() {
            let (previous, current) = (pair[0].timestamp, pair[1].timestamp);
            let gap = current - previous;
            if gap <= Duration::zero() {
                return Err(SeriesError::NotIncreasing {
                    index: index + 1,
                    previous,
                    current,
                });
            }
            if gap.num_seconds() % resolution.num_seconds() != 0 {
                return Err(SeriesError::OffCadence {
                    index: index + 1,
                    timestamp: current,
                    minutes,
                });
            }
        }

        Ok(Self {
            day,
            resolution,
            samples,
        })
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn resolution(&self) -> Duration {
        self.resolution
    }

    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Lowest price of the day, `None` for an empty series.
    pub fn min_price(&self) -> Option<Decimal> {
        self.samples.iter().map(|s| s.price_per_mwh).min()
    }

    /// Copy of this series keeping only samples whose local hour lies in `window`.
    pub fn restrict_to_hours(&self, window: ProductionWindow) -> PriceSeries {
        PriceSeries {
            day: self.day,
            resolution: self.resolution,
            samples: self
                .samples
                .iter()
                .filter(|s| window.contains_hour(s.timestamp.hour()))
                .copied()
                .collect(),
        }
    }

    /// BLAKE3 digest over the day, cadence and every sample.
    ///
    /// Two fetches of identical upstream data produce identical hashes, which
    /// is what repeat-alert suppression keys on.
    pub fn data_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.day.to_string().as_bytes());
        hasher.update(&self.resolution.num_seconds().to_le_bytes());
        for sample in &self.samples {
            hasher.update(&sample.timestamp.timestamp().to_le_bytes());
            hasher.update(&sample.price_per_mwh.normalize().serialize());
        }
        hasher.finalize().to_hex().to_string()
    }
}
