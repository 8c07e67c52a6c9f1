//! Market-data gateway trait and structured outcome/error types.
//!
//! The gateway folds the upstream's three non-fault answers (data, no rows,
//! not yet released) into [`FetchOutcome`] so the pipeline branches on a type
//! instead of inspecting error text. Everything else is a [`GatewayError`].

pub mod document;
pub mod entsoe;
pub mod zones;

pub use entsoe::EntsoeGateway;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{PriceSeries, SeriesError};

/// Non-fault result of a market-data query.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Samples are available for the requested range.
    Series(PriceSeries),
    /// The query succeeded but returned zero samples.
    Empty,
    /// The upstream has not released prices for the range yet.
    NotYetPublished,
}

impl FetchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            FetchOutcome::Series(_) => "series",
            FetchOutcome::Empty => "empty",
            FetchOutcome::NotYetPublished => "not_yet_published",
        }
    }
}

/// Faults from a market-data query. None of these are retried within a run.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("authentication rejected by market-data API: {0}")]
    AuthenticationRequired(String),

    #[error("unknown bidding zone '{0}'")]
    UnknownZone(String),

    #[error("market-data API returned HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("market-data API rejected the query (reason {code}): {text}")]
    Rejected { code: String, text: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("invalid price series: {0}")]
    InvalidSeries(#[from] SeriesError),

    #[error("invalid date range {start}..{end}: {reason}")]
    InvalidRange {
        start: NaiveDate,
        end: NaiveDate,
        reason: String,
    },
}

/// Source of day-ahead prices for a bidding zone.
///
/// `start` and `end` are market-local calendar dates, `end` exclusive. The
/// returned series' day is `start`.
pub trait MarketDataGateway: Send + Sync {
    /// Human-readable name of this gateway.
    fn name(&self) -> &str;

    fn fetch(
        &self,
        zone: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchOutcome, GatewayError>;
}
