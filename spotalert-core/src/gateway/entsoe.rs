//! ENTSO-E Transparency Platform gateway.
//!
//! Queries day-ahead prices (document type A44) for one bidding zone and
//! turns the XML answer into a [`FetchOutcome`]. One request per call; no
//! retries. A run that hits a fault simply fails and the next scheduled run
//! tries again.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::time::Duration;
use tracing::debug;

use super::document::{self, MarketDocument};
use super::zones::{self, BiddingZone};
use super::{FetchOutcome, GatewayError, MarketDataGateway};
use crate::domain::{PriceSample, PriceSeries};

pub const DEFAULT_BASE_URL: &str = "https://web-api.tp.entsoe.eu/api";

/// Day-ahead price document type.
const DAY_AHEAD_PRICES: &str = "A44";

/// Longest error body echoed into a [`GatewayError::Http`].
const MAX_DETAIL_CHARS: usize = 200;

pub struct EntsoeGateway {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    timezone: Option<Tz>,
}

impl EntsoeGateway {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("spotalert/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::NetworkUnreachable(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            timezone: None,
        })
    }

    /// Interpret calendar days in `tz` instead of the zone's own timezone.
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = Some(tz);
        self
    }

    fn market_timezone(&self, zone: &BiddingZone) -> Tz {
        self.timezone.unwrap_or(zone.timezone)
    }

    fn request(
        &self,
        zone: &BiddingZone,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(reqwest::StatusCode, String), GatewayError> {
        let period_start = start.format("%Y%m%d%H%M").to_string();
        let period_end = end.format("%Y%m%d%H%M").to_string();
        debug!(zone = zone.code, %period_start, %period_end, "querying day-ahead prices");

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("securityToken", self.api_key.as_str()),
                ("documentType", DAY_AHEAD_PRICES),
                ("in_Domain", zone.eic),
                ("out_Domain", zone.eic),
                ("periodStart", period_start.as_str()),
                ("periodEnd", period_end.as_str()),
            ])
            .send()
            // the URL carries the security token
            .map_err(|e| GatewayError::NetworkUnreachable(e.without_url().to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| GatewayError::NetworkUnreachable(e.without_url().to_string()))?;
        Ok((status, body))
    }
}

impl MarketDataGateway for EntsoeGateway {
    fn name(&self) -> &str {
        "entsoe"
    }

    fn fetch(
        &self,
        zone: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchOutcome, GatewayError> {
        let zone = zones::lookup(zone).ok_or_else(|| GatewayError::UnknownZone(zone.into()))?;
        if end <= start {
            return Err(GatewayError::InvalidRange {
                start,
                end,
                reason: "end must be after start".into(),
            });
        }

        let tz = self.market_timezone(zone);
        let from = local_midnight(tz, start)?;
        let to = local_midnight(tz, end)?;

        let (status, body) = self.request(zone, from, to)?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GatewayError::AuthenticationRequired(
                "security token was not accepted".into(),
            ));
        }

        // Acknowledgements can arrive with 200 or 400 depending on the query.
        let document = match document::parse(&body) {
            Ok(doc) => doc,
            Err(_) if !status.is_success() => {
                return Err(GatewayError::Http {
                    status: status.as_u16(),
                    detail: body.chars().take(MAX_DETAIL_CHARS).collect(),
                });
            }
            Err(e) => return Err(e),
        };

        if document.is_not_yet_published() {
            return Ok(FetchOutcome::NotYetPublished);
        }

        let periods = match document {
            MarketDocument::Acknowledgement(reasons) => {
                let reason = reasons.into_iter().next();
                return Err(GatewayError::Rejected {
                    code: reason.as_ref().map(|r| r.code.clone()).unwrap_or_default(),
                    text: reason.map(|r| r.text).unwrap_or_default(),
                });
            }
            MarketDocument::Publication(periods) => periods,
        };

        let Some((resolution, points)) = document::flatten(&periods) else {
            return Ok(FetchOutcome::Empty);
        };

        let samples: Vec<PriceSample> = points
            .into_iter()
            .filter(|(at, _)| *at >= from && *at < to)
            .map(|(at, price)| PriceSample::new(at.with_timezone(&tz).fixed_offset(), price))
            .collect();

        if samples.is_empty() {
            return Ok(FetchOutcome::Empty);
        }

        let series = PriceSeries::new(start, resolution, samples)?;
        debug!(
            zone = zone.code,
            day = %start,
            samples = series.len(),
            resolution_minutes = resolution.num_minutes(),
            "received price series"
        );
        Ok(FetchOutcome::Series(series))
    }
}

/// Midnight at the start of `day` in `tz`, as a UTC instant.
pub fn local_midnight(tz: Tz, day: NaiveDate) -> Result<DateTime<Utc>, GatewayError> {
    tz.from_local_datetime(&day.and_time(NaiveTime::MIN))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| GatewayError::InvalidRange {
            start: day,
            end: day,
            reason: format!("midnight does not exist in {tz}"),
        })
}
