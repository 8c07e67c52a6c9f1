//! ENTSO-E market document parsing.
//!
//! The API answers with one of two XML roots:
//! - `Publication_MarketDocument`: time series of priced points
//! - `Acknowledgement_MarketDocument`: no data, with a reason code
//!
//! Reason code 999 ("No matching data found") is how the platform says the
//! requested day has not been released yet.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;

use super::GatewayError;

/// Acknowledgement reason code for "no matching data".
pub const NO_MATCHING_DATA: &str = "999";

/// Longest `Period` accepted; a day-ahead answer never covers more.
const MAX_PERIOD_DAYS: i64 = 8;

fn max_period_span() -> Duration {
    Duration::days(MAX_PERIOD_DAYS)
}

#[derive(Debug, Deserialize)]
struct PublicationXml {
    #[serde(rename = "TimeSeries", default)]
    time_series: Vec<TimeSeriesXml>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesXml {
    #[serde(rename = "Period", default)]
    periods: Vec<PeriodXml>,
}

#[derive(Debug, Deserialize)]
struct PeriodXml {
    #[serde(rename = "timeInterval")]
    time_interval: TimeIntervalXml,
    resolution: String,
    #[serde(rename = "Point", default)]
    points: Vec<PointXml>,
}

#[derive(Debug, Deserialize)]
struct TimeIntervalXml {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct PointXml {
    position: u32,
    #[serde(rename = "price.amount")]
    price_amount: String,
}

#[derive(Debug, Deserialize)]
struct AcknowledgementXml {
    #[serde(rename = "Reason", default)]
    reasons: Vec<ReasonXml>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReasonXml {
    code: String,
    #[serde(default)]
    text: String,
}

/// One acknowledgement reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reason {
    pub code: String,
    pub text: String,
}

/// One `Period` block, with positions already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub resolution: Duration,
    /// position (1-based) → price in EUR/MWh
    pub points: BTreeMap<u32, Decimal>,
}

impl Period {
    /// Expand to one sample per resolution step.
    ///
    /// Curve type A03 omits a point when the price repeats the previous one,
    /// so a missing position inherits the last seen price. Positions before
    /// the first published point are skipped.
    pub fn expand(&self) -> Vec<(DateTime<Utc>, Decimal)> {
        let step = self.resolution.num_seconds();
        if step <= 0 || self.end - self.start > max_period_span() {
            return Vec::new();
        }
        let steps = (self.end - self.start).num_seconds() / step;
        let mut out = Vec::with_capacity(steps.max(0) as usize);
        let mut last = None;
        for position in 1..=steps {
            if let Some(price) = self.points.get(&(position as u32)) {
                last = Some(*price);
            }
            if let Some(price) = last {
                let at = self.start + self.resolution * (position as i32 - 1);
                out.push((at, price));
            }
        }
        out
    }
}

/// A parsed market document.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketDocument {
    Publication(Vec<Period>),
    Acknowledgement(Vec<Reason>),
}

impl MarketDocument {
    /// True for an acknowledgement whose reasons include "no matching data".
    pub fn is_not_yet_published(&self) -> bool {
        match self {
            MarketDocument::Acknowledgement(reasons) => {
                reasons.iter().any(|r| r.code == NO_MATCHING_DATA)
            }
            MarketDocument::Publication(_) => false,
        }
    }
}

/// Parse a response body into a [`MarketDocument`].
pub fn parse(xml: &str) -> Result<MarketDocument, GatewayError> {
    match root_element(xml)?.as_str() {
        "Publication_MarketDocument" => {
            let doc: PublicationXml = quick_xml::de::from_str(xml)
                .map_err(|e| GatewayError::MalformedResponse(format!("publication: {e}")))?;
            let periods = doc
                .time_series
                .into_iter()
                .flat_map(|ts| ts.periods)
                .map(Period::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(MarketDocument::Publication(periods))
        }
        "Acknowledgement_MarketDocument" => {
            let doc: AcknowledgementXml = quick_xml::de::from_str(xml)
                .map_err(|e| GatewayError::MalformedResponse(format!("acknowledgement: {e}")))?;
            Ok(MarketDocument::Acknowledgement(
                doc.reasons
                    .into_iter()
                    .map(|r| Reason {
                        code: r.code.trim().to_string(),
                        text: r.text.trim().to_string(),
                    })
                    .collect(),
            ))
        }
        other => Err(GatewayError::MalformedResponse(format!(
            "unexpected document root <{other}>"
        ))),
    }
}

/// Flatten all periods into one ordered sample list at the finest resolution
/// present. Coarser duplicates of the same day (ENTSO-E publishes both 15- and
/// 60-minute curves for some zones) are dropped.
pub fn flatten(periods: &[Period]) -> Option<(Duration, Vec<(DateTime<Utc>, Decimal)>)> {
    let finest = periods.iter().map(|p| p.resolution).min()?;
    let mut by_time = BTreeMap::new();
    for period in periods.iter().filter(|p| p.resolution == finest) {
        for (at, price) in period.expand() {
            by_time.entry(at).or_insert(price);
        }
    }
    Some((finest, by_time.into_iter().collect()))
}

impl TryFrom<PeriodXml> for Period {
    type Error = GatewayError;

    fn try_from(raw: PeriodXml) -> Result<Self, Self::Error> {
        let start = parse_instant(&raw.time_interval.start)?;
        let end = parse_instant(&raw.time_interval.end)?;
        if end <= start {
            return Err(GatewayError::MalformedResponse(format!(
                "period ends before it starts: {start} .. {end}"
            )));
        }
        if end - start > max_period_span() {
            return Err(GatewayError::MalformedResponse(format!(
                "period {start} .. {end} spans more than {} days",
                MAX_PERIOD_DAYS
            )));
        }
        let resolution = parse_resolution(&raw.resolution)?;

        let mut points = BTreeMap::new();
        for point in raw.points {
            if point.position == 0 {
                return Err(GatewayError::MalformedResponse(
                    "point position must be 1-based".into(),
                ));
            }
            let price = Decimal::from_str(point.price_amount.trim()).map_err(|e| {
                GatewayError::MalformedResponse(format!(
                    "bad price '{}' at position {}: {e}",
                    point.price_amount, point.position
                ))
            })?;
            points.insert(point.position, price);
        }

        Ok(Period {
            start,
            end,
            resolution,
            points,
        })
    }
}

fn root_element(xml: &str) -> Result<String, GatewayError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => {
                return Err(GatewayError::MalformedResponse("empty document".into()));
            }
            Ok(_) => continue,
            Err(e) => return Err(GatewayError::MalformedResponse(e.to_string())),
        }
    }
}

/// ENTSO-E writes instants as `2026-10-19T22:00Z` (no seconds).
fn parse_instant(s: &str) -> Result<DateTime<Utc>, GatewayError> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%MZ")
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)))
        .map_err(|e| GatewayError::MalformedResponse(format!("bad instant '{s}': {e}")))
}

/// ISO 8601 durations as used by the platform: `PT15M`, `PT30M`, `PT60M`, `PT1H`.
///
/// Only the cadences a [`PriceSeries`](crate::domain::PriceSeries) accepts
/// are allowed through.
fn parse_resolution(s: &str) -> Result<Duration, GatewayError> {
    let s = s.trim();
    let bad = || GatewayError::MalformedResponse(format!("unsupported resolution '{s}'"));
    let body = s.strip_prefix("PT").ok_or_else(bad)?;
    let minutes: u32 = if let Some(minutes) = body.strip_suffix('M') {
        minutes.parse().map_err(|_| bad())?
    } else if let Some(hours) = body.strip_suffix('H') {
        let hours: u32 = hours.parse().map_err(|_| bad())?;
        hours.checked_mul(60).ok_or_else(bad)?
    } else {
        return Err(bad());
    };
    match minutes {
        15 | 30 | 60 => Ok(Duration::minutes(i64::from(minutes))),
        _ => Err(bad()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    const ACK_999: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Acknowledgement_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-1:acknowledgementdocument:7:0">
  <mRID>2b8d0b9e-0f0e-4b3e-9b0a-123456789abc</mRID>
  <createdDateTime>2026-10-19T10:02:11Z</createdDateTime>
  <sender_MarketParticipant.mRID codingScheme="A01">10X1001A1001A450</sender_MarketParticipant.mRID>
  <sender_MarketParticipant.marketRole.type>A32</sender_MarketParticipant.marketRole.type>
  <receiver_MarketParticipant.mRID codingScheme="A01">10X1001A1001A450</receiver_MarketParticipant.mRID>
  <receiver_MarketParticipant.marketRole.type>A39</receiver_MarketParticipant.marketRole.type>
  <received_MarketDocument.createdDateTime>2026-10-19T10:02:11Z</received_MarketDocument.createdDateTime>
  <Reason>
    <code>999</code>
    <text>No matching data found for Data item Day-ahead Prices [12.1.D] (10YHU-MAVIR----U, 10YHU-MAVIR----U) and interval 2026-10-19T22:00:00.000Z/2026-10-20T22:00:00.000Z.</text>
  </Reason>
</Acknowledgement_MarketDocument>"#;

    fn publication(resolution: &str, points: &[(u32, &str)]) -> String {
        let points: String = points
            .iter()
            .map(|(pos, price)| {
                format!("<Point><position>{pos}</position><price.amount>{price}</price.amount></Point>")
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Publication_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-3:publicationdocument:7:3">
  <mRID>abc</mRID>
  <type>A44</type>
  <TimeSeries>
    <mRID>1</mRID>
    <businessType>A62</businessType>
    <currency_Unit.name>EUR</currency_Unit.name>
    <price_Measure_Unit.name>MWH</price_Measure_Unit.name>
    <curveType>A03</curveType>
    <Period>
      <timeInterval>
        <start>2026-10-19T22:00Z</start>
        <end>2026-10-20T02:00Z</end>
      </timeInterval>
      <resolution>{resolution}</resolution>
      {points}
    </Period>
  </TimeSeries>
</Publication_MarketDocument>"#
        )
    }

    #[test]
    fn acknowledgement_999_is_not_yet_published() {
        let doc = parse(ACK_999).unwrap();
        assert!(doc.is_not_yet_published());
        match doc {
            MarketDocument::Acknowledgement(reasons) => {
                assert_eq!(reasons.len(), 1);
                assert!(reasons[0].text.starts_with("No matching data found"));
            }
            other => panic!("expected acknowledgement, got {other:?}"),
        }
    }

    #[test]
    fn publication_parses_points() {
        let xml = publication("PT60M", &[(1, "80.00"), (2, "40.5"), (3, "30"), (4, "90.12")]);
        let doc = parse(&xml).unwrap();
        let MarketDocument::Publication(periods) = doc else {
            panic!("expected publication");
        };
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].resolution, Duration::hours(1));
        assert_eq!(periods[0].points.get(&2), Some(&dec!(40.5)));
        assert_eq!(
            periods[0].start,
            Utc.with_ymd_and_hms(2026, 10, 19, 22, 0, 0).unwrap()
        );
    }

    #[test]
    fn a03_gaps_are_forward_filled() {
        let xml = publication("PT60M", &[(1, "80"), (3, "30")]);
        let MarketDocument::Publication(periods) = parse(&xml).unwrap() else {
            panic!("expected publication");
        };
        let samples = periods[0].expand();
        let prices: Vec<_> = samples.iter().map(|(_, p)| *p).collect();
        assert_eq!(prices, vec![dec!(80), dec!(80), dec!(30), dec!(30)]);
        assert_eq!(samples[3].0, Utc.with_ymd_and_hms(2026, 10, 20, 1, 0, 0).unwrap());
    }

    #[test]
    fn finest_resolution_wins() {
        let hourly = Period {
            start: Utc.with_ymd_and_hms(2026, 10, 19, 22, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 10, 19, 23, 0, 0).unwrap(),
            resolution: Duration::hours(1),
            points: BTreeMap::from([(1, dec!(99))]),
        };
        let quarter = Period {
            resolution: Duration::minutes(15),
            points: BTreeMap::from([(1, dec!(10)), (2, dec!(20)), (3, dec!(30)), (4, dec!(40))]),
            ..hourly.clone()
        };
        let (resolution, samples) = flatten(&[hourly, quarter]).unwrap();
        assert_eq!(resolution, Duration::minutes(15));
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0].1, dec!(10));
    }

    #[test]
    fn hand_built_zero_step_period_expands_to_nothing() {
        let period = Period {
            start: Utc.with_ymd_and_hms(2026, 10, 19, 22, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 10, 19, 23, 0, 0).unwrap(),
            resolution: Duration::zero(),
            points: BTreeMap::from([(1, dec!(10))]),
        };
        assert!(period.expand().is_empty());
        let (_, samples) = flatten(&[period]).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn flatten_of_nothing_is_none() {
        assert!(flatten(&[]).is_none());
    }

    #[test]
    fn unknown_root_is_malformed() {
        let err = parse("<html><body>Service unavailable</body></html>").unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse(_)));
    }

    #[test]
    fn bad_price_is_malformed() {
        let xml = publication("PT60M", &[(1, "n/a")]);
        assert!(matches!(parse(&xml), Err(GatewayError::MalformedResponse(_))));
    }

    #[test]
    fn resolution_formats() {
        assert_eq!(parse_resolution("PT15M").unwrap(), Duration::minutes(15));
        assert_eq!(parse_resolution("PT30M").unwrap(), Duration::minutes(30));
        assert_eq!(parse_resolution("PT1H").unwrap(), Duration::hours(1));
        assert!(parse_resolution("P1D").is_err());
    }

    #[test]
    fn degenerate_resolutions_are_malformed() {
        for raw in ["PT0M", "PT0H", "PT7M", "PT-15M", "PT99999999999999M", "PT4294967295H"] {
            assert!(
                matches!(parse_resolution(raw), Err(GatewayError::MalformedResponse(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn zero_resolution_document_is_rejected_not_expanded() {
        let xml = publication("PT0M", &[(1, "80")]);
        assert!(matches!(parse(&xml), Err(GatewayError::MalformedResponse(_))));
    }

    #[test]
    fn oversized_period_is_malformed() {
        let xml = publication("PT15M", &[(1, "80")])
            .replace("<end>2026-10-20T02:00Z</end>", "<end>2036-10-20T02:00Z</end>");
        let err = parse(&xml).unwrap_err();
        assert!(err.to_string().contains("spans more than 8 days"), "{err}");
    }
}
