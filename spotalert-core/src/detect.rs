//! Sub-threshold interval detection.
//!
//! Thresholds are always EUR/MWh, the unit the upstream publishes in. Any
//! conversion to EUR/kWh belongs to presentation (see `compose`), never here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{AlertInterval, PriceSeries};

/// Half-open range of local hours eligible for alerting.
///
/// `start_hour > end_hour` wraps past midnight (e.g. 22..6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl ProductionWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            self.start_hour <= hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Merge consecutive samples priced strictly below `threshold` into intervals.
///
/// Two below-threshold samples belong to the same interval only when they are
/// exactly one resolution step apart. Output is chronological.
pub fn detect(series: &PriceSeries, threshold: Decimal) -> Vec<AlertInterval> {
    let step = series.resolution();
    let mut intervals = Vec::new();
    let mut open: Option<AlertInterval> = None;

    for sample in series.samples() {
        if sample.price_per_mwh >= threshold {
            intervals.extend(open.take());
            continue;
        }

        match open.as_mut() {
            Some(current) if current.end == sample.timestamp => {
                current.end = sample.timestamp + step;
                current.min_price = current.min_price.min(sample.price_per_mwh);
                current.sample_count += 1;
            }
            _ => {
                let fresh = AlertInterval {
                    start: sample.timestamp,
                    end: sample.timestamp + step,
                    min_price: sample.price_per_mwh,
                    sample_count: 1,
                };
                intervals.extend(open.replace(fresh));
            }
        }
    }

    intervals.extend(open);
    intervals
}

/// [`detect`], restricted to samples inside `window` when one is given.
pub fn detect_in_window(
    series: &PriceSeries,
    threshold: Decimal,
    window: Option<ProductionWindow>,
) -> Vec<AlertInterval> {
    match window {
        Some(window) => detect(&series.restrict_to_hours(window), threshold),
        None => detect(series, threshold),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceSample;
    use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
    use rust_decimal_macros::dec;

    fn hour(h: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 10, h, 0, 0)
            .unwrap()
    }

    fn hourly(prices: &[Decimal]) -> PriceSeries {
        let samples = prices
            .iter()
            .enumerate()
            .map(|(i, p)| PriceSample::new(hour(i as u32), *p))
            .collect();
        PriceSeries::new(
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            Duration::hours(1),
            samples,
        )
        .unwrap()
    }

    #[test]
    fn consecutive_cheap_hours_merge() {
        let series = hourly(&[dec!(80), dec!(40), dec!(30), dec!(90)]);
        let intervals = detect(&series, dec!(50));
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].start, hour(1));
        assert_eq!(intervals[0].end, hour(3));
        assert_eq!(intervals[0].min_price, dec!(30));
        assert_eq!(intervals[0].sample_count, 2);
    }

    #[test]
    fn separated_cheap_hours_stay_apart() {
        let series = hourly(&[dec!(60), dec!(45), dec!(90), dec!(20), dec!(70)]);
        let intervals = detect(&series, dec!(50));
        assert_eq!(intervals.len(), 2);
        assert_eq!((intervals[0].start, intervals[0].end), (hour(1), hour(2)));
        assert_eq!((intervals[1].start, intervals[1].end), (hour(3), hour(4)));
        assert_eq!(intervals[1].min_price, dec!(20));
    }

    #[test]
    fn price_equal_to_threshold_does_not_alert() {
        let series = hourly(&[dec!(50), dec!(50.00), dec!(49.99)]);
        let intervals = detect(&series, dec!(50));
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].start, hour(2));
    }

    #[test]
    fn trailing_interval_closes_at_series_end() {
        let series = hourly(&[dec!(90), dec!(10)]);
        let intervals = detect(&series, dec!(50));
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].end, hour(2));
    }

    #[test]
    fn nothing_below_threshold_yields_empty() {
        let series = hourly(&[dec!(60), dec!(70)]);
        assert!(detect(&series, dec!(50)).is_empty());
    }

    #[test]
    fn negative_prices_alert() {
        let series = hourly(&[dec!(-5.5), dec!(0)]);
        let intervals = detect(&series, dec!(0));
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].min_price, dec!(-5.5));
    }

    #[test]
    fn window_splits_and_excludes() {
        // 0..6 all cheap; window 2..4 keeps hours 2 and 3 only
        let series = hourly(&[dec!(1); 6]);
        let intervals = detect_in_window(&series, dec!(50), Some(ProductionWindow::new(2, 4)));
        assert_eq!(intervals.len(), 1);
        assert_eq!((intervals[0].start, intervals[0].end), (hour(2), hour(4)));
    }

    #[test]
    fn wrapping_window_produces_two_intervals() {
        let series = hourly(&[dec!(1); 24]);
        let intervals =
            detect_in_window(&series, dec!(50), Some(ProductionWindow::new(22, 2)));
        assert_eq!(intervals.len(), 2);
        assert_eq!((intervals[0].start, intervals[0].end), (hour(0), hour(2)));
        assert_eq!(intervals[1].start, hour(22));
        assert_eq!(intervals[1].sample_count, 2);
    }

    #[test]
    fn window_contains_hour() {
        let day = ProductionWindow::new(8, 18);
        assert!(day.contains_hour(8));
        assert!(day.contains_hour(17));
        assert!(!day.contains_hour(18));
        assert!(!day.contains_hour(7));

        let night = ProductionWindow::new(22, 6);
        assert!(night.contains_hour(23));
        assert!(night.contains_hour(0));
        assert!(!night.contains_hour(6));
        assert!(!night.contains_hour(12));
    }
}
