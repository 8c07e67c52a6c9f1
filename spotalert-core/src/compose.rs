//! Turns detected intervals into notification text.
//!
//! Composition is pure: same inputs, same text. Prices are converted from
//! EUR/MWh to EUR/kWh here and only here.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::{AlertInterval, Notification, PriceSeries};

/// What to do when no interval was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchPolicy {
    /// Send nothing.
    #[default]
    Silent,
    /// Send a "no cheap hours" notification anyway.
    ReportAlways,
}

/// Build the notification for `day`, or `None` when policy says stay quiet.
pub fn compose(
    day: NaiveDate,
    intervals: &[AlertInterval],
    series: &PriceSeries,
    threshold: Decimal,
    policy: NoMatchPolicy,
) -> Option<Notification> {
    if intervals.is_empty() {
        return match policy {
            NoMatchPolicy::Silent => None,
            NoMatchPolicy::ReportAlways => Some(no_match(day, series, threshold)),
        };
    }

    let sample_count: usize = intervals.iter().map(|i| i.sample_count).sum();
    let total = intervals
        .iter()
        .fold(Duration::zero(), |acc, i| acc + (i.end - i.start));
    let lowest = intervals
        .iter()
        .map(|i| i.min_price)
        .min()
        .unwrap_or(threshold);

    let summary = format!(
        "{sample_count} {} below {} EUR/MWh on {day} ({}-minute prices), {} in total.\n\
         Lowest price: {} €/kWh\n\
         \n\
         Cheap periods:\n",
        plural(sample_count, "sample", "samples"),
        threshold.round_dp(2),
        series.resolution().num_minutes(),
        format_duration(total),
        per_kwh(lowest),
    );
    let lines = intervals.iter().map(|interval| {
        format!(
            "{}-{}  min {} €/kWh ({} {})\n",
            clock(interval.start, day),
            clock(interval.end, day),
            per_kwh(interval.min_price),
            interval.sample_count,
            plural(interval.sample_count, "sample", "samples"),
        )
    });
    let body = std::iter::once(summary).chain(lines).collect();

    Some(Notification {
        subject: format!("⚡ Cheap electricity on {day}"),
        body,
    })
}

fn no_match(day: NaiveDate, series: &PriceSeries, threshold: Decimal) -> Notification {
    let mut body = format!(
        "No price below {} EUR/MWh on {day}.",
        threshold.round_dp(2)
    );
    if let Some(min) = series.min_price() {
        body.push_str(&format!("\nLowest price: {} €/kWh", per_kwh(min)));
    }
    Notification {
        subject: format!("No cheap electricity on {day}"),
        body,
    }
}

/// EUR/MWh → EUR/kWh, four decimals.
pub fn per_kwh(price_per_mwh: Decimal) -> String {
    let kwh = (price_per_mwh / Decimal::ONE_THOUSAND)
        .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
    format!("{kwh:.4}")
}

/// `HH:MM` in market-local time; the following midnight renders as `24:00`.
fn clock(at: DateTime<FixedOffset>, day: NaiveDate) -> String {
    if at.date_naive() > day && at.hour() == 0 && at.minute() == 0 {
        return "24:00".to_string();
    }
    format!("{:02}:{:02}", at.hour(), at.minute())
}

fn format_duration(d: Duration) -> String {
    let minutes = d.num_minutes();
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}
