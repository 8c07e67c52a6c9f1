//! Domain types for the price alert pipeline

pub mod alert;
pub mod series;

pub use alert::{AlertInterval, Notification};
pub use series::{PriceSample, PriceSeries, SeriesError};
