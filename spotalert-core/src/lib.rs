//! spotalert core: day-ahead price alerting building blocks.
//!
//! - Domain types (price samples, series, alert intervals, notifications)
//! - Market-data gateway trait with an ENTSO-E implementation
//! - Sub-threshold interval detection
//! - Notification composition
//! - Notification channels (Pushover, SMTP) and the parallel dispatcher
//! - Atomic snapshot publishing
//!
//! Nothing in here reads process-wide state; every component is built from
//! explicit values handed in by the runner.

pub mod compose;
pub mod detect;
pub mod domain;
pub mod gateway;
pub mod notify;
pub mod snapshot;

pub use compose::{compose, NoMatchPolicy};
pub use detect::{detect, detect_in_window, ProductionWindow};
pub use domain::{AlertInterval, Notification, PriceSample, PriceSeries, SeriesError};
pub use gateway::{EntsoeGateway, FetchOutcome, GatewayError, MarketDataGateway};
pub use notify::{dispatch, ChannelError, ChannelOutcome, ChannelResult, NotificationChannel};
pub use snapshot::{Snapshot, SnapshotEntry, SnapshotError, SnapshotPublisher};
