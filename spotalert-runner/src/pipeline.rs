//! Pipeline orchestrator: one fetch → publish → detect → compose → dispatch pass.
//!
//! State flow for a single run:
//!
//! ```text
//! Idle → ResolvingTarget → Fetching → Publishing → Analyzing → Composing → Dispatching → Done
//!                             │
//!                             ├─ Empty / NotYetPublished ─────────────────────────────→ Done (ok)
//!                             └─ gateway fault ───────────────────────────────────────→ Done (err)
//! ```
//!
//! The snapshot is always published before analysis, so the artifact reflects
//! the latest data even when no alert goes out. A snapshot write failure ends
//! the run with an error before anything is sent.
//!
//! A dry run goes through the same states but writes nothing and sends
//! nothing, so it never affects repeat suppression of a later real run.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use spotalert_core::compose::compose;
use spotalert_core::detect::detect_in_window;
use spotalert_core::domain::{AlertInterval, Notification, PriceSeries};
use spotalert_core::gateway::{FetchOutcome, GatewayError, MarketDataGateway};
use spotalert_core::notify::{dispatch, ChannelResult, NotificationChannel};
use spotalert_core::snapshot::{SnapshotError, SnapshotPublisher};

use crate::config::{ConfigError, PipelineConfig, TargetDayPolicy};

/// Source of "now". Injected so runs are reproducible in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    ResolvingTarget,
    Fetching,
    Publishing,
    Analyzing,
    Composing,
    Dispatching,
    Done,
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Data was fetched, published and analyzed.
    Completed,
    NotYetPublished,
    Empty,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("fetching prices for {day} failed")]
    Gateway {
        day: NaiveDate,
        #[source]
        source: GatewayError,
    },

    #[error("publishing snapshot failed")]
    Snapshot(#[from] SnapshotError),
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub zone: String,
    /// The delivery day the run settled on; for `NotYetPublished` under
    /// `latest_available`, the last day tried.
    pub day: NaiveDate,
    pub sample_count: usize,
    pub intervals: Vec<AlertInterval>,
    pub notification: Option<Notification>,
    /// Dispatch skipped because this exact data was already alerted on.
    pub suppressed_repeat: bool,
    /// Snapshot and channels were left untouched.
    pub dry_run: bool,
    pub channel_results: Vec<ChannelResult>,
    /// Every state the run passed through, in order.
    pub states: Vec<PipelineState>,
}

impl RunReport {
    pub fn notification_composed(&self) -> bool {
        self.notification.is_some()
    }

    pub fn delivered_count(&self) -> usize {
        self.channel_results.iter().filter(|r| r.is_delivered()).count()
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    timezone: Tz,
    gateway: Box<dyn MarketDataGateway>,
    publisher: SnapshotPublisher,
    channels: Vec<Box<dyn NotificationChannel>>,
    clock: Box<dyn Clock>,
    dry_run: bool,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        gateway: Box<dyn MarketDataGateway>,
        channels: Vec<Box<dyn NotificationChannel>>,
    ) -> Result<Self, ConfigError> {
        let timezone = config.market_timezone()?;
        let publisher = SnapshotPublisher::new(&config.snapshot_path);
        Ok(Self {
            config,
            timezone,
            gateway,
            publisher,
            channels,
            clock: Box::new(SystemClock),
            dry_run: false,
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Log the snapshot and notification instead of writing and sending them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline once.
    pub fn run(&self) -> Result<RunReport, PipelineError> {
        let mut run = Run::new(&self.config.zone, self.dry_run);

        run.enter(PipelineState::ResolvingTarget);
        let today = self.clock.now().with_timezone(&self.timezone).date_naive();
        let candidates = self.candidate_days(today);
        info!(
            zone = %self.config.zone,
            %today,
            policy = ?self.config.target_day_policy,
            "starting run"
        );

        run.enter(PipelineState::Fetching);
        let mut last = FetchOutcome::NotYetPublished;
        let mut day = today;
        for candidate in candidates {
            day = candidate;
            let outcome = self
                .gateway
                .fetch(&self.config.zone, day, day + Duration::days(1))
                .map_err(|source| PipelineError::Gateway { day, source })?;
            debug!(%day, outcome = outcome.label(), gateway = self.gateway.name(), "fetched");
            last = outcome;
            if matches!(last, FetchOutcome::Series(_)) {
                break;
            }
        }

        let series = match last {
            FetchOutcome::Series(series) => series,
            FetchOutcome::Empty => {
                info!(%day, zone = %self.config.zone, "query returned no prices");
                return Ok(run.finish(RunOutcome::Empty, day));
            }
            FetchOutcome::NotYetPublished => {
                info!(%day, zone = %self.config.zone, "prices not yet published");
                return Ok(run.finish(RunOutcome::NotYetPublished, day));
            }
        };

        self.process(run, series)
    }

    fn candidate_days(&self, today: NaiveDate) -> Vec<NaiveDate> {
        match self.config.target_day_policy {
            TargetDayPolicy::NextDay => vec![today + Duration::days(1)],
            TargetDayPolicy::LatestAvailable => (0..=i64::from(self.config.lookahead_days))
                .rev()
                .map(|offset| today + Duration::days(offset))
                .collect(),
        }
    }

    fn process(&self, mut run: Run, series: PriceSeries) -> Result<RunReport, PipelineError> {
        let day = series.day();
        run.sample_count = series.len();

        run.enter(PipelineState::Publishing);
        let repeat = self.config.suppress_repeat_alerts && self.already_published(&series);
        if self.dry_run {
            info!(
                %day,
                samples = series.len(),
                path = %self.publisher.path().display(),
                "dry run: snapshot not written"
            );
        } else {
            let generated_at = self.clock.now().with_timezone(&self.timezone).fixed_offset();
            self.publisher
                .publish(&series, &self.config.zone, generated_at)?;
            info!(
                %day,
                samples = series.len(),
                path = %self.publisher.path().display(),
                "snapshot published"
            );
        }

        run.enter(PipelineState::Analyzing);
        run.intervals = detect_in_window(
            &series,
            self.config.threshold,
            self.config.production_window,
        );
        info!(%day, intervals = run.intervals.len(), threshold = %self.config.threshold, "analyzed");

        run.enter(PipelineState::Composing);
        run.notification = compose(
            day,
            &run.intervals,
            &series,
            self.config.threshold,
            self.config.no_match_policy,
        );

        run.enter(PipelineState::Dispatching);
        match &run.notification {
            None => debug!(%day, "nothing to send"),
            Some(notification) if self.dry_run => {
                info!(subject = %notification.subject, repeat, "dry run: not sending\n{}", notification.body);
            }
            Some(_) if repeat => {
                info!(%day, "data unchanged since last alert, dispatch suppressed");
                run.suppressed_repeat = true;
            }
            Some(notification) if self.channels.is_empty() => {
                info!(subject = %notification.subject, "no channels configured\n{}", notification.body);
            }
            Some(notification) => {
                run.channel_results = dispatch(notification, &self.channels);
                let failed = run.channel_results.iter().filter(|r| !r.is_delivered()).count();
                if failed > 0 {
                    warn!(failed, total = run.channel_results.len(), "some channels failed");
                }
            }
        }

        Ok(run.finish(RunOutcome::Completed, day))
    }

    /// True if the current snapshot already holds exactly this series. An
    /// unreadable snapshot counts as not published.
    fn already_published(&self, series: &PriceSeries) -> bool {
        match self.publisher.load() {
            Ok(Some(previous)) => previous.matches(series),
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "previous snapshot unreadable, ignoring");
                false
            }
        }
    }
}

/// Mutable run record that becomes the [`RunReport`].
struct Run {
    zone: String,
    sample_count: usize,
    intervals: Vec<AlertInterval>,
    notification: Option<Notification>,
    suppressed_repeat: bool,
    dry_run: bool,
    channel_results: Vec<ChannelResult>,
    states: Vec<PipelineState>,
}

impl Run {
    fn new(zone: &str, dry_run: bool) -> Self {
        Self {
            zone: zone.to_string(),
            dry_run,
            sample_count: 0,
            intervals: Vec::new(),
            notification: None,
            suppressed_repeat: false,
            channel_results: Vec::new(),
            states: vec![PipelineState::Idle],
        }
    }

    fn enter(&mut self, state: PipelineState) {
        trace!(?state, "pipeline state");
        self.states.push(state);
    }

    fn finish(mut self, outcome: RunOutcome, day: NaiveDate) -> RunReport {
        self.enter(PipelineState::Done);
        RunReport {
            outcome,
            zone: self.zone,
            day,
            sample_count: self.sample_count,
            intervals: self.intervals,
            notification: self.notification,
            suppressed_repeat: self.suppressed_repeat,
            dry_run: self.dry_run,
            channel_results: self.channel_results,
            states: self.states,
        }
    }
}
