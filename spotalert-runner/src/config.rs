//! Pipeline configuration, loaded from TOML.
//!
//! Every field has a default, so an empty (or missing) file is a valid
//! configuration. Secrets never live here; see [`crate::secrets`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use spotalert_core::compose::NoMatchPolicy;
use spotalert_core::detect::ProductionWindow;
use spotalert_core::gateway::entsoe::DEFAULT_BASE_URL;
use spotalert_core::gateway::zones;
use spotalert_core::notify::{EmailSettings, PushoverSettings};
use spotalert_core::snapshot::DEFAULT_SNAPSHOT_PATH;

/// Config file looked up when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "spotalert.toml";

/// Upper bound on `lookahead_days`; ENTSO-E never publishes further out.
pub const MAX_LOOKAHEAD_DAYS: u32 = 7;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("missing secret {0}")]
    MissingSecret(&'static str),
}

/// Which delivery day a run targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetDayPolicy {
    /// Tomorrow in market-local time.
    #[default]
    NextDay,
    /// The latest day within the lookahead horizon that has prices.
    LatestAvailable,
}

impl std::str::FromStr for TargetDayPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "next_day" => Ok(Self::NextDay),
            "latest_available" => Ok(Self::LatestAvailable),
            other => Err(ConfigError::Invalid(format!(
                "unknown target_day_policy '{other}' (expected next_day or latest_available)"
            ))),
        }
    }
}

/// Market-data API options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl GatewaySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Bidding zone code, e.g. `HU`.
    pub zone: String,
    /// IANA timezone; defaults to the zone's own.
    pub timezone: Option<String>,
    /// Alert threshold in EUR/MWh; a sample alerts when strictly below it.
    pub threshold: Decimal,
    pub target_day_policy: TargetDayPolicy,
    pub lookahead_days: u32,
    pub no_match_policy: NoMatchPolicy,
    pub suppress_repeat_alerts: bool,
    pub snapshot_path: PathBuf,
    pub production_window: Option<ProductionWindow>,
    pub gateway: GatewaySettings,
    pub pushover: PushoverSettings,
    pub email: EmailSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            zone: "HU".to_string(),
            timezone: None,
            threshold: Decimal::new(50, 0),
            target_day_policy: TargetDayPolicy::default(),
            lookahead_days: 1,
            no_match_policy: NoMatchPolicy::default(),
            suppress_repeat_alerts: true,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            production_window: None,
            gateway: GatewaySettings::default(),
            pushover: PushoverSettings::default(),
            email: EmailSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields defaults.
    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if zones::lookup(&self.zone).is_none() {
            return Err(ConfigError::Invalid(format!(
                "unknown zone '{}' (known: {})",
                self.zone,
                zones::codes().collect::<Vec<_>>().join(", ")
            )));
        }
        self.market_timezone()?;

        if self.lookahead_days > MAX_LOOKAHEAD_DAYS {
            return Err(ConfigError::Invalid(format!(
                "lookahead_days must be at most {MAX_LOOKAHEAD_DAYS}, got {}",
                self.lookahead_days
            )));
        }

        if let Some(window) = self.production_window {
            if window.start_hour > 23 || window.end_hour > 23 {
                return Err(ConfigError::Invalid(format!(
                    "production_window hours must be in 0..=23, got {}..{}",
                    window.start_hour, window.end_hour
                )));
            }
            if window.start_hour == window.end_hour {
                return Err(ConfigError::Invalid(
                    "production_window start_hour and end_hour must differ".into(),
                ));
            }
        }

        if !(-2..=1).contains(&self.pushover.priority) {
            return Err(ConfigError::Invalid(format!(
                "pushover.priority must be in -2..=1, got {}",
                self.pushover.priority
            )));
        }

        if self.gateway.timeout_secs == 0
            || self.pushover.timeout_secs == 0
            || self.email.timeout_secs == 0
        {
            return Err(ConfigError::Invalid("timeouts must be positive".into()));
        }

        Ok(())
    }

    /// The timezone market-local days and clock times are expressed in.
    pub fn market_timezone(&self) -> Result<Tz, ConfigError> {
        match &self.timezone {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| ConfigError::Invalid(format!("timezone '{name}': {e}"))),
            None => zones::lookup(&self.zone)
                .map(|z| z.timezone)
                .ok_or_else(|| ConfigError::Invalid(format!("unknown zone '{}'", self.zone))),
        }
    }
}
