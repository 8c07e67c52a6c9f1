//! Snapshot artifact: the full price curve as JSON for external readers.
//!
//! Layout (additive fields may appear; readers must ignore unknown keys):
//! `{ updated, day, data: [{ time, price_eur, price_kwh }], zone, resolution_minutes, data_hash }`
//!
//! Writes are atomic: serialize into a temp file in the same directory,
//! fsync, then rename over the target. A reader polling the path sees either
//! the previous complete snapshot or the new one.

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::PriceSeries;

pub const DEFAULT_SNAPSHOT_PATH: &str = "prices.json";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("snapshot serialization: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("snapshot at {} is unreadable: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
}

/// One row of the published curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub time: DateTime<FixedOffset>,
    /// EUR/MWh, 2 decimals.
    pub price_eur: f64,
    /// EUR/kWh, 4 decimals.
    pub price_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub updated: DateTime<FixedOffset>,
    pub day: NaiveDate,
    pub data: Vec<SnapshotEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_hash: Option<String>,
}

impl Snapshot {
    pub fn from_series(series: &PriceSeries, zone: &str, updated: DateTime<FixedOffset>) -> Self {
        let data = series
            .samples()
            .iter()
            .map(|s| SnapshotEntry {
                time: s.timestamp,
                price_eur: rounded(s.price_per_mwh, 2),
                price_kwh: rounded(s.price_per_kwh(), 4),
            })
            .collect();

        Self {
            updated,
            day: series.day(),
            data,
            zone: Some(zone.to_string()),
            resolution_minutes: Some(series.resolution().num_minutes()),
            data_hash: Some(series.data_hash()),
        }
    }

    /// True if this snapshot was built from exactly `series`.
    pub fn matches(&self, series: &PriceSeries) -> bool {
        self.day == series.day() && self.data_hash.as_deref() == Some(series.data_hash().as_str())
    }
}

fn rounded(value: Decimal, dp: u32) -> f64 {
    value
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Publishes snapshots to one well-known path.
#[derive(Debug, Clone)]
pub struct SnapshotPublisher {
    path: PathBuf,
}

impl SnapshotPublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build the snapshot for `series` and atomically replace the artifact.
    pub fn publish(
        &self,
        series: &PriceSeries,
        zone: &str,
        generated_at: DateTime<FixedOffset>,
    ) -> Result<Snapshot, SnapshotError> {
        let snapshot = Snapshot::from_series(series, zone, generated_at);
        let json = serde_json::to_vec_pretty(&snapshot)?;
        write_atomic(&self.path, &json)?;
        Ok(snapshot)
    }

    /// Read the current artifact. A missing file is `Ok(None)`.
    pub fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| SnapshotError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }
}

/// Write `bytes` to `path` via a same-directory temp file and a rename.
///
/// The temp file is removed on every failure path (it is deleted on drop
/// unless persisted).
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SnapshotError> {
    let io_err = |source: io::Error| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(io_err)?;

    let prefix = format!(
        ".{}.",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".into())
    );
    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(io_err)?;

    tmp.write_all(bytes).map_err(io_err)?;
    // The temp file starts out owner-only; the artifact is for other readers.
    set_published_permissions(tmp.as_file(), path).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Give `file` the mode of the snapshot it replaces, or 0644 for a new one.
#[cfg(unix)]
fn set_published_permissions(file: &fs::File, target: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let permissions = match fs::metadata(target) {
        Ok(meta) if meta.is_file() => meta.permissions(),
        _ => fs::Permissions::from_mode(0o644),
    };
    file.set_permissions(permissions)
}

#[cfg(not(unix))]
fn set_published_permissions(_file: &fs::File, _target: &Path) -> io::Result<()> {
    Ok(())
}
