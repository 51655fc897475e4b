//! On-disk odds log.
//!
//! The log is a single pretty-printed JSON array of `Observation` records,
//! oldest first. Each run reads it once, prunes records older than the
//! retention window, merges the new record (one per UTC clock hour), and
//! rewrites it through a temp file plus rename so a reader never sees a
//! half-written array.
//!
//! # Clock injection
//! `prune` and `record` take `now` as a parameter. Only the binary passes
//! `Utc::now()`.

use chrono::{DateTime, Duration, Timelike, Utc};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::logging::{self, DataSource};
use crate::model::{Observation, StoreError};

/// Result of one successful load → prune → merge → save cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSummary {
    pub entry: Observation,
    /// Records on disk after the write, including `entry`.
    pub retained: usize,
    /// Records dropped by the retention window (or unusable timestamps).
    pub pruned: usize,
    /// True when `entry` replaced a record from the same hour.
    pub replaced: bool,
}

#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
    retention: Duration,
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>, retention: Duration) -> Self {
        Self {
            path: path.into(),
            retention,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.log_file_path.clone(), config.retention())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the next `save` writes before renaming into place.
    pub fn temp_path(&self) -> PathBuf {
        let mut name: OsString = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    // -----------------------------------------------------------------------
    // Load
    // -----------------------------------------------------------------------

    /// Reads the persisted log. Never fails: a missing, unreadable or
    /// non-array file is treated as an empty history. Array elements that are
    /// not valid observations are dropped individually.
    pub fn load(&self) -> Vec<Observation> {
        if !self.path.exists() {
            return Vec::new();
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                logging::warn(
                    DataSource::OddsLog,
                    None,
                    &format!("Unreadable log file {}, starting empty: {}", self.path.display(), e),
                );
                return Vec::new();
            }
        };

        parse_log(&contents).unwrap_or_else(|| {
            logging::warn(
                DataSource::OddsLog,
                None,
                &format!("Log file {} is not a JSON array, starting empty", self.path.display()),
            );
            Vec::new()
        })
    }

    // -----------------------------------------------------------------------
    // Prune / merge
    // -----------------------------------------------------------------------

    /// Keeps records with `time >= now - retention`, in their original order.
    /// A record exactly at the cutoff is kept. Records whose timestamp does
    /// not parse cannot be placed in the window and are dropped.
    pub fn prune(&self, history: Vec<Observation>, now: DateTime<Utc>) -> Vec<Observation> {
        // A window reaching past the representable range keeps everything.
        let cutoff = now
            .checked_sub_signed(self.retention)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        history
            .into_iter()
            .filter(|obs| obs.timestamp().is_some_and(|at| at >= cutoff))
            .collect()
    }

    /// Replaces the last record when it falls in the same UTC date and hour
    /// as `entry`; appends otherwise. Returns the new history and whether a
    /// replacement happened.
    pub fn merge_or_append(mut history: Vec<Observation>, entry: Observation) -> (Vec<Observation>, bool) {
        let same_hour = match (history.last().and_then(Observation::timestamp), entry.timestamp()) {
            (Some(last), Some(new)) => same_clock_hour(last, new),
            _ => false,
        };

        if same_hour {
            if let Some(last) = history.last_mut() {
                *last = entry;
            }
        } else {
            history.push(entry);
        }
        (history, same_hour)
    }

    // -----------------------------------------------------------------------
    // Save
    // -----------------------------------------------------------------------

    /// Writes the full history atomically: temp file, fsync, rename. On any
    /// error the temp file is removed and the existing log is untouched.
    pub fn save(&self, history: &[Observation]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(history)?;
        let tmp = self.temp_path();

        if let Err(e) = write_synced(&tmp, json.as_bytes()).and_then(|_| fs::rename(&tmp, &self.path)) {
            // The temp path may be something we never created (e.g. a directory).
            if tmp.is_file() {
                let _ = fs::remove_file(&tmp);
            }
            return Err(StoreError::Io(e));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Full cycle
    // -----------------------------------------------------------------------

    /// Load, prune, merge `entry`, save. Either the whole cycle lands on disk
    /// or the previous file is left as it was.
    pub fn record(&self, entry: Observation, now: DateTime<Utc>) -> Result<RecordSummary, StoreError> {
        let history = self.load();
        self.record_onto(history, entry, now)
    }

    /// Same as `record` for a history the caller already loaded.
    pub fn record_onto(
        &self,
        history: Vec<Observation>,
        entry: Observation,
        now: DateTime<Utc>,
    ) -> Result<RecordSummary, StoreError> {
        let before = history.len();
        let kept = self.prune(history, now);
        let pruned = before - kept.len();

        let (merged, replaced) = Self::merge_or_append(kept, entry.clone());
        self.save(&merged)?;

        Ok(RecordSummary {
            entry,
            retained: merged.len(),
            pruned,
            replaced,
        })
    }
}

/// Parses log file text. `None` if the top level is not a JSON array.
pub fn parse_log(contents: &str) -> Option<Vec<Observation>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(contents).ok()?;
    let total = values.len();

    let records: Vec<Observation> = values
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();

    if records.len() < total {
        logging::warn(
            DataSource::OddsLog,
            None,
            &format!("Dropped {} malformed record(s) from log", total - records.len()),
        );
    }
    Some(records)
}

/// Same UTC calendar date and hour-of-day.
pub fn same_clock_hour(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive() && a.hour() == b.hour()
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
