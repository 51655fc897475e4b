//! One logging run: history → stability → score → log write.
//!
//! Takes readings that were already fetched, so everything here is local
//! and deterministic given `now`.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::analysis::{ScoreCalculator, StabilityEstimator};
use crate::config::Config;
use crate::model::{Observation, Readings, StoreError};
use crate::store::{LogStore, RecordSummary};

/// Components of a run, built from one `Config`.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub estimator: StabilityEstimator,
    pub calculator: ScoreCalculator,
    pub store: LogStore,
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub stability: f64,
    pub record: RecordSummary,
}

impl RunOutcome {
    pub fn entry(&self) -> &Observation {
        &self.record.entry
    }
}

/// The confirmation line printed after a successful run.
impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] Logged odds: {:.1}%", self.entry().time, self.entry().score)
    }
}

impl Pipeline {
    pub fn from_config(config: &Config) -> Self {
        Self {
            estimator: StabilityEstimator::from_config(config),
            calculator: ScoreCalculator::default(),
            store: LogStore::from_config(config),
        }
    }

    /// Runs against the log at `now`. Stability is computed from the history
    /// as loaded, before pruning. Nothing on disk changes unless the final
    /// save succeeds.
    pub fn run_at(&self, readings: &Readings, now: DateTime<Utc>) -> Result<RunOutcome, StoreError> {
        let history = self.store.load();
        let stability = self.estimator.estimate_at(&history, now.date_naive());
        let score = self.calculator.compute(readings, stability);
        let entry = Observation::new(now, readings, score);

        let record = self.store.record_onto(history, entry, now)?;
        Ok(RunOutcome { stability, record })
    }

    pub fn run(&self, readings: &Readings) -> Result<RunOutcome, StoreError> {
        self.run_at(readings, Utc::now())
    }
}
