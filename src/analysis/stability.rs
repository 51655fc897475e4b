//! Barometric stability from logged history.
//!
//! Fish feed better after several days of steady pressure. This module looks
//! at the daily mean pressure over the last few complete days and reports
//! what fraction of day-to-day changes stayed within a threshold.
//!
//! # Clock injection
//! `estimate_at` takes `today` as a parameter rather than calling
//! `Utc::now()`, so tests stay deterministic. `estimate` is the wall-clock
//! convenience wrapper.

use chrono::{Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::config::Config;
use crate::model::Observation;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityEstimator {
    /// Number of complete days ending yesterday that make up the window.
    /// Also the denominator of the result.
    pub days: u32,
    /// Largest day-to-day change in mean pressure (mb) still counted as stable.
    pub threshold_mb: f64,
}

impl StabilityEstimator {
    pub fn new(days: u32, threshold_mb: f64) -> Self {
        Self { days, threshold_mb }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.stability_days, config.stability_threshold_mb)
    }

    /// Stability fraction relative to the current UTC date.
    pub fn estimate(&self, history: &[Observation]) -> f64 {
        self.estimate_at(history, Utc::now().date_naive())
    }

    /// Stability fraction in [0, 1] for the window of `self.days` dates that
    /// ends the day before `today`.
    ///
    /// Only adjacent days that both have data can count as stable, so a window
    /// of N days yields at most (N - 1) / N. A patchy history simply scores
    /// lower.
    pub fn estimate_at(&self, history: &[Observation], today: NaiveDate) -> f64 {
        if history.is_empty() || self.days == 0 {
            return 0.0;
        }

        let means = daily_mean_pressure(history);

        // Oldest first: today - days, ..., today - 1.
        let window: Vec<Option<f64>> = (1..=i64::from(self.days))
            .rev()
            .map(|offset| {
                today
                    .checked_sub_signed(Duration::days(offset))
                    .and_then(|date| means.get(&date).copied())
            })
            .collect();

        let stable = window
            .windows(2)
            .filter(|pair| match (pair[0], pair[1]) {
                (Some(earlier), Some(later)) => (later - earlier).abs() <= self.threshold_mb,
                _ => false,
            })
            .count();

        stable as f64 / f64::from(self.days)
    }
}

/// Mean `p_now` per UTC calendar date. Records whose timestamp does not parse
/// are left out.
pub fn daily_mean_pressure(history: &[Observation]) -> BTreeMap<NaiveDate, f64> {
    let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();

    for obs in history {
        let Some(at) = obs.timestamp() else {
            continue;
        };
        let entry = sums.entry(at.date_naive()).or_insert((0.0, 0));
        entry.0 += obs.p_now;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(date, (sum, count))| (date, sum / count as f64))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
