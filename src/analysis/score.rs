//! Composite catfish odds score.
//!
//! Four terms, each in [0, 1], combined with weights that sum to 1.0:
//!
//! | term        | input                      | ideal    | zero at   | weight |
//! |-------------|----------------------------|----------|-----------|--------|
//! | stability   | `StabilityEstimator` output | 1.0      | 0.0       | 0.30   |
//! | pressure    | \|p_now - p_prev\|          | 0 mb     | 10 mb     | 0.25   |
//! | gauge       | \|L_now - 7\|               | 7 ft     | ±5 ft     | 0.20   |
//! | temperature | \|T_now - 75\|              | 75 °F    | ±15 °F    | 0.25   |

use crate::model::Readings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub stability: f64,
    pub pressure: f64,
    pub gauge: f64,
    pub temperature: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            stability: 0.30,
            pressure: 0.25,
            gauge: 0.20,
            temperature: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreCalculator {
    pub weights: ScoreWeights,
    pub pressure_scale_mb: f64,
    pub ideal_gauge_ft: f64,
    pub gauge_scale_ft: f64,
    pub ideal_temp_f: f64,
    pub temp_scale_f: f64,
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            pressure_scale_mb: 10.0,
            ideal_gauge_ft: 7.0,
            gauge_scale_ft: 5.0,
            ideal_temp_f: 75.0,
            temp_scale_f: 15.0,
        }
    }
}

impl ScoreCalculator {
    /// Score as a percentage in [0, 100], rounded to one decimal place.
    ///
    /// `stability` is the fraction from `StabilityEstimator` and is used as-is.
    pub fn compute(&self, readings: &Readings, stability: f64) -> f64 {
        let pressure = closeness(readings.pressure_mb - readings.prev_pressure_mb, self.pressure_scale_mb);
        let gauge = closeness(readings.gauge_ft - self.ideal_gauge_ft, self.gauge_scale_ft);
        let temperature = closeness(readings.temp_f - self.ideal_temp_f, self.temp_scale_f);

        let w = &self.weights;
        let raw = w.stability * stability
            + w.pressure * pressure
            + w.gauge * gauge
            + w.temperature * temperature;

        round_tenth(raw * 100.0).clamp(0.0, 100.0)
    }
}

/// `1 - |deviation| / scale`, floored at zero.
fn closeness(deviation: f64, scale: f64) -> f64 {
    (1.0 - deviation.abs() / scale).max(0.0)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
