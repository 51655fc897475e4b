//! Scoring for the catfish odds logger.
//!
//! Submodules:
//! - `stability` — turns logged history into a [0, 1] barometric stability fraction.
//! - `score`     — combines live readings and stability into a bounded percentage.

pub mod score;
pub mod stability;

pub use score::ScoreCalculator;
pub use stability::StabilityEstimator;
