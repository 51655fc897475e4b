//! Core data types for the catfish odds logger.
//!
//! This module defines the shared domain model imported by all other modules:
//! the logged observation record, the four live readings that feed the score,
//! and the error types that cross module boundaries.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Parameter codes
// ---------------------------------------------------------------------------

/// USGS parameter code for gage height (stage), in feet.
pub const PARAM_STAGE: &str = "00065";

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// The four live scalars a run needs before any scoring can happen.
///
/// Produced by `ingest::fetch_readings`; if any one of them could not be
/// fetched the run aborts and no `Readings` value exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings {
    /// Latest barometric pressure, millibars.
    pub pressure_mb: f64,
    /// Barometric pressure from the previous observation, millibars.
    pub prev_pressure_mb: f64,
    /// Latest air temperature, degrees Fahrenheit.
    pub temp_f: f64,
    /// Latest river gauge height, feet.
    pub gauge_ft: f64,
}

/// One logged sample: the raw readings plus the score derived from them.
///
/// Field names on disk follow the log file format (`p_now`, `T_now`, `L_now`).
/// `time` stays a string so a record with a damaged timestamp can still be
/// loaded; use [`Observation::timestamp`] to get a parsed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub time: String, // ISO 8601 UTC, e.g. "2024-05-01T13:00:00Z"
    pub p_now: f64,
    #[serde(rename = "T_now")]
    pub t_now: f64,
    #[serde(rename = "L_now")]
    pub l_now: f64,
    pub score: f64,
}

impl Observation {
    /// Builds a record stamped at `at`, truncated to whole seconds.
    pub fn new(at: DateTime<Utc>, readings: &Readings, score: f64) -> Self {
        Self {
            time: format_timestamp(at),
            p_now: readings.pressure_mb,
            t_now: readings.temp_f,
            l_now: readings.gauge_ft,
            score,
        }
    }

    /// Parses `time`. Returns `None` when the stored value is not a valid
    /// RFC 3339 timestamp.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.time.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Canonical on-disk timestamp: second precision with a `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching a reading from a remote service.
#[derive(Debug, PartialEq)]
pub enum FetchError {
    /// Non-2xx HTTP response.
    HttpError(u16),
    /// The request never produced a response (DNS, connect, timeout).
    RequestFailed(String),
    /// The response body could not be deserialized.
    ParseError(String),
    /// The response parsed but did not carry the value we asked for.
    NoDataAvailable(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::HttpError(code) => write!(f, "HTTP error: {}", code),
            FetchError::RequestFailed(msg) => write!(f, "Request failed: {}", msg),
            FetchError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            FetchError::NoDataAvailable(what) => write!(f, "No data available: {}", what),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            FetchError::HttpError(status.as_u16())
        } else if err.is_decode() {
            FetchError::ParseError(err.to_string())
        } else {
            FetchError::RequestFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::ParseError(err.to_string())
    }
}

/// Errors that abort a log write. The previously persisted file is left as
/// it was whenever one of these is returned.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "I/O error: {}", err),
            StoreError::Serialize(err) => write!(f, "Serialization error: {}", err),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Serialize(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialize(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_readings() -> Readings {
        Readings {
            pressure_mb: 1013.2,
            prev_pressure_mb: 1012.8,
            temp_f: 71.6,
            gauge_ft: 6.4,
        }
    }

    #[test]
    fn test_timestamp_is_second_precision_with_z_suffix() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 13, 4, 5).unwrap()
            + chrono::Duration::milliseconds(750);
        assert_eq!(format_timestamp(at), "2024-05-01T13:04:05Z");
    }

    #[test]
    fn test_observation_serializes_with_log_field_names() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap();
        let obs = Observation::new(at, &sample_readings(), 81.3);
        let json = serde_json::to_value(&obs).expect("observation should serialize");

        assert_eq!(json["time"], "2024-05-01T13:00:00Z");
        assert_eq!(json["p_now"], 1013.2);
        assert_eq!(json["T_now"], 71.6);
        assert_eq!(json["L_now"], 6.4);
        assert_eq!(json["score"], 81.3);
    }

    #[test]
    fn test_timestamp_parses_z_and_offset_forms() {
        let mut obs = Observation::new(Utc::now(), &sample_readings(), 50.0);

        obs.time = "2024-05-01T13:00:00Z".to_string();
        assert_eq!(obs.timestamp(), Some(Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()));

        // 08:00 at -05:00 is the same instant as 13:00Z.
        obs.time = "2024-05-01T08:00:00-05:00".to_string();
        assert_eq!(obs.timestamp(), Some(Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()));
    }

    #[test]
    fn test_unparsable_timestamp_is_none() {
        let mut obs = Observation::new(Utc::now(), &sample_readings(), 50.0);
        obs.time = "yesterday-ish".to_string();
        assert!(obs.timestamp().is_none());
        obs.time = String::new();
        assert!(obs.timestamp().is_none());
    }

    #[test]
    fn test_fetch_error_display_matches_log_classification_patterns() {
        assert_eq!(FetchError::HttpError(503).to_string(), "HTTP error: 503");
        assert!(FetchError::ParseError("eof".into()).to_string().starts_with("Parse error"));
        assert!(FetchError::NoDataAvailable("gauge".into()).to_string().starts_with("No data"));
    }
}
