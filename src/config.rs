//! Runtime configuration.
//!
//! Built once in `main` and threaded into every component constructor; no
//! module reads the environment on its own. Values come from, in increasing
//! priority: built-in defaults, an optional TOML file, environment variables
//! (including anything `dotenv` loaded from `.env`).
//!
//! ```toml
//! log_file_path = "./data/odds_log.json"
//! zip_code = "19130"
//! gauge_site = "01473730"
//! retention_hours = 720
//! stability_threshold_mb = 2.0
//! stability_days = 4
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "./odds.toml";
pub const DEFAULT_LOG_FILE_PATH: &str = "./data/odds_log.json";
pub const DEFAULT_ZIP_CODE: &str = "19130";
pub const DEFAULT_USER_AGENT: &str = "CatfishOddsLogger/1.0 (youremail@example.com)";

/// Schuylkill River at Philadelphia.
pub const DEFAULT_GAUGE_SITE: &str = "01473730";

pub const DEFAULT_RETENTION_HOURS: i64 = 30 * 24;
pub const DEFAULT_STABILITY_THRESHOLD_MB: f64 = 2.0;
pub const DEFAULT_STABILITY_DAYS: u32 = 4;
pub const DEFAULT_PREVIOUS_OBS_LIMIT: u32 = 48;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Ten years. Anything longer is a typo, and far larger values overflow
/// timestamp arithmetic.
pub const MAX_RETENTION_HOURS: i64 = 10 * 365 * 24;
pub const MAX_STABILITY_DAYS: u32 = 60;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    /// A value was set but could not be parsed or is out of range.
    InvalidValue { key: String, value: String },
    /// The config file exists but could not be read.
    Io(std::io::Error),
    /// The config file is not valid TOML for this schema.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {}: {:?}", key, value)
            }
            ConfigError::Io(err) => write!(f, "Failed to read config file: {}", err),
            ConfigError::Parse(msg) => write!(f, "Failed to parse config file: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_file_path: PathBuf,
    pub zip_code: String,
    pub user_agent: String,
    pub gauge_site: String,
    pub retention_hours: i64,
    pub stability_threshold_mb: f64,
    pub stability_days: u32,
    /// How many recent observations to request when looking up the
    /// previous pressure.
    pub previous_obs_limit: u32,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file_path: PathBuf::from(DEFAULT_LOG_FILE_PATH),
            zip_code: DEFAULT_ZIP_CODE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            gauge_site: DEFAULT_GAUGE_SITE.to_string(),
            retention_hours: DEFAULT_RETENTION_HOURS,
            stability_threshold_mb: DEFAULT_STABILITY_THRESHOLD_MB,
            stability_days: DEFAULT_STABILITY_DAYS,
            previous_obs_limit: DEFAULT_PREVIOUS_OBS_LIMIT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Shape of the optional TOML file. Every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    log_file_path: Option<PathBuf>,
    zip_code: Option<String>,
    user_agent: Option<String>,
    gauge_site: Option<String>,
    retention_hours: Option<i64>,
    stability_threshold_mb: Option<f64>,
    stability_days: Option<u32>,
    previous_obs_limit: Option<u32>,
    request_timeout_secs: Option<u64>,
}

impl Config {
    /// Loads configuration the way the binary does: `ODDS_CONFIG` (or
    /// `./odds.toml`) if present, then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("ODDS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = Self::from_file_if_exists(Path::new(&path))?;
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Reads a TOML file on top of the defaults. A missing file yields the
    /// defaults unchanged.
    pub fn from_file_if_exists(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml_str(&contents)
    }

    /// Parses TOML text on top of the defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();

        if let Some(v) = file.log_file_path { config.log_file_path = v; }
        if let Some(v) = file.zip_code { config.zip_code = v; }
        if let Some(v) = file.user_agent { config.user_agent = v; }
        if let Some(v) = file.gauge_site { config.gauge_site = v; }
        if let Some(v) = file.retention_hours {
            config.retention_hours = check_retention_hours("retention_hours", v)?;
        }
        if let Some(v) = file.stability_threshold_mb {
            config.stability_threshold_mb = check_threshold_mb("stability_threshold_mb", v)?;
        }
        if let Some(v) = file.stability_days {
            config.stability_days = check_stability_days("stability_days", v)?;
        }
        if let Some(v) = file.previous_obs_limit { config.previous_obs_limit = v; }
        if let Some(v) = file.request_timeout_secs { config.request_timeout_secs = v; }

        Ok(config)
    }

    /// Applies overrides from a key lookup. `lookup` is `std::env::var` in
    /// production and a map in tests.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LOG_FILE_PATH") { self.log_file_path = PathBuf::from(v); }
        if let Some(v) = lookup("ZIP_CODE") { self.zip_code = v; }
        if let Some(v) = lookup("USER_AGENT") { self.user_agent = v; }
        if let Some(v) = lookup("USGS_GAUGE_SITE") { self.gauge_site = v; }
        if let Some(v) = lookup("KEEP_HOURS") {
            self.retention_hours = check_retention_hours("KEEP_HOURS", parse_value("KEEP_HOURS", &v)?)?;
        }
        if let Some(v) = lookup("STABILITY_THRESHOLD") {
            self.stability_threshold_mb =
                check_threshold_mb("STABILITY_THRESHOLD", parse_value("STABILITY_THRESHOLD", &v)?)?;
        }
        if let Some(v) = lookup("STABILITY_DAYS") {
            self.stability_days = check_stability_days("STABILITY_DAYS", parse_value("STABILITY_DAYS", &v)?)?;
        }
        if let Some(v) = lookup("PREVIOUS_OBS_LIMIT") {
            self.previous_obs_limit = parse_value("PREVIOUS_OBS_LIMIT", &v)?;
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_value("REQUEST_TIMEOUT_SECS", &v)?;
        }
        Ok(self)
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::hours(self.retention_hours)
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

// ---------------------------------------------------------------------------
// Range checks
// ---------------------------------------------------------------------------

/// 1..=MAX_RETENTION_HOURS. Zero or negative would prune every record.
fn check_retention_hours(key: &str, hours: i64) -> Result<i64, ConfigError> {
    if (1..=MAX_RETENTION_HOURS).contains(&hours) {
        Ok(hours)
    } else {
        Err(invalid(key, hours))
    }
}

fn check_stability_days(key: &str, days: u32) -> Result<u32, ConfigError> {
    if (1..=MAX_STABILITY_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(invalid(key, days))
    }
}

fn check_threshold_mb(key: &str, mb: f64) -> Result<f64, ConfigError> {
    if mb.is_finite() && mb >= 0.0 {
        Ok(mb)
    } else {
        Err(invalid(key, mb))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
