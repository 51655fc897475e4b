//! Remote data collection.
//!
//! Each submodule splits URL construction and response parsing (pure,
//! unit-tested from fixtures) from the blocking HTTP call.
//!
//! Submodules:
//! - `nominatim` — ZIP code → coordinates.
//! - `nws`       — nearest station, latest pressure/temperature, previous pressure.
//! - `usgs`      — river gage height.

pub mod nominatim;
pub mod nws;
pub mod usgs;

use std::time::Duration;

use crate::config::Config;
use crate::logging::{self, DataSource};
use crate::model::{FetchError, Readings};

/// Blocking client shared by every request in a run.
pub fn build_client(config: &Config) -> Result<reqwest::blocking::Client, FetchError> {
    Ok(reqwest::blocking::Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?)
}

/// Collects the four readings a run needs. The first failure is logged with
/// its source and returned; no partial `Readings` is ever produced.
pub fn fetch_readings(
    client: &reqwest::blocking::Client,
    config: &Config,
) -> Result<Readings, FetchError> {
    let (lat, lon) = nominatim::geocode_zip(client, &config.zip_code).inspect_err(|e| {
        logging::log_fetch_failure(DataSource::Nominatim, Some(config.zip_code.as_str()), "Geocode", e)
    })?;
    logging::debug(
        DataSource::Nominatim,
        Some(config.zip_code.as_str()),
        &format!("Resolved to {:.4}, {:.4}", lat, lon),
    );

    let station = nws::find_nearest_station(client, lat, lon)
        .inspect_err(|e| logging::log_fetch_failure(DataSource::Nws, None, "Station lookup", e))?;

    let current = nws::fetch_latest(client, &station)
        .inspect_err(|e| logging::log_fetch_failure(DataSource::Nws, Some(station.as_str()), "Latest observation", e))?;

    let prev_pressure_mb = nws::fetch_previous_pressure(client, &station, config.previous_obs_limit)
        .inspect_err(|e| logging::log_fetch_failure(DataSource::Nws, Some(station.as_str()), "Previous pressure", e))?;

    let gauge_ft = usgs::fetch_gauge_height(client, &config.gauge_site)
        .inspect_err(|e| logging::log_fetch_failure(DataSource::Usgs, Some(config.gauge_site.as_str()), "Gage height", e))?;

    logging::debug(
        DataSource::System,
        Some(station.as_str()),
        &format!(
            "p_now={:.1} mb, p_prev={:.1} mb, T={:.1} °F, L={:.2} ft",
            current.pressure_mb, prev_pressure_mb, current.temp_f, gauge_ft
        ),
    );

    Ok(Readings {
        pressure_mb: current.pressure_mb,
        prev_pressure_mb,
        temp_f: current.temp_f,
        gauge_ft,
    })
}
