//! USGS NWIS Instantaneous Values client
//!
//! Retrieves the latest gage height (parameter 00065) for a single river
//! gauge. Only the first value of the first time series is used.
//!
//! API Documentation: https://waterservices.usgs.gov/docs/instantaneous-values/

use serde::Deserialize;

use crate::model::{FetchError, PARAM_STAGE};

const USGS_IV_BASE_URL: &str = "https://waterservices.usgs.gov/nwis/iv/";

/// USGS reports missing values as this sentinel instead of null.
const NO_DATA_SENTINEL: f64 = -999999.0;

// ============================================================================
// IV API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct IvResponse {
    value: IvValue,
}

#[derive(Debug, Deserialize)]
struct IvValue {
    #[serde(rename = "timeSeries", default)]
    time_series: Vec<IvTimeSeries>,
}

#[derive(Debug, Deserialize)]
struct IvTimeSeries {
    #[serde(default)]
    values: Vec<IvValueSet>,
}

#[derive(Debug, Deserialize)]
struct IvValueSet {
    #[serde(default)]
    value: Vec<IvPoint>,
}

#[derive(Debug, Deserialize)]
struct IvPoint {
    value: String, // numeric, but transmitted as a string
}

// ============================================================================
// URL construction and parsing
// ============================================================================

/// Builds the IV request URL for one site's gage height.
pub fn build_iv_url(site_code: &str) -> String {
    format!(
        "{}?format=json&sites={}&parameterCd={}",
        USGS_IV_BASE_URL, site_code, PARAM_STAGE
    )
}

/// Extracts the gage height in feet from an IV JSON response body.
pub fn parse_gauge_height(body: &str) -> Result<f64, FetchError> {
    let response: IvResponse = serde_json::from_str(body)?;

    let raw = response
        .value
        .time_series
        .first()
        .ok_or_else(|| FetchError::NoDataAvailable("No timeSeries entries in response".to_string()))?
        .values
        .first()
        .and_then(|set| set.value.first())
        .ok_or_else(|| FetchError::NoDataAvailable("timeSeries contained no values".to_string()))?;

    let height: f64 = raw
        .value
        .trim()
        .parse()
        .map_err(|_| FetchError::ParseError(format!("gage height {:?} is not a number", raw.value)))?;

    if height == NO_DATA_SENTINEL {
        return Err(FetchError::NoDataAvailable("gage height is the -999999 sentinel".to_string()));
    }
    if !height.is_finite() {
        return Err(FetchError::ParseError(format!("gage height {:?} is not finite", raw.value)));
    }
    Ok(height)
}

// ============================================================================
// API Client Functions
// ============================================================================

/// Fetch the current gage height for a site, in feet.
pub fn fetch_gauge_height(
    client: &reqwest::blocking::Client,
    site_code: &str,
) -> Result<f64, FetchError> {
    let response = client
        .get(build_iv_url(site_code))
        .header("Accept", "application/json")
        .send()?;

    if !response.status().is_success() {
        return Err(FetchError::HttpError(response.status().as_u16()));
    }

    parse_gauge_height(&response.text()?)
}

// ============================================================================
// Tests
// ============================================================================
