//! National Weather Service (api.weather.gov) client
//!
//! Resolves the nearest observation station for a coordinate and reads the
//! latest barometric pressure and temperature, plus the pressure from the
//! observation before it.
//!
//! The API reports SI units: pressure in pascals, temperature in °C. Values
//! are converted to millibars and °F here so the rest of the crate never
//! sees SI units.
//!
//! API Documentation: https://www.weather.gov/documentation/services-web-api

use serde::Deserialize;

use crate::model::FetchError;

const NWS_BASE_URL: &str = "https://api.weather.gov";

// ============================================================================
// API Response Structures
// ============================================================================

/// `/points/{lat},{lon}`
#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
struct PointsProperties {
    #[serde(rename = "observationStations")]
    observation_stations: String,
}

/// `/gridpoints/.../stations`
#[derive(Debug, Deserialize)]
struct StationsResponse {
    #[serde(default)]
    features: Vec<StationFeature>,
}

#[derive(Debug, Deserialize)]
struct StationFeature {
    properties: StationProperties,
}

#[derive(Debug, Deserialize)]
struct StationProperties {
    #[serde(rename = "stationIdentifier")]
    station_identifier: String,
}

/// `/stations/{id}/observations/latest`
#[derive(Debug, Deserialize)]
struct ObservationResponse {
    properties: ObservationProperties,
}

/// `/stations/{id}/observations`
#[derive(Debug, Deserialize)]
struct ObservationCollection {
    #[serde(default)]
    features: Vec<ObservationResponse>,
}

#[derive(Debug, Deserialize)]
struct ObservationProperties {
    #[serde(rename = "barometricPressure")]
    barometric_pressure: Option<Measurement>,
    temperature: Option<Measurement>,
}

/// A value with its WMO unit code. `value` is null when the sensor
/// did not report.
#[derive(Debug, Deserialize)]
struct Measurement {
    value: Option<f64>,
}

/// Latest station conditions, already in logger units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentConditions {
    pub pressure_mb: f64,
    pub temp_f: f64,
}

// ============================================================================
// Unit conversion
// ============================================================================

pub fn pascals_to_millibars(pa: f64) -> f64 {
    pa / 100.0
}

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

fn required(measurement: Option<&Measurement>, what: &str) -> Result<f64, FetchError> {
    let value = measurement
        .and_then(|m| m.value)
        .ok_or_else(|| FetchError::NoDataAvailable(format!("{} not reported", what)))?;

    if !value.is_finite() {
        return Err(FetchError::ParseError(format!("{} is not finite", what)));
    }
    Ok(value)
}

// ============================================================================
// URL construction and parsing
// ============================================================================

pub fn build_points_url(lat: f64, lon: f64) -> String {
    format!("{}/points/{:.4},{:.4}", NWS_BASE_URL, lat, lon)
}

pub fn build_latest_observation_url(station_id: &str) -> String {
    format!("{}/stations/{}/observations/latest", NWS_BASE_URL, station_id)
}

pub fn build_observations_url(station_id: &str, limit: u32) -> String {
    format!("{}/stations/{}/observations?limit={}", NWS_BASE_URL, station_id, limit)
}

/// URL of the station list for a forecast point.
pub fn parse_points_response(body: &str) -> Result<String, FetchError> {
    let points: PointsResponse = serde_json::from_str(body)?;
    Ok(points.properties.observation_stations)
}

/// Identifier of the nearest (first listed) station.
pub fn parse_stations_response(body: &str) -> Result<String, FetchError> {
    let stations: StationsResponse = serde_json::from_str(body)?;
    stations
        .features
        .into_iter()
        .next()
        .map(|f| f.properties.station_identifier)
        .ok_or_else(|| FetchError::NoDataAvailable("no observation stations listed".to_string()))
}

pub fn parse_latest_observation(body: &str) -> Result<CurrentConditions, FetchError> {
    let obs: ObservationResponse = serde_json::from_str(body)?;
    let props = &obs.properties;

    let pressure_pa = required(props.barometric_pressure.as_ref(), "barometricPressure")?;
    let temp_c = required(props.temperature.as_ref(), "temperature")?;

    Ok(CurrentConditions {
        pressure_mb: pascals_to_millibars(pressure_pa),
        temp_f: celsius_to_fahrenheit(temp_c),
    })
}

/// Pressure from the second-newest observation in a collection, in mb.
/// The newest entry is the same report `latest` returns.
pub fn parse_previous_pressure(body: &str) -> Result<f64, FetchError> {
    let collection: ObservationCollection = serde_json::from_str(body)?;
    let previous = collection
        .features
        .get(1)
        .ok_or_else(|| FetchError::NoDataAvailable("fewer than two recent observations".to_string()))?;

    required(previous.properties.barometric_pressure.as_ref(), "previous barometricPressure")
        .map(pascals_to_millibars)
}

// ============================================================================
// API Client Functions
// ============================================================================

fn get_text(client: &reqwest::blocking::Client, url: &str) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .header("Accept", "application/geo+json")
        .send()?;

    if !response.status().is_success() {
        return Err(FetchError::HttpError(response.status().as_u16()));
    }
    Ok(response.text()?)
}

/// Nearest observation station identifier (e.g. "KPHL") for a coordinate.
pub fn find_nearest_station(
    client: &reqwest::blocking::Client,
    lat: f64,
    lon: f64,
) -> Result<String, FetchError> {
    let stations_url = parse_points_response(&get_text(client, &build_points_url(lat, lon))?)?;
    parse_stations_response(&get_text(client, &stations_url)?)
}

pub fn fetch_latest(
    client: &reqwest::blocking::Client,
    station_id: &str,
) -> Result<CurrentConditions, FetchError> {
    parse_latest_observation(&get_text(client, &build_latest_observation_url(station_id))?)
}

pub fn fetch_previous_pressure(
    client: &reqwest::blocking::Client,
    station_id: &str,
    limit: u32,
) -> Result<f64, FetchError> {
    parse_previous_pressure(&get_text(client, &build_observations_url(station_id, limit))?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn observation_json(pressure_pa: &str, temp_c: &str) -> String {
        format!(
            r#"{{
              "properties": {{
                "station": "https://api.weather.gov/stations/KPHL",
                "timestamp": "2024-05-01T12:54:00+00:00",
                "barometricPressure": {{ "unitCode": "wmoUnit:Pa", "value": {} }},
                "temperature": {{ "unitCode": "wmoUnit:degC", "value": {} }}
              }}
            }}"#,
            pressure_pa, temp_c
        )
    }

    #[test]
    fn test_unit_conversions() {
        assert_eq!(pascals_to_millibars(101_325.0), 1013.25);
        assert_eq!(celsius_to_fahrenheit(0.0), 32.0);
        assert_eq!(celsius_to_fahrenheit(25.0), 77.0);
        assert_eq!(celsius_to_fahrenheit(-40.0), -40.0);
    }

    #[test]
    fn test_parse_points_response() {
        let body = r#"{"properties": {"gridId": "PHI", "observationStations": "https://api.weather.gov/gridpoints/PHI/49,75/stations"}}"#;
        assert_eq!(
            parse_points_response(body).unwrap(),
            "https://api.weather.gov/gridpoints/PHI/49,75/stations"
        );
    }

    #[test]
    fn test_parse_stations_takes_first() {
        let body = r#"{"features": [
            {"properties": {"stationIdentifier": "KPHL", "name": "Philadelphia International Airport"}},
            {"properties": {"stationIdentifier": "KPNE", "name": "Northeast Philadelphia Airport"}}
        ]}"#;
        assert_eq!(parse_stations_response(body).unwrap(), "KPHL");
    }

    #[test]
    fn test_parse_stations_empty_is_no_data() {
        assert!(matches!(
            parse_stations_response(r#"{"features": []}"#),
            Err(FetchError::NoDataAvailable(_))
        ));
    }

    #[test]
    fn test_parse_latest_observation_converts_units() {
        let conditions = parse_latest_observation(&observation_json("101320", "25")).unwrap();
        assert_eq!(conditions.pressure_mb, 1013.2);
        assert_eq!(conditions.temp_f, 77.0);
    }

    #[test]
    fn test_null_pressure_is_no_data() {
        let result = parse_latest_observation(&observation_json("null", "25"));
        match result {
            Err(FetchError::NoDataAvailable(msg)) => assert!(msg.contains("barometricPressure")),
            other => panic!("expected NoDataAvailable, got {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_measurement_is_parse_error() {
        let nan = Measurement { value: Some(f64::NAN) };
        let inf = Measurement { value: Some(f64::INFINITY) };
        assert!(matches!(required(Some(&nan), "temperature"), Err(FetchError::ParseError(_))));
        assert!(matches!(required(Some(&inf), "temperature"), Err(FetchError::ParseError(_))));
        assert_eq!(required(Some(&Measurement { value: Some(21.5) }), "temperature"), Ok(21.5));
    }

    #[test]
    fn test_parse_previous_pressure_uses_second_feature() {
        let body = format!(
            r#"{{"features": [{}, {}]}}"#,
            observation_json("101500", "20"),
            observation_json("101200", "19")
        );
        assert_eq!(parse_previous_pressure(&body).unwrap(), 1012.0);
    }

    #[test]
    fn test_previous_pressure_needs_two_observations() {
        let body = format!(r#"{{"features": [{}]}}"#, observation_json("101500", "20"));
        assert!(matches!(parse_previous_pressure(&body), Err(FetchError::NoDataAvailable(_))));
    }

    #[test]
    fn test_url_builders() {
        assert_eq!(build_points_url(39.96561, -75.18099), "https://api.weather.gov/points/39.9656,-75.1810");
        assert!(build_observations_url("KPHL", 48).ends_with("/stations/KPHL/observations?limit=48"));
        assert!(build_latest_observation_url("KPHL").ends_with("/stations/KPHL/observations/latest"));
    }
}
