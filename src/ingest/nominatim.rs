//! ZIP code geocoding via OpenStreetMap Nominatim.
//!
//! Usage policy requires an identifying User-Agent, which the shared client
//! carries (see `ingest::build_client`).

use serde::Deserialize;

use crate::model::FetchError;

const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// Search request for one US postal code. Query values are percent-encoded.
pub fn build_search_request(
    client: &reqwest::blocking::Client,
    zip_code: &str,
) -> Result<reqwest::blocking::Request, FetchError> {
    Ok(client
        .get(NOMINATIM_SEARCH_URL)
        .query(&[
            ("postalcode", zip_code),
            ("country", "USA"),
            ("format", "json"),
            ("limit", "1"),
        ])
        .build()?)
}

/// Returns `(latitude, longitude)` of the first search result.
pub fn parse_search_response(body: &str, zip_code: &str) -> Result<(f64, f64), FetchError> {
    let places: Vec<Place> = serde_json::from_str(body)?;
    let place = places
        .first()
        .ok_or_else(|| FetchError::NoDataAvailable(format!("no geocode results for ZIP {}", zip_code)))?;

    let lat = parse_coordinate(&place.lat, "lat")?;
    let lon = parse_coordinate(&place.lon, "lon")?;
    Ok((lat, lon))
}

fn parse_coordinate(raw: &str, field: &str) -> Result<f64, FetchError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| FetchError::ParseError(format!("{} {:?} is not a number", field, raw)))?;

    if !value.is_finite() {
        return Err(FetchError::ParseError(format!("{} {:?} is not finite", field, raw)));
    }
    Ok(value)
}

pub fn geocode_zip(client: &reqwest::blocking::Client, zip_code: &str) -> Result<(f64, f64), FetchError> {
    let response = client.execute(build_search_request(client, zip_code)?)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpError(response.status().as_u16()));
    }

    parse_search_response(&response.text()?, zip_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_result() {
        let body = r#"[{"place_id": 1, "lat": "39.9656", "lon": "-75.1810", "display_name": "Philadelphia"}]"#;
        let (lat, lon) = parse_search_response(body, "19130").expect("should parse");
        assert_eq!(lat, 39.9656);
        assert_eq!(lon, -75.1810);
    }

    #[test]
    fn test_empty_result_is_no_data() {
        let result = parse_search_response("[]", "00000");
        match result {
            Err(FetchError::NoDataAvailable(msg)) => assert!(msg.contains("00000")),
            other => panic!("expected NoDataAvailable, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_coordinate_is_parse_error() {
        let body = r#"[{"lat": "north", "lon": "-75.1810"}]"#;
        assert!(matches!(parse_search_response(body, "19130"), Err(FetchError::ParseError(_))));
    }

    #[test]
    fn test_non_finite_coordinate_is_parse_error() {
        let body = r#"[{"lat": "NaN", "lon": "-75.1810"}]"#;
        assert!(matches!(parse_search_response(body, "19130"), Err(FetchError::ParseError(_))));

        let body = r#"[{"lat": "39.9656", "lon": "-inf"}]"#;
        assert!(matches!(parse_search_response(body, "19130"), Err(FetchError::ParseError(_))));
    }

    fn query_pairs(request: &reqwest::blocking::Request) -> Vec<(String, String)> {
        request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_search_request_includes_zip() {
        let client = reqwest::blocking::Client::new();
        let request = build_search_request(&client, "19130").unwrap();

        assert!(request.url().as_str().starts_with(NOMINATIM_SEARCH_URL));
        let pairs = query_pairs(&request);
        assert!(pairs.contains(&("postalcode".to_string(), "19130".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "1".to_string())));
    }

    #[test]
    fn test_search_request_encodes_reserved_characters_in_zip() {
        let client = reqwest::blocking::Client::new();
        let request = build_search_request(&client, "19130&limit=50").unwrap();

        let query = request.url().query().unwrap_or_default();
        assert!(!query.contains("limit=50"), "raw query was {:?}", query);

        let pairs = query_pairs(&request);
        assert!(pairs.contains(&("postalcode".to_string(), "19130&limit=50".to_string())));
        assert_eq!(pairs.iter().filter(|(k, _)| k == "limit").count(), 1);
    }
}
