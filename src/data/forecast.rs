//! Open-Meteo hourly forecast client
//!
//! This module fetches hourly forecast data from the Open-Meteo API and
//! reshapes the column-oriented `hourly` object into a [`ForecastTable`].
//! Structural problems in the response are errors; malformed individual
//! cells are recovered as `None`.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{debug, info, warn};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::{ForecastField, ForecastRequest, ForecastRow, ForecastTable};

/// Base URL for the Open-Meteo API
pub const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Timestamp layouts accepted for the `hourly.time` column
const TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Errors that can occur when fetching forecast data
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connection, TLS, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Forecast API returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// The body is not a JSON object
    #[error("Failed to parse JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The JSON does not have the expected `hourly` layout
    #[error("Unexpected response layout: {0}")]
    Schema(#[from] SchemaError),
}

impl FetchError {
    /// True for transport failures and non-success statuses
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Request(_) | FetchError::Status { .. })
    }
}

/// Structural problems with the `hourly` object of a response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("missing key '{0}'")]
    MissingKey(String),

    #[error("'{0}' is not an object")]
    NotAnObject(String),

    #[error("'{0}' is not an array")]
    NotAnArray(String),

    #[error("'{field}' has {actual} entries but 'time' has {expected}")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },
}

/// Client for fetching hourly forecasts from Open-Meteo
#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: Client,
    base_url: String,
}

impl Default for ForecastClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastClient {
    /// Create a new ForecastClient with default settings
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Create a new ForecastClient with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: OPEN_METEO_BASE_URL.to_string(),
        }
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client))
    }

    /// Point the client at a different forecast endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query parameters for the given request, unencoded
    fn query_params(request: &ForecastRequest) -> [(&'static str, String); 4] {
        [
            ("latitude", request.location.latitude.to_string()),
            ("longitude", request.location.longitude.to_string()),
            ("hourly", request.hourly_param()),
            ("timezone", request.timezone.as_query_value().to_string()),
        ]
    }

    /// GET request with every parameter percent-encoded into the query string
    fn build_request(&self, request: &ForecastRequest) -> Result<reqwest::Request, FetchError> {
        Ok(self
            .client
            .get(&self.base_url)
            .query(&Self::query_params(request))
            .build()?)
    }

    /// Full request URL for the given parameters
    pub fn request_url(&self, request: &ForecastRequest) -> Result<Url, FetchError> {
        Ok(self.build_request(request)?.url().clone())
    }

    /// Fetch the hourly forecast described by `request`
    ///
    /// Issues exactly one GET. Callers that want memoization go through
    /// [`crate::cache::ForecastCache`].
    ///
    /// # Returns
    /// * `Ok(ForecastTable)` - One row per entry of the `hourly.time` array
    /// * `Err(FetchError)` - If the request fails, the status is not 2xx, or
    ///   the body does not have the expected layout
    pub async fn fetch(&self, request: &ForecastRequest) -> Result<ForecastTable, FetchError> {
        let http_request = self.build_request(request)?;
        let url = http_request.url().to_string();
        info!("Fetching forecast from {}", url);

        let response = self.client.execute(http_request).await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Forecast API returned {} for {}", status, url);
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let text = response.text().await?;
        let table = parse_forecast(&text, request.fields())?;
        info!(
            "Fetched {} hourly rows (timezone {})",
            table.len(),
            table.timezone.as_deref().unwrap_or("unknown")
        );
        Ok(table)
    }
}

/// Top-level response; everything except `hourly` is optional metadata
#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    hourly: Option<Value>,
    timezone: Option<String>,
    utc_offset_seconds: Option<i32>,
}

/// Parse a response body into a table holding the requested fields
pub fn parse_forecast(body: &str, fields: &[ForecastField]) -> Result<ForecastTable, FetchError> {
    let response: OpenMeteoResponse = serde_json::from_str(body)?;

    let hourly = response
        .hourly
        .ok_or_else(|| SchemaError::MissingKey("hourly".to_string()))?;
    let hourly = hourly
        .as_object()
        .ok_or_else(|| SchemaError::NotAnObject("hourly".to_string()))?;

    let mut table = build_table(hourly, fields)?;
    table.timezone = response.timezone;
    table.utc_offset_seconds = response.utc_offset_seconds;
    Ok(table)
}

/// Zip the parallel `hourly` arrays into rows
fn build_table(
    hourly: &Map<String, Value>,
    fields: &[ForecastField],
) -> Result<ForecastTable, SchemaError> {
    let times = column(hourly, "time")?;
    let len = times.len();

    let mut columns = Vec::with_capacity(fields.len());
    for &field in fields {
        let values = column(hourly, field.api_name())?;
        if values.len() != len {
            return Err(SchemaError::LengthMismatch {
                field: field.api_name().to_string(),
                expected: len,
                actual: values.len(),
            });
        }
        columns.push((field, values));
    }

    let mut bad_cells = 0usize;
    let mut rows = Vec::with_capacity(len);

    for (i, time) in times.iter().enumerate() {
        let timestamp = parse_timestamp(time);
        if timestamp.is_none() {
            debug!("Unparseable timestamp at row {}: {}", i, time);
            bad_cells += 1;
        }

        let mut row = ForecastRow::new(timestamp);
        for (field, values) in &columns {
            let raw = &values[i];
            let value = coerce_number(raw);
            if value.is_none() && !raw.is_null() {
                debug!("Non-numeric {} at row {}: {}", field, i, raw);
                bad_cells += 1;
            }
            row.set(*field, value);
        }
        rows.push(row);
    }

    if bad_cells > 0 {
        warn!("{} forecast cells could not be parsed and were left empty", bad_cells);
    }

    Ok(ForecastTable {
        rows,
        fields: fields.to_vec(),
        timezone: None,
        utc_offset_seconds: None,
        fetched_at: Utc::now(),
    })
}

/// Look up an array-valued key of the `hourly` object
fn column<'a>(hourly: &'a Map<String, Value>, key: &str) -> Result<&'a [Value], SchemaError> {
    hourly
        .get(key)
        .ok_or_else(|| SchemaError::MissingKey(format!("hourly.{}", key)))?
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| SchemaError::NotAnArray(format!("hourly.{}", key)))
}

/// Parse one `time` cell; anything that is not a recognizable timestamp string is `None`
fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
    value.as_str().and_then(parse_datetime)
}

/// Parse a local timestamp such as `2024-05-06T14:00`
///
/// RFC 3339 strings keep their wall-clock time; a bare date means midnight.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Coerce a cell to a finite number; numeric strings are accepted
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_server::{serve, TestServer};
    use crate::data::{Location, TimezoneMode};
    use chrono::NaiveDate;

    /// Trimmed Open-Meteo response with all six variables
    const VALID_RESPONSE: &str = r#"{
        "latitude": 41.875,
        "longitude": -87.625,
        "generationtime_ms": 0.08,
        "utc_offset_seconds": -18000,
        "timezone": "America/Chicago",
        "timezone_abbreviation": "CDT",
        "elevation": 181.0,
        "hourly_units": {
            "time": "iso8601",
            "temperature_2m": "°C",
            "relative_humidity_2m": "%",
            "precipitation": "mm",
            "cloudcover": "%",
            "windspeed_10m": "km/h",
            "winddirection_10m": "°"
        },
        "hourly": {
            "time": ["2024-05-06T00:00", "2024-05-06T01:00", "2024-05-06T02:00", "2024-05-07T00:00"],
            "temperature_2m": [10.0, 12.0, 11.0, 9.5],
            "relative_humidity_2m": [80, 82, 85, 90],
            "precipitation": [0.0, 0.2, 0.0, 1.4],
            "cloudcover": [100, 75, 50, 25],
            "windspeed_10m": [12.3, 15.1, 9.8, 22.0],
            "winddirection_10m": [270, 280, 290, 300]
        }
    }"#;

    fn all_fields() -> Vec<ForecastField> {
        ForecastField::ALL.to_vec()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_valid_response() {
        let table = parse_forecast(VALID_RESPONSE, &all_fields()).expect("Failed to parse");

        assert_eq!(table.len(), 4);
        assert_eq!(table.timezone.as_deref(), Some("America/Chicago"));
        assert_eq!(table.utc_offset_seconds, Some(-18000));

        let first = &table.rows[0];
        assert_eq!(first.timestamp(), parse_datetime("2024-05-06T00:00"));
        assert_eq!(first.temperature_c, Some(10.0));
        assert_eq!(first.humidity_pct, Some(80.0));
        assert_eq!(first.precipitation_mm, Some(0.0));
        assert_eq!(first.cloud_cover_pct, Some(100.0));
        assert_eq!(first.wind_speed_kph, Some(12.3));
        assert_eq!(first.wind_direction_deg, Some(270.0));
    }

    #[test]
    fn test_row_count_matches_time_array_length() {
        let table = parse_forecast(VALID_RESPONSE, &[ForecastField::Temperature]).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.fields, vec![ForecastField::Temperature]);
        // Fields that were not requested stay empty even though the body has them
        assert!(table.rows.iter().all(|r| r.wind_speed_kph.is_none()));
    }

    #[test]
    fn test_calendar_date_derived_from_timestamp() {
        let table = parse_forecast(VALID_RESPONSE, &all_fields()).unwrap();
        let dates: Vec<_> = table.rows.iter().map(|r| r.calendar_date()).collect();
        assert_eq!(
            dates,
            vec![
                Some(date(2024, 5, 6)),
                Some(date(2024, 5, 6)),
                Some(date(2024, 5, 6)),
                Some(date(2024, 5, 7)),
            ]
        );
    }

    #[test]
    fn test_malformed_timestamp_becomes_none_in_place() {
        let body = r#"{"hourly": {
            "time": ["2024-05-06T00:00", "yesterday-ish", "2024-05-06T02:00"],
            "temperature_2m": [10.0, 11.0, 12.0]
        }}"#;
        let table = parse_forecast(body, &[ForecastField::Temperature]).unwrap();

        assert_eq!(table.len(), 3);
        assert!(table.rows[1].timestamp().is_none());
        assert!(table.rows[1].calendar_date().is_none());
        // The row keeps its position and its value
        assert_eq!(table.rows[1].temperature_c, Some(11.0));
        assert!(table.rows[2].timestamp().is_some());
    }

    #[test]
    fn test_non_numeric_values_become_none() {
        let body = r#"{"hourly": {
            "time": ["2024-05-06T00:00", "2024-05-06T01:00", "2024-05-06T02:00", "2024-05-06T03:00"],
            "precipitation": [null, "n/a", "0.4", true]
        }}"#;
        let table = parse_forecast(body, &[ForecastField::Precipitation]).unwrap();
        let values: Vec<_> = table.rows.iter().map(|r| r.precipitation_mm).collect();
        assert_eq!(values, vec![None, None, Some(0.4), None]);
    }

    #[test]
    fn test_numeric_string_nan_is_rejected() {
        assert_eq!(coerce_number(&Value::String("NaN".to_string())), None);
        assert_eq!(coerce_number(&Value::String("inf".to_string())), None);
        assert_eq!(coerce_number(&serde_json::json!(" 3.5 ")), Some(3.5));
    }

    #[test]
    fn test_missing_hourly_is_schema_error() {
        let result = parse_forecast(r#"{"latitude": 41.88}"#, &all_fields());
        match result {
            Err(FetchError::Schema(SchemaError::MissingKey(key))) => assert_eq!(key, "hourly"),
            other => panic!("Expected MissingKey error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_requested_variable_is_schema_error() {
        let body = r#"{"hourly": {"time": ["2024-05-06T00:00"], "temperature_2m": [1.0]}}"#;
        let result = parse_forecast(body, &[ForecastField::Temperature, ForecastField::WindSpeed]);
        match result {
            Err(FetchError::Schema(SchemaError::MissingKey(key))) => {
                assert_eq!(key, "hourly.windspeed_10m")
            }
            other => panic!("Expected MissingKey error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_time_is_schema_error() {
        let body = r#"{"hourly": {"temperature_2m": [1.0]}}"#;
        let result = parse_forecast(body, &[ForecastField::Temperature]);
        assert!(matches!(
            result,
            Err(FetchError::Schema(SchemaError::MissingKey(_)))
        ));
    }

    #[test]
    fn test_length_mismatch_is_schema_error() {
        let body = r#"{"hourly": {
            "time": ["2024-05-06T00:00", "2024-05-06T01:00"],
            "temperature_2m": [15.0]
        }}"#;
        let result = parse_forecast(body, &[ForecastField::Temperature]);
        match result {
            Err(FetchError::Schema(SchemaError::LengthMismatch {
                field,
                expected,
                actual,
            })) => {
                assert_eq!(field, "temperature_2m");
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("Expected LengthMismatch error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_array_column_is_schema_error() {
        let body = r#"{"hourly": {"time": "2024-05-06T00:00", "temperature_2m": [1.0]}}"#;
        let result = parse_forecast(body, &[ForecastField::Temperature]);
        assert!(matches!(
            result,
            Err(FetchError::Schema(SchemaError::NotAnArray(_)))
        ));
    }

    #[test]
    fn test_hourly_not_object_is_schema_error() {
        let result = parse_forecast(r#"{"hourly": [1, 2, 3]}"#, &all_fields());
        assert!(matches!(
            result,
            Err(FetchError::Schema(SchemaError::NotAnObject(_)))
        ));
    }

    #[test]
    fn test_malformed_json_is_decode_error() {
        let result = parse_forecast("{ invalid json }", &all_fields());
        assert!(matches!(result, Err(FetchError::Decode(_))));
        assert!(!result.unwrap_err().is_network());
    }

    #[test]
    fn test_empty_hourly_arrays_give_empty_table() {
        let body = r#"{"hourly": {"time": [], "temperature_2m": []}}"#;
        let table = parse_forecast(body, &[ForecastField::Temperature]).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        assert_eq!(parse_datetime("2024-05-06T14:00"), Some(expected));
        assert_eq!(parse_datetime("2024-05-06T14:00:00"), Some(expected));
        assert_eq!(parse_datetime("2024-05-06 14:00"), Some(expected));
        assert_eq!(parse_datetime("2024-05-06T14:00:00-05:00"), Some(expected));
        assert_eq!(
            parse_datetime("2024-05-06"),
            NaiveDate::from_ymd_opt(2024, 5, 6).unwrap().and_hms_opt(0, 0, 0)
        );
    }

    #[test]
    fn test_parse_datetime_invalid() {
        assert!(parse_datetime("not a datetime").is_none());
        assert!(parse_datetime("2024-13-40T99:00").is_none());
        assert!(parse_timestamp(&serde_json::json!(1714953600)).is_none());
    }

    fn query_pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_request_url_contains_parameters() {
        let client = ForecastClient::new();
        let request = ForecastRequest::new(
            Location::new(41.88, -87.63),
            [ForecastField::Temperature, ForecastField::Precipitation],
            TimezoneMode::Auto,
        );
        let url = client.request_url(&request).unwrap();

        assert_eq!(url.host_str(), Some("api.open-meteo.com"));
        assert_eq!(url.path(), "/v1/forecast");
        assert_eq!(
            query_pairs(&url),
            vec![
                ("latitude".to_string(), "41.88".to_string()),
                ("longitude".to_string(), "-87.63".to_string()),
                (
                    "hourly".to_string(),
                    "temperature_2m,precipitation".to_string()
                ),
                ("timezone".to_string(), "auto".to_string()),
            ]
        );
    }

    #[test]
    fn test_request_url_encodes_timezone_name() {
        let client = ForecastClient::new();
        for name in ["Etc/GMT+5", "Odd&Zone#1"] {
            let request = ForecastRequest::new(
                Location::default(),
                [ForecastField::Temperature],
                TimezoneMode::from(name),
            );
            let url = client.request_url(&request).unwrap();
            let timezones: Vec<_> = query_pairs(&url)
                .into_iter()
                .filter(|(k, _)| k == "timezone")
                .map(|(_, v)| v)
                .collect();
            assert_eq!(timezones, vec![name.to_string()], "url: {}", url);
            assert!(url.fragment().is_none());
        }
    }

    #[test]
    fn test_with_base_url_overrides_endpoint() {
        let client = ForecastClient::new().with_base_url("http://localhost:8080/v1/forecast");
        assert_eq!(client.base_url(), "http://localhost:8080/v1/forecast");
        assert!(client
            .request_url(&ForecastRequest::default())
            .unwrap()
            .as_str()
            .starts_with("http://localhost:8080/v1/forecast?"));
    }

    #[test]
    fn test_invalid_base_url_is_request_error() {
        let client = ForecastClient::new().with_base_url("not a url");
        let result = client.request_url(&ForecastRequest::default());
        assert!(matches!(result, Err(FetchError::Request(_))));
    }

    fn local_client(server: &TestServer) -> ForecastClient {
        ForecastClient::with_timeout(Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.base_url.clone())
    }

    #[tokio::test]
    async fn test_fetch_success_builds_table() {
        let server = serve("200 OK", VALID_RESPONSE).await;
        let table = local_client(&server)
            .fetch(&ForecastRequest::default())
            .await
            .expect("fetch should succeed");

        assert_eq!(table.len(), 4);
        assert_eq!(table.timezone.as_deref(), Some("America/Chicago"));
        assert_eq!(table.rows[3].wind_speed_kph, Some(22.0));
        assert_eq!(server.connections(), 1);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_status_error() {
        let server = serve("503 Service Unavailable", r#"{"error": true}"#).await;
        let err = local_client(&server)
            .fetch(&ForecastRequest::default())
            .await
            .unwrap_err();

        match &err {
            FetchError::Status { status, url } => {
                assert_eq!(*status, 503);
                assert!(url.starts_with(&server.base_url));
            }
            other => panic!("Expected Status error, got {:?}", other),
        }
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_fetch_success_without_hourly_is_schema_error() {
        let server = serve("200 OK", r#"{"latitude": 41.88, "longitude": -87.63}"#).await;
        let result = local_client(&server)
            .fetch(&ForecastRequest::default())
            .await;

        match result {
            Err(FetchError::Schema(SchemaError::MissingKey(key))) => assert_eq!(key, "hourly"),
            other => panic!("Expected MissingKey error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_is_network_error() {
        let client = ForecastClient::with_timeout(Duration::from_secs(2))
            .unwrap()
            .with_base_url("http://127.0.0.1:1/v1/forecast");
        let result = client.fetch(&ForecastRequest::default()).await;
        let err = result.expect_err("nothing listens on port 1");
        assert!(err.is_network());
    }
}
