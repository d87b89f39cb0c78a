//! Core data models for the forecast dashboard
//!
//! This module contains the typed forecast table produced by the Open-Meteo
//! client, the request parameters that identify a fetchable dataset, and the
//! daily aggregates derived from a table.

pub mod forecast;
pub mod summary;
#[cfg(test)]
pub(crate) mod test_server;

pub use forecast::{ForecastClient, FetchError, SchemaError, OPEN_METEO_BASE_URL};
pub use summary::{
    distribution_by_day, lookup, lookup_str, scatter_points, series, summarize_by_day,
    DailyDistribution, DailySummary, NotFoundError, ScatterPoint,
};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default location: downtown Chicago
pub const DEFAULT_LATITUDE: f64 = 41.88;
pub const DEFAULT_LONGITUDE: f64 = -87.63;

/// An hourly variable that can be requested from the forecast API
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ForecastField {
    #[serde(rename = "temperature_2m")]
    Temperature,
    #[serde(rename = "relative_humidity_2m")]
    RelativeHumidity,
    #[serde(rename = "precipitation")]
    Precipitation,
    #[serde(rename = "cloudcover")]
    CloudCover,
    #[serde(rename = "windspeed_10m")]
    WindSpeed,
    #[serde(rename = "winddirection_10m")]
    WindDirection,
}

/// Error returned when a variable name is not one of the supported fields
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown forecast variable '{0}'")]
pub struct UnknownFieldError(pub String);

impl ForecastField {
    /// Every supported field, in request order
    pub const ALL: [ForecastField; 6] = [
        ForecastField::Temperature,
        ForecastField::RelativeHumidity,
        ForecastField::Precipitation,
        ForecastField::CloudCover,
        ForecastField::WindSpeed,
        ForecastField::WindDirection,
    ];

    /// Name used by the API for the `hourly` query parameter and response keys
    pub fn api_name(&self) -> &'static str {
        match self {
            ForecastField::Temperature => "temperature_2m",
            ForecastField::RelativeHumidity => "relative_humidity_2m",
            ForecastField::Precipitation => "precipitation",
            ForecastField::CloudCover => "cloudcover",
            ForecastField::WindSpeed => "windspeed_10m",
            ForecastField::WindDirection => "winddirection_10m",
        }
    }

    /// Human-readable label including the unit, used for chart titles and axes
    pub fn label(&self) -> &'static str {
        match self {
            ForecastField::Temperature => "Temperature (°C)",
            ForecastField::RelativeHumidity => "Humidity (%)",
            ForecastField::Precipitation => "Precipitation (mm)",
            ForecastField::CloudCover => "Cloud Cover (%)",
            ForecastField::WindSpeed => "Wind Speed (km/h)",
            ForecastField::WindDirection => "Wind Direction (°)",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ForecastField::Temperature => "°C",
            ForecastField::RelativeHumidity | ForecastField::CloudCover => "%",
            ForecastField::Precipitation => "mm",
            ForecastField::WindSpeed => "km/h",
            ForecastField::WindDirection => "°",
        }
    }
}

impl fmt::Display for ForecastField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

impl FromStr for ForecastField {
    type Err = UnknownFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        ForecastField::ALL
            .into_iter()
            .find(|field| field.api_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownFieldError(s.to_string()))
    }
}

/// A geographic point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(DEFAULT_LATITUDE, DEFAULT_LONGITUDE)
    }
}

/// How the API should resolve local time for the returned timestamps
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TimezoneMode {
    /// Let the provider pick the timezone of the coordinates
    #[default]
    Auto,
    /// An IANA timezone name such as `America/Chicago`
    Named(String),
}

impl TimezoneMode {
    pub fn as_query_value(&self) -> &str {
        match self {
            TimezoneMode::Auto => "auto",
            TimezoneMode::Named(name) => name,
        }
    }
}

impl From<&str> for TimezoneMode {
    fn from(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("auto") {
            TimezoneMode::Auto
        } else {
            TimezoneMode::Named(value.to_string())
        }
    }
}

/// Parameters of one forecast fetch
///
/// The field list is kept sorted and free of duplicates so that two requests
/// asking for the same set of variables produce the same [`CacheKey`].
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub location: Location,
    fields: Vec<ForecastField>,
    pub timezone: TimezoneMode,
}

impl ForecastRequest {
    pub fn new(
        location: Location,
        fields: impl IntoIterator<Item = ForecastField>,
        timezone: TimezoneMode,
    ) -> Self {
        let mut fields: Vec<ForecastField> = fields.into_iter().collect();
        fields.sort();
        fields.dedup();
        Self {
            location,
            fields,
            timezone,
        }
    }

    /// Requested fields, sorted
    pub fn fields(&self) -> &[ForecastField] {
        &self.fields
    }

    /// Comma-separated field list for the `hourly` query parameter
    pub fn hourly_param(&self) -> String {
        self.fields
            .iter()
            .map(ForecastField::api_name)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            latitude_bits: self.location.latitude.to_bits(),
            longitude_bits: self.location.longitude.to_bits(),
            fields: self.fields.clone(),
            timezone: self.timezone.clone(),
        }
    }
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self::new(Location::default(), ForecastField::ALL, TimezoneMode::Auto)
    }
}

/// Identity of a distinct fetchable dataset: location, variables and timezone mode
///
/// Coordinates are compared by bit pattern so the key can be hashed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    latitude_bits: u64,
    longitude_bits: u64,
    fields: Vec<ForecastField>,
    timezone: TimezoneMode,
}

/// One hourly timestep of the forecast
///
/// Serializes to a flat record keyed by the API field names plus `time` and
/// `calendar_date`, which is the column layout the charts consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    #[serde(rename = "time")]
    timestamp: Option<NaiveDateTime>,
    #[serde(rename = "temperature_2m")]
    pub temperature_c: Option<f64>,
    #[serde(rename = "relative_humidity_2m")]
    pub humidity_pct: Option<f64>,
    #[serde(rename = "precipitation")]
    pub precipitation_mm: Option<f64>,
    #[serde(rename = "cloudcover")]
    pub cloud_cover_pct: Option<f64>,
    #[serde(rename = "windspeed_10m")]
    pub wind_speed_kph: Option<f64>,
    #[serde(rename = "winddirection_10m")]
    pub wind_direction_deg: Option<f64>,
    calendar_date: Option<NaiveDate>,
}

impl ForecastRow {
    /// Creates a row with no values; the calendar date follows the timestamp
    pub fn new(timestamp: Option<NaiveDateTime>) -> Self {
        Self {
            timestamp,
            temperature_c: None,
            humidity_pct: None,
            precipitation_mm: None,
            cloud_cover_pct: None,
            wind_speed_kph: None,
            wind_direction_deg: None,
            calendar_date: timestamp.map(|t| t.date()),
        }
    }

    /// Builder-style setter, mostly useful when assembling rows by hand
    pub fn with(mut self, field: ForecastField, value: Option<f64>) -> Self {
        self.set(field, value);
        self
    }

    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp
    }

    pub fn calendar_date(&self) -> Option<NaiveDate> {
        self.calendar_date
    }

    pub fn value(&self, field: ForecastField) -> Option<f64> {
        match field {
            ForecastField::Temperature => self.temperature_c,
            ForecastField::RelativeHumidity => self.humidity_pct,
            ForecastField::Precipitation => self.precipitation_mm,
            ForecastField::CloudCover => self.cloud_cover_pct,
            ForecastField::WindSpeed => self.wind_speed_kph,
            ForecastField::WindDirection => self.wind_direction_deg,
        }
    }

    pub fn set(&mut self, field: ForecastField, value: Option<f64>) {
        let slot = match field {
            ForecastField::Temperature => &mut self.temperature_c,
            ForecastField::RelativeHumidity => &mut self.humidity_pct,
            ForecastField::Precipitation => &mut self.precipitation_mm,
            ForecastField::CloudCover => &mut self.cloud_cover_pct,
            ForecastField::WindSpeed => &mut self.wind_speed_kph,
            ForecastField::WindDirection => &mut self.wind_direction_deg,
        };
        *slot = value;
    }
}

/// Hourly forecast rows in the order the provider returned them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastTable {
    /// Rows in source order (ascending time as returned, never re-sorted)
    pub rows: Vec<ForecastRow>,
    /// Fields that were requested; other row values are always `None`
    pub fields: Vec<ForecastField>,
    /// Timezone the provider resolved, e.g. `America/Chicago`
    pub timezone: Option<String>,
    /// Offset of the local timestamps from UTC
    pub utc_offset_seconds: Option<i32>,
    /// When this table was built
    pub fetched_at: DateTime<Utc>,
}

impl ForecastTable {
    pub fn new(fields: Vec<ForecastField>, rows: Vec<ForecastRow>) -> Self {
        Self {
            rows,
            fields,
            timezone: None,
            utc_offset_seconds: None,
            fetched_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Time span covered by rows with a valid timestamp
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let mut times = self.rows.iter().filter_map(ForecastRow::timestamp);
        let first = times.next()?;
        Some(times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }
}
