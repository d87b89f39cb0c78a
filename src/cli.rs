//! Command-line interface parsing for the forecast dashboard
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into a validated [`StartupConfig`].

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::data::{
    ForecastField, ForecastRequest, Location, TimezoneMode, DEFAULT_LATITUDE, DEFAULT_LONGITUDE,
    OPEN_METEO_BASE_URL,
};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified variable name is not recognized
    #[error("Invalid variable: '{0}'. Valid variables: temperature_2m, relative_humidity_2m, precipitation, cloudcover, windspeed_10m, winddirection_10m")]
    InvalidVariable(String),

    /// Latitude or longitude outside the valid range
    #[error("Invalid coordinate: {name} = {value} (must be within ±{limit})")]
    InvalidCoordinate {
        name: &'static str,
        value: f64,
        limit: f64,
    },

    #[error("Timeout must be at least one second")]
    InvalidTimeout,
}

/// Hourly weather dashboard for a single location
#[derive(Parser, Debug)]
#[command(name = "wxdash")]
#[command(about = "Hourly forecast dashboard with daily summaries and wind distribution")]
#[command(version)]
pub struct Cli {
    /// Latitude of the forecast point
    #[arg(long, default_value_t = DEFAULT_LATITUDE, allow_negative_numbers = true)]
    pub latitude: f64,

    /// Longitude of the forecast point
    #[arg(long, default_value_t = DEFAULT_LONGITUDE, allow_negative_numbers = true)]
    pub longitude: f64,

    /// Timezone for the returned timestamps ("auto" or an IANA name)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Variable shown first in the time series (and used by --summary)
    ///
    /// Valid variables: temperature_2m, relative_humidity_2m, precipitation,
    /// cloudcover, windspeed_10m, winddirection_10m
    #[arg(long, value_name = "NAME")]
    pub variable: Option<String>,

    /// Forecast endpoint
    #[arg(long, value_name = "URL", default_value = OPEN_METEO_BASE_URL)]
    pub api_url: String,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Write logs here instead of the default cache directory
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Print daily min/mean/max of the variable as JSON and exit
    #[arg(long)]
    pub summary: bool,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// What to fetch
    pub request: ForecastRequest,
    /// Variable selected when the dashboard opens
    pub initial_field: ForecastField,
    /// Forecast endpoint
    pub api_url: String,
    /// HTTP timeout
    pub timeout: Duration,
    /// Log file override
    pub log_file: Option<PathBuf>,
    /// Print summaries instead of starting the TUI
    pub summary_only: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            request: ForecastRequest::default(),
            initial_field: ForecastField::Temperature,
            api_url: OPEN_METEO_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            log_file: None,
            summary_only: false,
        }
    }
}

/// Parses a variable name argument into a ForecastField.
///
/// # Arguments
/// * `s` - The variable name from CLI, e.g. `windspeed_10m`
///
/// # Returns
/// * `Ok(ForecastField)` if the string matches a supported variable
/// * `Err(CliError::InvalidVariable)` if it doesn't
pub fn parse_variable_arg(s: &str) -> Result<ForecastField, CliError> {
    s.parse::<ForecastField>()
        .map_err(|_| CliError::InvalidVariable(s.to_string()))
}

fn check_coordinate(name: &'static str, value: f64, limit: f64) -> Result<f64, CliError> {
    if value.is_finite() && value.abs() <= limit {
        Ok(value)
    } else {
        Err(CliError::InvalidCoordinate { name, value, limit })
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// All six variables are always requested; `--variable` only picks which
    /// one is shown first.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if a value is out of range or unknown
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let latitude = check_coordinate("latitude", cli.latitude, 90.0)?;
        let longitude = check_coordinate("longitude", cli.longitude, 180.0)?;

        let initial_field = match &cli.variable {
            Some(name) => parse_variable_arg(name)?,
            None => ForecastField::Temperature,
        };

        if cli.timeout_secs == 0 {
            return Err(CliError::InvalidTimeout);
        }

        Ok(StartupConfig {
            request: ForecastRequest::new(
                Location::new(latitude, longitude),
                ForecastField::ALL,
                TimezoneMode::from(cli.timezone.as_str()),
            ),
            initial_field,
            api_url: cli.api_url.clone(),
            timeout: Duration::from_secs(cli.timeout_secs),
            log_file: cli.log_file.clone(),
            summary_only: cli.summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variable_arg_known_names() {
        assert_eq!(
            parse_variable_arg("temperature_2m").unwrap(),
            ForecastField::Temperature
        );
        assert_eq!(
            parse_variable_arg("windspeed_10m").unwrap(),
            ForecastField::WindSpeed
        );
        assert_eq!(parse_variable_arg("cloudcover").unwrap(), ForecastField::CloudCover);
    }

    #[test]
    fn test_parse_variable_arg_invalid() {
        let err = parse_variable_arg("dewpoint").unwrap_err();
        assert!(err.to_string().contains("Invalid variable"));
        assert!(err.to_string().contains("dewpoint"));
    }

    #[test]
    fn test_cli_parse_no_args_uses_defaults() {
        let cli = Cli::parse_from(["wxdash"]);
        assert_eq!(cli.latitude, DEFAULT_LATITUDE);
        assert_eq!(cli.longitude, DEFAULT_LONGITUDE);
        assert_eq!(cli.timezone, "auto");
        assert!(cli.variable.is_none());
        assert!(!cli.summary);
    }

    #[test]
    fn test_cli_parse_negative_longitude() {
        let cli = Cli::parse_from(["wxdash", "--latitude", "49.28", "--longitude", "-123.12"]);
        assert_eq!(cli.latitude, 49.28);
        assert_eq!(cli.longitude, -123.12);
    }

    #[test]
    fn test_startup_config_from_cli_defaults() {
        let cli = Cli::parse_from(["wxdash"]);
        let config = StartupConfig::from_cli(&cli).unwrap();

        assert_eq!(config.request, ForecastRequest::default());
        assert_eq!(config.initial_field, ForecastField::Temperature);
        assert_eq!(config.api_url, OPEN_METEO_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.summary_only);
    }

    #[test]
    fn test_startup_config_from_cli_with_variable_and_summary() {
        let cli = Cli::parse_from(["wxdash", "--variable", "precipitation", "--summary"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.initial_field, ForecastField::Precipitation);
        assert!(config.summary_only);
        // The variable does not narrow what is fetched
        assert_eq!(config.request.fields(), &ForecastField::ALL);
    }

    #[test]
    fn test_startup_config_named_timezone() {
        let cli = Cli::parse_from(["wxdash", "--timezone", "America/Chicago"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(
            config.request.timezone,
            TimezoneMode::Named("America/Chicago".to_string())
        );
    }

    #[test]
    fn test_startup_config_from_cli_invalid_variable() {
        let cli = Cli::parse_from(["wxdash", "--variable", "invalid"]);
        assert!(matches!(
            StartupConfig::from_cli(&cli),
            Err(CliError::InvalidVariable(_))
        ));
    }

    #[test]
    fn test_startup_config_rejects_out_of_range_coordinates() {
        let cli = Cli::parse_from(["wxdash", "--latitude", "91"]);
        assert!(matches!(
            StartupConfig::from_cli(&cli),
            Err(CliError::InvalidCoordinate { name: "latitude", .. })
        ));

        let cli = Cli::parse_from(["wxdash", "--longitude", "-181"]);
        assert!(StartupConfig::from_cli(&cli).is_err());
    }

    #[test]
    fn test_startup_config_rejects_zero_timeout() {
        let cli = Cli::parse_from(["wxdash", "--timeout-secs", "0"]);
        assert!(matches!(
            StartupConfig::from_cli(&cli),
            Err(CliError::InvalidTimeout)
        ));
    }
}
