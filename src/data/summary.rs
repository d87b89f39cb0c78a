//! Per-day aggregates derived from a forecast table
//!
//! Everything here is a pure function of a borrowed [`ForecastTable`] and is
//! recomputed on every call. Rows without a timestamp have no calendar date
//! and never contribute to a per-day result; neither do null values.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

use super::{ForecastField, ForecastTable};

/// Min / mean / max of one field over the rows of one calendar date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    #[serde(rename = "date")]
    pub calendar_date: NaiveDate,
    pub field: ForecastField,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    /// Number of non-null samples the statistics were computed from
    pub count: usize,
}

/// Box-plot statistics of one field over the rows of one calendar date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyDistribution {
    #[serde(rename = "date")]
    pub calendar_date: NaiveDate,
    pub field: ForecastField,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Smallest sample not below `q1 - 1.5 * IQR`
    pub lower_whisker: f64,
    /// Largest sample not above `q3 + 1.5 * IQR`
    pub upper_whisker: f64,
    /// Samples outside the whiskers, ascending
    pub outliers: Vec<f64>,
    pub count: usize,
}

/// One hour plotted in the temperature / precipitation / wind scatter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub temperature_c: f64,
    pub precipitation_mm: f64,
    pub wind_speed_kph: f64,
}

/// No summary exists for the requested date
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No daily summary for '{0}'")]
pub struct NotFoundError(pub String);

/// Non-null samples of `field` grouped by calendar date, dates ascending
fn samples_by_day(table: &ForecastTable, field: ForecastField) -> BTreeMap<NaiveDate, Vec<f64>> {
    let mut groups: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for row in &table.rows {
        let (Some(date), Some(value)) = (row.calendar_date(), row.value(field)) else {
            continue;
        };
        groups.entry(date).or_default().push(value);
    }
    groups
}

/// Computes `{min, mean, max}` of `field` for every calendar date in the table
///
/// Dates come out strictly ascending. A date whose rows are all null for
/// `field` has no entry; an empty table yields an empty vector.
pub fn summarize_by_day(table: &ForecastTable, field: ForecastField) -> Vec<DailySummary> {
    samples_by_day(table, field)
        .into_iter()
        .map(|(calendar_date, values)| {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let sum: f64 = values.iter().sum();
            // Rounding can push the mean of identical samples just past them
            let mean = (sum / values.len() as f64).clamp(min, max);
            DailySummary {
                calendar_date,
                field,
                min,
                mean,
                max,
                count: values.len(),
            }
        })
        .collect()
}

/// Finds the summary for `date`
pub fn lookup(summaries: &[DailySummary], date: NaiveDate) -> Result<&DailySummary, NotFoundError> {
    summaries
        .iter()
        .find(|s| s.calendar_date == date)
        .ok_or_else(|| NotFoundError(date.to_string()))
}

/// Resolves a user-selected `YYYY-MM-DD` string back to its summary
///
/// A string that is not a date is reported the same way as a missing date.
pub fn lookup_str<'a>(
    summaries: &'a [DailySummary],
    date: &str,
) -> Result<&'a DailySummary, NotFoundError> {
    let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| NotFoundError(date.to_string()))?;
    lookup(summaries, parsed)
}

/// Box-plot statistics of `field` per calendar date, with the same grouping
/// rules as [`summarize_by_day`]
pub fn distribution_by_day(table: &ForecastTable, field: ForecastField) -> Vec<DailyDistribution> {
    samples_by_day(table, field)
        .into_iter()
        .map(|(calendar_date, mut values)| {
            values.sort_by(f64::total_cmp);
            let q1 = quantile(&values, 0.25);
            let median = quantile(&values, 0.5);
            let q3 = quantile(&values, 0.75);
            let iqr = q3 - q1;
            let low_fence = q1 - 1.5 * iqr;
            let high_fence = q3 + 1.5 * iqr;

            let inside = values.iter().copied().filter(|v| (low_fence..=high_fence).contains(v));
            let lower_whisker = inside.clone().fold(f64::INFINITY, f64::min);
            let upper_whisker = inside.fold(f64::NEG_INFINITY, f64::max);
            let outliers = values
                .iter()
                .copied()
                .filter(|v| !(low_fence..=high_fence).contains(v))
                .collect();

            DailyDistribution {
                calendar_date,
                field,
                min: values[0],
                q1,
                median,
                q3,
                max: values[values.len() - 1],
                lower_whisker,
                upper_whisker,
                outliers,
                count: values.len(),
            }
        })
        .collect()
}

/// Linear interpolation between closest ranks; `sorted` must be non-empty
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let position = p * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Rows that have temperature, precipitation and wind speed, in table order
pub fn scatter_points(table: &ForecastTable) -> Vec<ScatterPoint> {
    table
        .rows
        .iter()
        .filter_map(|row| {
            Some(ScatterPoint {
                temperature_c: row.temperature_c?,
                precipitation_mm: row.precipitation_mm?,
                wind_speed_kph: row.wind_speed_kph?,
            })
        })
        .collect()
}

/// `(timestamp, value)` pairs of `field` for the time series view
pub fn series(table: &ForecastTable, field: ForecastField) -> Vec<(NaiveDateTime, f64)> {
    table
        .rows
        .iter()
        .filter_map(|row| Some((row.timestamp()?, row.value(field)?)))
        .collect()
}
