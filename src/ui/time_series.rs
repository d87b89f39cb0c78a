//! Time series view
//!
//! Line chart of the selected variable against time. The x axis is hours
//! since the earliest plotted timestamp; labels show the local wall-clock time.

use chrono::NaiveDateTime;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use super::padded_bounds;
use crate::app::{App, TIME_SERIES_FIELDS};
use crate::data::{series, ForecastField};

/// Earliest and latest timestamp; rows are not assumed to be in order
fn time_span(series: &[(NaiveDateTime, f64)]) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let earliest = series.iter().map(|(time, _)| *time).min()?;
    let latest = series.iter().map(|(time, _)| *time).max()?;
    Some((earliest, latest))
}

/// Converts timestamps to hours since the earliest one
fn to_points(series: &[(NaiveDateTime, f64)]) -> Vec<(f64, f64)> {
    let Some((start, _)) = time_span(series) else {
        return Vec::new();
    };
    series
        .iter()
        .map(|(time, value)| ((*time - start).num_minutes() as f64 / 60.0, *value))
        .collect()
}

/// Smallest and largest x, at least one hour apart
fn x_bounds(points: &[(f64, f64)]) -> [f64; 2] {
    let (lo, hi) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (x, _)| {
            (lo.min(*x), hi.max(*x))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    [lo, hi.max(lo + 1.0)]
}

/// Earliest, middle and latest labels for the time axis
fn time_labels(series: &[(NaiveDateTime, f64)]) -> Vec<Span<'static>> {
    let Some((first, last)) = time_span(series) else {
        return Vec::new();
    };
    let middle = first + (last - first) / 2;
    [first, middle, last]
        .iter()
        .map(|t| Span::raw(t.format("%m-%d %H:%M").to_string()))
        .collect()
}

/// Dropdown-style line listing the selectable variables
fn field_selector(selected: ForecastField) -> String {
    TIME_SERIES_FIELDS
        .iter()
        .map(|field| {
            if *field == selected {
                format!("[{}]", field.label())
            } else {
                field.label().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Renders the time series of `app.selected_field`
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let field = app.selected_field;
    let block = Block::default()
        .title(format!(" {} over time ", field.label()))
        .title_bottom(format!(" ↑/↓ {} ", field_selector(field)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let values = app
        .table
        .as_deref()
        .map(|table| series(table, field))
        .unwrap_or_default();

    if values.is_empty() {
        let message = Paragraph::new(format!("No values for {}", field.label()))
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(message, area);
        return;
    }

    let points = to_points(&values);
    let x_range = x_bounds(&points);
    let [y_min, y_max] = padded_bounds(points.iter().map(|(_, y)| *y));

    let dataset = Dataset::default()
        .name(field.label())
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .title("Time")
                .style(Style::default().fg(Color::Gray))
                .bounds(x_range)
                .labels(time_labels(&values)),
        )
        .y_axis(
            Axis::default()
                .title(field.unit())
                .style(Style::default().fg(Color::Gray))
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{:.1}", y_min)),
                    Span::styled(
                        format!("{:.1}", (y_min + y_max) / 2.0),
                        Style::default().add_modifier(Modifier::DIM),
                    ),
                    Span::raw(format!("{:.1}", y_max)),
                ]),
        );

    frame.render_widget(chart, area);
}
