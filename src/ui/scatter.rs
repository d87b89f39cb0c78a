//! Temperature / precipitation / wind view
//!
//! Each hour is a point at (temperature, precipitation). Wind speed, the third
//! dimension, picks the point's colour: calm, moderate or windy by tertile of
//! the hours on screen.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use super::padded_bounds;
use crate::app::App;
use crate::data::{scatter_points, ScatterPoint};

const BUCKET_COLORS: [Color; 3] = [Color::Blue, Color::Yellow, Color::Red];

/// Wind speeds splitting the points into three roughly equal groups
fn wind_thresholds(points: &[ScatterPoint]) -> Option<(f64, f64)> {
    let mut speeds: Vec<f64> = points.iter().map(|p| p.wind_speed_kph).collect();
    if speeds.is_empty() {
        return None;
    }
    speeds.sort_by(f64::total_cmp);
    let at = |fraction: f64| speeds[((speeds.len() - 1) as f64 * fraction).round() as usize];
    Some((at(1.0 / 3.0), at(2.0 / 3.0)))
}

/// Colour group of one wind speed: 0 calm, 1 moderate, 2 windy
fn wind_bucket(speed: f64, (calm_max, moderate_max): (f64, f64)) -> usize {
    if speed <= calm_max {
        0
    } else if speed <= moderate_max {
        1
    } else {
        2
    }
}

fn bucket_names((calm_max, moderate_max): (f64, f64)) -> [String; 3] {
    [
        format!("Wind ≤ {:.0} km/h", calm_max),
        format!("Wind ≤ {:.0} km/h", moderate_max),
        format!("Wind > {:.0} km/h", moderate_max),
    ]
}

/// Renders the scatter of every hour with all three values present
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Temperature vs Precipitation (colour: wind speed) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let points = app
        .table
        .as_deref()
        .map(scatter_points)
        .unwrap_or_default();

    let Some(thresholds) = wind_thresholds(&points) else {
        let message = Paragraph::new("No hours with temperature, precipitation and wind")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(message, area);
        return;
    };

    let mut buckets: [Vec<(f64, f64)>; 3] = Default::default();
    for point in &points {
        buckets[wind_bucket(point.wind_speed_kph, thresholds)]
            .push((point.temperature_c, point.precipitation_mm));
    }

    let names = bucket_names(thresholds);
    let datasets: Vec<Dataset> = buckets
        .iter()
        .zip(names)
        .zip(BUCKET_COLORS)
        .filter(|((data, _), _)| !data.is_empty())
        .map(|((data, name), color)| {
            Dataset::default()
                .name(name)
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(color))
                .data(data)
        })
        .collect();

    let [x_min, x_max] = padded_bounds(points.iter().map(|p| p.temperature_c));
    let [y_min, y_max] = padded_bounds(points.iter().map(|p| p.precipitation_mm));
    let y_min = y_min.max(0.0);

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("Temperature (°C)")
                .style(Style::default().fg(Color::Gray))
                .bounds([x_min, x_max])
                .labels(vec![
                    Span::raw(format!("{:.1}", x_min)),
                    Span::raw(format!("{:.1}", x_max)),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("Precipitation (mm)")
                .style(Style::default().fg(Color::Gray))
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{:.1}", y_min)),
                    Span::raw(format!("{:.1}", y_max)),
                ]),
        );

    frame.render_widget(chart, area);
}
