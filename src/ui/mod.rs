//! UI rendering module for the forecast dashboard
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod daily_summary;
pub mod dashboard;
pub mod help_overlay;
pub mod scatter;
pub mod time_series;
pub mod widgets;
pub mod wind_distribution;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Style},
    text::Line,
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState};

/// Renders the UI based on the current application state
pub fn render(frame: &mut Frame, app: &App) {
    match &app.state {
        AppState::Loading => render_loading(frame),
        AppState::Dashboard => dashboard::render(frame, app),
        AppState::Failed(message) => render_failed(frame, message),
    }

    if app.show_help {
        help_overlay::render(frame);
    }
}

/// Renders a loading message while data is being fetched
fn render_loading(frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    let loading_text = Paragraph::new("Loading forecast data...")
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);

    frame.render_widget(loading_text, chunks[1]);
}

/// Renders the error of a first load that produced no data
fn render_failed(frame: &mut Frame, message: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(5),
            Constraint::Percentage(40),
        ])
        .split(frame.area());

    let lines = vec![
        Line::styled(
            "Could not load forecast data",
            Style::default().fg(Color::Red),
        ),
        Line::from(message.to_string()),
        Line::from(""),
        Line::styled(
            "Press r to retry or q to quit",
            Style::default().fg(Color::DarkGray),
        ),
    ];

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, chunks[1]);
}

/// Axis bounds around `values` with 5% headroom; a flat series gets ±1
pub(crate) fn padded_bounds(values: impl IntoIterator<Item = f64>) -> [f64; 2] {
    let (lo, hi) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    let pad = (hi - lo) * 0.05;
    if pad < f64::EPSILON {
        return [lo - 1.0, hi + 1.0];
    }
    [lo - pad, hi + pad]
}
