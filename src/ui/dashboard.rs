//! Dashboard screen rendering
//!
//! Lays out the header with location and forecast span, the view tabs, the
//! active chart and a footer with key hints, status and data freshness.

use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::{daily_summary, scatter, time_series, wind_distribution};
use crate::app::{App, StatusKind, View};

/// Renders the full dashboard for the current view
///
/// # Arguments
/// * `frame` - The ratatui Frame to render to
/// * `app` - The application state holding the table and selections
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Length(3), // Tabs
            Constraint::Min(8),    // Chart
            Constraint::Length(1), // Footer
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);

    match app.view {
        View::TimeSeries => time_series::render(frame, app, chunks[2]),
        View::Scatter => scatter::render(frame, app, chunks[2]),
        View::DailySummary => daily_summary::render(frame, app, chunks[2]),
        View::WindDistribution => wind_distribution::render(frame, app, chunks[2]),
    }

    render_footer(frame, app, chunks[3]);
}

/// Coordinates as `41.88°N 87.63°W`
fn format_location(latitude: f64, longitude: f64) -> String {
    let ns = if latitude >= 0.0 { 'N' } else { 'S' };
    let ew = if longitude >= 0.0 { 'E' } else { 'W' };
    format!(
        "{:.2}°{} {:.2}°{}",
        latitude.abs(),
        ns,
        longitude.abs(),
        ew
    )
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let location = app.request().location;
    let timezone = app
        .table
        .as_deref()
        .and_then(|table| table.timezone.clone())
        .unwrap_or_else(|| app.request().timezone.as_query_value().to_string());

    let span = app
        .table
        .as_deref()
        .and_then(|table| table.time_range())
        .map(|(start, end)| {
            format!(
                "{} → {}",
                start.format("%m-%d %H:%M"),
                end.format("%m-%d %H:%M")
            )
        })
        .unwrap_or_else(|| "no data".to_string());

    let rows = app.table.as_deref().map(|table| table.len()).unwrap_or(0);

    let width = area.width as usize;
    let separator = "─".repeat(width.saturating_sub(2));

    let lines = vec![
        Line::from(vec![
            Span::styled(
                "WXDASH",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format_location(location.latitude, location.longitude),
                Style::default().fg(Color::White),
            ),
            Span::raw("  "),
            Span::styled(timezone, Style::default().fg(Color::Gray)),
            Span::raw("  "),
            Span::styled(span, Style::default().fg(Color::Yellow)),
            Span::styled(
                format!("  ({} hours)", rows),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(Span::styled(
            separator,
            Style::default().fg(Color::DarkGray),
        )),
    ];

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<String> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, view)| format!("{} {}", i + 1, view.title()))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.view.index())
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .divider("│")
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(tabs, area);
}

/// Age of the data as shown in the footer
fn freshness_text(minutes_ago: i64) -> String {
    if minutes_ago < 1 {
        " │ Data: just now".to_string()
    } else if minutes_ago < 60 {
        format!(" │ Data: {}m ago", minutes_ago)
    } else {
        format!(" │ Data: {}h ago", minutes_ago / 60)
    }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled("1-4", Style::default().fg(Color::Yellow)),
        Span::raw(" View  "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Variable  "),
        Span::styled("←/→", Style::default().fg(Color::Yellow)),
        Span::raw(" Date  "),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" Refresh  "),
        Span::styled("?", Style::default().fg(Color::Yellow)),
        Span::raw(" Help  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" Quit"),
    ];

    if let Some(last_refresh) = app.last_refresh {
        let elapsed = Local::now() - last_refresh;
        spans.push(Span::styled(
            freshness_text(elapsed.num_minutes()),
            Style::default().fg(Color::DarkGray),
        ));
    }

    if let Some(status) = &app.status {
        let color = match status.kind {
            StatusKind::Info => Color::Cyan,
            StatusKind::Success => Color::Green,
            StatusKind::Error => Color::Red,
        };
        spans.push(Span::styled(
            format!(" │ {}", status.text),
            Style::default().fg(color),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::StatusMessage;
    use crate::ui::test_support::{buffer_text, draw, loaded_app};

    #[test]
    fn test_format_location_hemispheres() {
        assert_eq!(format_location(41.88, -87.63), "41.88°N 87.63°W");
        assert_eq!(format_location(-33.87, 151.21), "33.87°S 151.21°E");
    }

    #[test]
    fn test_freshness_text() {
        assert_eq!(freshness_text(0), " │ Data: just now");
        assert_eq!(freshness_text(12), " │ Data: 12m ago");
        assert_eq!(freshness_text(125), " │ Data: 2h ago");
    }

    #[test]
    fn test_header_and_tabs_are_rendered() {
        let app = loaded_app();
        let terminal = draw(120, 30, |frame| render(frame, &app));
        let content = buffer_text(&terminal);
        assert!(content.contains("WXDASH"));
        assert!(content.contains("41.88°N 87.63°W"));
        assert!(content.contains("(72 hours)"));
        for view in View::ALL {
            assert!(content.contains(view.title()), "missing tab {}", view.title());
        }
    }

    #[test]
    fn test_each_view_renders() {
        let mut app = loaded_app();
        for view in View::ALL {
            app.view = view;
            let terminal = draw(120, 30, |frame| render(frame, &app));
            let buffer = terminal.backend().buffer();
            let has_content = buffer.content().iter().any(|cell| cell.symbol() != " ");
            assert!(has_content, "{:?} should render", view);
        }
    }

    #[test]
    fn test_footer_shows_status_message() {
        let mut app = loaded_app();
        app.status = Some(StatusMessage::info("Visualizations reloaded"));
        let terminal = draw(160, 30, |frame| render(frame, &app));
        assert!(buffer_text(&terminal).contains("Visualizations reloaded"));
    }
}
