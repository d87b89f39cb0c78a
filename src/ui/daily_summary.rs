//! Daily summary view
//!
//! Min / mean / max temperature for the selected date as a bar chart, with a
//! date strip above it for `←/→` selection.

use chrono::NaiveDate;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, DAILY_SUMMARY_FIELD};
use crate::data::DailySummary;

/// Bars are stored as tenths of a degree above the baseline
const SCALE: f64 = 10.0;

/// Lowest upper bound of the value axis
const MIN_AXIS_TOP: f64 = 30.0;

/// Scaled bar heights for a summary
///
/// `BarChart` only draws non-negative integers, so values are shifted up by
/// `baseline` (zero, or the floor of a negative minimum) before scaling.
///
/// # Returns
/// `(baseline, [min, mean, max] heights, axis top)`
fn bar_values(summary: &DailySummary) -> (f64, [u64; 3], u64) {
    let baseline = summary.min.floor().min(0.0);
    let scale = |v: f64| ((v - baseline) * SCALE).round().max(0.0) as u64;
    let top = summary.max.ceil().max(MIN_AXIS_TOP);
    (
        baseline,
        [
            scale(summary.min),
            scale(summary.mean),
            scale(summary.max),
        ],
        scale(top),
    )
}

/// One line listing every date, the selected one highlighted
fn date_strip(summaries: &[DailySummary], selected: Option<NaiveDate>) -> Line<'static> {
    let mut spans = vec![Span::styled("◀ ", Style::default().fg(Color::Yellow))];
    for summary in summaries {
        let label = summary.calendar_date.format("%a %m-%d").to_string();
        if Some(summary.calendar_date) == selected {
            spans.push(Span::styled(
                format!("[{}]", label),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(
                format!(" {} ", label),
                Style::default().fg(Color::Gray),
            ));
        }
    }
    spans.push(Span::styled(" ▶", Style::default().fg(Color::Yellow)));
    Line::from(spans)
}

/// Renders the bar summary for `app.selected_date`
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let summaries = app.daily_summaries();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Date strip
            Constraint::Min(5),    // Bars
        ])
        .split(area);

    let strip = Paragraph::new(date_strip(&summaries, app.selected_date)).block(
        Block::default()
            .title(" Date ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(strip, chunks[0]);

    let Some(summary) = app.selected_summary() else {
        let message = Paragraph::new("No daily summary for the selected date")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(message, chunks[1]);
        return;
    };

    let (baseline, heights, top) = bar_values(&summary);
    let colors = [Color::Blue, Color::Green, Color::Red];
    let values = [summary.min, summary.mean, summary.max];
    let bars: Vec<Bar> = ["Min", "Mean", "Max"]
        .into_iter()
        .zip(heights)
        .zip(values)
        .zip(colors)
        .map(|(((label, height), value), color)| {
            Bar::default()
                .label(Line::from(label))
                .value(height)
                .text_value(format!("{:.1}", value))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect();

    let mut title = format!(
        " {} on {} ({} hours) ",
        DAILY_SUMMARY_FIELD.label(),
        summary.calendar_date.format("%Y-%m-%d"),
        summary.count
    );
    if baseline < 0.0 {
        title.push_str(&format!("baseline {:.0} ", baseline));
    }

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(9)
        .bar_gap(3)
        .max(top);

    frame.render_widget(chart, chunks[1]);
}
