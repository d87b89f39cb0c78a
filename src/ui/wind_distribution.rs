//! Wind distribution view: one box plot of hourly wind speed per day

use log::debug;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::widgets::BoxPlot;
use crate::app::{App, DISTRIBUTION_FIELD};
use crate::data::distribution_by_day;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" Daily {} distribution ", DISTRIBUTION_FIELD.label()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let distributions = app
        .table
        .as_deref()
        .map(|table| distribution_by_day(table, DISTRIBUTION_FIELD))
        .unwrap_or_default();

    if distributions.is_empty() {
        let message = Paragraph::new(format!("No values for {}", DISTRIBUTION_FIELD.label()))
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(message, area);
        return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let shown = BoxPlot::visible_days(inner.width);
    if shown < distributions.len() {
        debug!(
            "Box plot shows {} of {} days at width {}",
            shown,
            distributions.len(),
            inner.width
        );
    }

    frame.render_widget(
        BoxPlot::new(&distributions).box_style(Style::default().fg(Color::LightBlue)),
        inner,
    );
}
