//! Box plot widget drawing one vertical box per calendar day

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::data::DailyDistribution;

/// Columns reserved on the left for the value axis labels
const GUTTER: u16 = 7;

/// Columns taken by one day
const SLOT: u16 = 7;

/// A box-and-whisker plot with one box per day
pub struct BoxPlot<'a> {
    /// Per-day statistics, drawn left to right
    distributions: &'a [DailyDistribution],
    box_style: Style,
    whisker_style: Style,
    median_style: Style,
    outlier_style: Style,
    label_style: Style,
}

impl<'a> BoxPlot<'a> {
    pub fn new(distributions: &'a [DailyDistribution]) -> Self {
        Self {
            distributions,
            box_style: Style::default().fg(Color::Cyan),
            whisker_style: Style::default().fg(Color::Gray),
            median_style: Style::default().fg(Color::Yellow),
            outlier_style: Style::default().fg(Color::Red),
            label_style: Style::default().fg(Color::DarkGray),
        }
    }

    pub fn box_style(mut self, style: Style) -> Self {
        self.box_style = style;
        self
    }

    /// Number of days that fit in `width` columns
    pub fn visible_days(width: u16) -> usize {
        (width.saturating_sub(GUTTER) / SLOT) as usize
    }

    /// Lowest and highest value drawn: whiskers and outliers of every day
    fn value_range(&self) -> Option<(f64, f64)> {
        let (lo, hi) = self
            .distributions
            .iter()
            .flat_map(|d| {
                [d.lower_whisker, d.upper_whisker]
                    .into_iter()
                    .chain(d.outliers.iter().copied())
            })
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });

        if !lo.is_finite() || !hi.is_finite() {
            return None;
        }
        if hi - lo < f64::EPSILON {
            // Flat data still needs a non-zero span to map onto rows
            return Some((lo - 0.5, hi + 0.5));
        }
        Some((lo, hi))
    }

    /// Row offset from the top of a `height`-row plot for `value`
    fn row_for(value: f64, lo: f64, hi: f64, height: u16) -> u16 {
        if height <= 1 {
            return 0;
        }
        let span = height - 1;
        let normalized = ((value - lo) / (hi - lo)).clamp(0.0, 1.0);
        let from_bottom = (normalized * span as f64).round() as u16;
        span - from_bottom.min(span)
    }
}

fn set_char(buf: &mut Buffer, x: u16, y: u16, ch: char, style: Style) {
    if let Some(cell) = buf.cell_mut((x, y)) {
        cell.set_char(ch).set_style(style);
    }
}

impl<'a> Widget for BoxPlot<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Need the axis gutter, one slot and a label row under at least two plot rows
        if area.width < GUTTER + SLOT || area.height < 3 {
            return;
        }
        let Some((lo, hi)) = self.value_range() else {
            return;
        };

        let plot_height = area.height - 1;
        let label_y = area.y + plot_height;

        buf.set_string(area.x, area.y, format!("{:>6.1}", hi), self.label_style);
        buf.set_string(
            area.x,
            area.y + plot_height - 1,
            format!("{:>6.1}", lo),
            self.label_style,
        );

        let row = |value: f64| area.y + Self::row_for(value, lo, hi, plot_height);

        for (i, dist) in self
            .distributions
            .iter()
            .take(Self::visible_days(area.width))
            .enumerate()
        {
            let slot_x = area.x + GUTTER + i as u16 * SLOT;
            let cx = slot_x + SLOT / 2;

            let top = row(dist.upper_whisker);
            let q3 = row(dist.q3);
            let median = row(dist.median);
            let q1 = row(dist.q1);
            let bottom = row(dist.lower_whisker);

            // Whiskers can sit inside the box when most samples are equal
            for y in top.min(q3)..=bottom.max(q1) {
                if (q3..=q1).contains(&y) {
                    for x in cx - 1..=cx + 1 {
                        set_char(buf, x, y, '▒', self.box_style);
                    }
                } else {
                    set_char(buf, cx, y, '│', self.whisker_style);
                }
            }
            if top < q3 {
                set_char(buf, cx, top, '┬', self.whisker_style);
            }
            if bottom > q1 {
                set_char(buf, cx, bottom, '┴', self.whisker_style);
            }
            for x in cx - 1..=cx + 1 {
                set_char(buf, x, median, '━', self.median_style);
            }
            for outlier in &dist.outliers {
                set_char(buf, cx, row(*outlier), '•', self.outlier_style);
            }

            let label = dist.calendar_date.format("%m-%d").to_string();
            buf.set_string(slot_x + 1, label_y, label, self.label_style);
        }
    }
}
