//! Custom widgets that ratatui does not ship

pub mod box_plot;

pub use box_plot::BoxPlot;
