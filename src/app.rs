//! Application state management for the forecast dashboard
//!
//! This module contains the main application state, handling keyboard input,
//! data loading through the fetch cache, and the view selection that drives
//! each chart. Widget state (selected variable, selected date) is plain data
//! here and is passed explicitly to the pure aggregation functions.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent};
use log::{error, info};

use crate::cache::ForecastCache;
use crate::cli::StartupConfig;
use crate::data::{
    lookup, summarize_by_day, DailySummary, FetchError, ForecastClient, ForecastField,
    ForecastRequest, ForecastTable,
};

/// Variables offered by the time series dropdown
pub const TIME_SERIES_FIELDS: [ForecastField; 4] = [
    ForecastField::Temperature,
    ForecastField::RelativeHumidity,
    ForecastField::Precipitation,
    ForecastField::CloudCover,
];

/// Field summarized per day in the bar chart view
pub const DAILY_SUMMARY_FIELD: ForecastField = ForecastField::Temperature;

/// Field whose daily distribution is shown in the box plot view
pub const DISTRIBUTION_FIELD: ForecastField = ForecastField::WindSpeed;

/// Application state enum representing what the screen shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Initial loading state while fetching data
    Loading,
    /// Data is available and the dashboard is shown
    Dashboard,
    /// The first load failed and there is nothing to show
    Failed(String),
}

/// The four chart views of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    TimeSeries,
    Scatter,
    DailySummary,
    WindDistribution,
}

impl View {
    pub const ALL: [View; 4] = [
        View::TimeSeries,
        View::Scatter,
        View::DailySummary,
        View::WindDistribution,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            View::TimeSeries => "Time Series",
            View::Scatter => "Temp / Precip / Wind",
            View::DailySummary => "Daily Summary",
            View::WindDistribution => "Wind Distribution",
        }
    }

    pub fn index(&self) -> usize {
        View::ALL.iter().position(|v| v == self).unwrap_or(0)
    }

    pub fn next(&self) -> View {
        View::ALL[(self.index() + 1) % View::ALL.len()]
    }

    pub fn previous(&self) -> View {
        View::ALL[(self.index() + View::ALL.len() - 1) % View::ALL.len()]
    }
}

/// Severity of a status line message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// One-line message shown in the footer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state
    pub state: AppState,
    /// Chart currently displayed
    pub view: View,
    /// Variable plotted in the time series view
    pub selected_field: ForecastField,
    /// Date shown in the daily summary view
    pub selected_date: Option<NaiveDate>,
    /// Last successfully fetched table; kept when a refresh fails
    pub table: Option<Arc<ForecastTable>>,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag indicating a data refresh has been requested
    pub refresh_requested: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Footer message
    pub status: Option<StatusMessage>,
    /// Timestamp of last successful data load
    pub last_refresh: Option<DateTime<Local>>,
    /// What to fetch
    request: ForecastRequest,
    /// Forecast API client
    client: ForecastClient,
    /// Memo of fetched tables
    cache: ForecastCache,
}

impl App {
    /// Creates a new App from the startup configuration
    pub fn new(config: &StartupConfig) -> Result<Self, FetchError> {
        let client =
            ForecastClient::with_timeout(config.timeout)?.with_base_url(config.api_url.clone());
        let mut app = Self::with_client(client, config.request.clone());
        app.selected_field = config.initial_field;
        Ok(app)
    }

    /// Creates a new App with a custom client
    pub fn with_client(client: ForecastClient, request: ForecastRequest) -> Self {
        Self {
            state: AppState::Loading,
            view: View::TimeSeries,
            selected_field: ForecastField::Temperature,
            selected_date: None,
            table: None,
            should_quit: false,
            refresh_requested: false,
            show_help: false,
            status: None,
            last_refresh: None,
            request,
            client,
            cache: ForecastCache::new(),
        }
    }

    pub fn request(&self) -> &ForecastRequest {
        &self.request
    }

    pub fn cache(&self) -> &ForecastCache {
        &self.cache
    }

    /// Loads the forecast through the cache
    ///
    /// On failure the previously loaded table stays on screen and the error is
    /// shown in the status line; with no previous table the app moves to
    /// [`AppState::Failed`].
    pub async fn load_data(&mut self) -> Result<(), FetchError> {
        match self.cache.fetch(&self.client, &self.request).await {
            Ok(table) => {
                self.set_table(table);
                Ok(())
            }
            Err(e) => {
                error!("Forecast fetch failed: {}", e);
                if self.table.is_some() {
                    self.status = Some(StatusMessage::error(format!(
                        "Refresh failed, showing previous data: {}",
                        e
                    )));
                } else {
                    self.state = AppState::Failed(e.to_string());
                }
                Err(e)
            }
        }
    }

    /// Clears the fetch cache and loads fresh data from the API
    pub async fn refresh_data(&mut self) -> Result<(), FetchError> {
        self.cache.invalidate();
        self.load_data().await?;
        self.status = Some(StatusMessage::success("Weather data refreshed from API"));
        Ok(())
    }

    /// Installs a newly fetched table and re-validates the date selection
    pub fn set_table(&mut self, table: Arc<ForecastTable>) {
        info!("Showing forecast with {} rows", table.len());
        self.table = Some(table);
        self.state = AppState::Dashboard;
        self.last_refresh = Some(Local::now());

        let summaries = self.daily_summaries();
        let still_present = self
            .selected_date
            .is_some_and(|date| lookup(&summaries, date).is_ok());
        if !still_present {
            self.selected_date = summaries.first().map(|s| s.calendar_date);
        }
    }

    /// Daily temperature summaries of the current table, recomputed per call
    pub fn daily_summaries(&self) -> Vec<DailySummary> {
        self.table
            .as_deref()
            .map(|table| summarize_by_day(table, DAILY_SUMMARY_FIELD))
            .unwrap_or_default()
    }

    /// Summary row for the selected date
    pub fn selected_summary(&self) -> Option<DailySummary> {
        let summaries = self.daily_summaries();
        let date = self.selected_date?;
        lookup(&summaries, date).ok().cloned()
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q` or `Esc`: Quit the application
    /// - `1`-`4`, `Tab`, `Shift+Tab`: Switch view
    /// - `Up`/`k`, `Down`/`j`: Cycle the time series variable
    /// - `Left`/`h`, `Right`/`l`: Move the selected date
    /// - `r`: Refresh data from the API
    /// - `p`: Refresh plots
    /// - `?`: Toggle help
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Help overlay intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {}
            }
            return;
        }

        match self.state {
            AppState::Loading => {
                if key_event.code == KeyCode::Char('q') {
                    self.should_quit = true;
                }
            }
            AppState::Failed(_) => match key_event.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                }
                KeyCode::Char('r') => {
                    self.refresh_requested = true;
                }
                _ => {}
            },
            AppState::Dashboard => match key_event.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                }
                KeyCode::Char('1') => self.view = View::TimeSeries,
                KeyCode::Char('2') => self.view = View::Scatter,
                KeyCode::Char('3') => self.view = View::DailySummary,
                KeyCode::Char('4') => self.view = View::WindDistribution,
                KeyCode::Tab => self.view = self.view.next(),
                KeyCode::BackTab => self.view = self.view.previous(),
                KeyCode::Up | KeyCode::Char('k') => {
                    if self.view == View::TimeSeries {
                        self.cycle_field(-1);
                    }
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if self.view == View::TimeSeries {
                        self.cycle_field(1);
                    }
                }
                KeyCode::Left | KeyCode::Char('h') => {
                    if self.view == View::DailySummary {
                        self.move_date(-1);
                    }
                }
                KeyCode::Right | KeyCode::Char('l') => {
                    if self.view == View::DailySummary {
                        self.move_date(1);
                    }
                }
                KeyCode::Char('r') => {
                    self.refresh_requested = true;
                }
                KeyCode::Char('p') => {
                    self.status = Some(StatusMessage::info("Visualizations reloaded"));
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
        }
    }

    /// Moves the time series variable through the dropdown options, wrapping
    fn cycle_field(&mut self, step: isize) {
        let len = TIME_SERIES_FIELDS.len() as isize;
        let current = TIME_SERIES_FIELDS
            .iter()
            .position(|f| *f == self.selected_field)
            .map(|i| i as isize)
            // A field outside the dropdown (from --variable) starts before the first option
            .unwrap_or(if step > 0 { -1 } else { 0 });
        let next = (current + step).rem_euclid(len) as usize;
        self.selected_field = TIME_SERIES_FIELDS[next];
    }

    /// Moves the selected date to a neighbouring summary, clamped at the ends
    fn move_date(&mut self, step: isize) {
        let summaries = self.daily_summaries();
        if summaries.is_empty() {
            self.selected_date = None;
            return;
        }
        let current = self
            .selected_date
            .and_then(|date| summaries.iter().position(|s| s.calendar_date == date))
            .unwrap_or(0) as isize;
        let last = summaries.len() as isize - 1;
        let next = (current + step).clamp(0, last) as usize;
        self.selected_date = Some(summaries[next].calendar_date);
    }
}
