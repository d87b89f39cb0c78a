//! wxdash - Hourly forecast dashboard in the terminal
//!
//! Fetches hourly Open-Meteo forecasts for one location and shows a time
//! series, a temperature/precipitation/wind scatter, daily min/mean/max bars
//! and a per-day wind speed box plot.

use std::error::Error;
use std::io::{self, Stdout};
use std::panic;
use std::process;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use ratatui::{backend::CrosstermBackend, Terminal};

use wxdash::app::{App, StatusMessage};
use wxdash::cache::ForecastCache;
use wxdash::cli::{Cli, StartupConfig};
use wxdash::data::{summarize_by_day, ForecastClient};
use wxdash::logging;
use wxdash::ui;

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Fetches once and prints the daily summaries of the selected variable as JSON
async fn print_summary(config: &StartupConfig) -> Result<(), Box<dyn Error>> {
    if let Err(e) = logging::init_stderr() {
        eprintln!("warning: {}", e);
    }

    let client =
        ForecastClient::with_timeout(config.timeout)?.with_base_url(config.api_url.clone());
    let cache = ForecastCache::new();
    let table = cache.fetch(&client, &config.request).await?;

    let summaries = summarize_by_day(&table, config.initial_field);
    info!(
        "Summarized {} rows into {} days",
        table.len(),
        summaries.len()
    );
    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}

/// Event loop: draw, poll keys, run requested refreshes
async fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> io::Result<()> {
    // Initial render to show loading state
    terminal.draw(|f| ui::render(f, app))?;

    if app.load_data().await.is_err() {
        info!("Starting without data; waiting for a retry");
    }

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.refresh_requested {
            app.refresh_requested = false;
            app.status = Some(StatusMessage::info("Refreshing forecast..."));
            terminal.draw(|f| ui::render(f, app))?;
            if let Err(e) = app.refresh_data().await {
                warn!("Refresh failed: {}", e);
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

async fn run_dashboard(config: &StartupConfig) -> Result<(), Box<dyn Error>> {
    // Logging is optional; the dashboard still runs without a log file
    match logging::init_file(config.log_file.as_deref()) {
        Ok(path) => info!("Logging to {}", path.display()),
        Err(e) => eprintln!("warning: logging disabled: {}", e),
    }

    let mut app = App::new(config)?;

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    };

    if config.summary_only {
        print_summary(&config).await
    } else {
        run_dashboard(&config).await
    }
}
