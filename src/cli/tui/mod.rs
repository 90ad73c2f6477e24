//! Interactive TUI for Chronos.
//!
//! Job cards with run/create/cancel controls, a detail view with run
//! history, and a popup form for new jobs.

mod app;
mod input;
mod ui;

use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event, execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::api::HttpJobApi;
use crate::config::AppConfig;
use crate::core::dashboard::Dashboard;

use app::TuiApp;

/// How often the loop wakes to apply finished background work.
const TICK: Duration = Duration::from_millis(100);

/// Run the TUI against the Chronos server named in `config`.
pub async fn run(config: &AppConfig) -> Result<()> {
    let api = HttpJobApi::new(config.api_url.as_str()).with_timeout(config.request_timeout());
    let (dashboard, events) = Dashboard::new(Arc::new(api), config.dashboard_settings());
    let mut app = TuiApp::new(dashboard, events);

    info!(api_url = %config.api_url, "Starting dashboard");

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut TuiApp,
) -> Result<()> {
    // Draw the loading state before the first fetch returns.
    terminal.draw(|frame| ui::render(frame, app))?;
    app.init();

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(TICK)? {
            let event = event::read()?;
            if let Some(action) = input::handle_event(event, app.input_mode()) {
                app.handle_action(action);
            }
        }

        app.drain_events();

        if !app.running {
            break;
        }
    }

    Ok(())
}
