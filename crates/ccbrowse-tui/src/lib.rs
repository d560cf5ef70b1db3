//! ccbrowse-tui - Terminal session browser using Ratatui

pub mod app;
pub mod components;
pub mod highlight;
pub mod theme;
pub mod ui;

pub use app::App;

use anyhow::{Context, Result};
use ccbrowse_core::{BrowsePreferences, SessionDataController, SessionSource};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Run the TUI application
///
/// Preferences are saved under `cache_dir` when the grouping mode changes.
pub async fn run<S: SessionSource + 'static>(
    controller: Arc<SessionDataController<S>>,
    preferences: BrowsePreferences,
    cache_dir: Option<PathBuf>,
) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(controller, preferences, cache_dir);
    app.reload();

    let result = run_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("Session browser closed");
    result
}

fn run_loop<B: Backend, S: SessionSource + 'static>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> Result<()>
where
    <B as Backend>::Error: Send + Sync + 'static,
{
    loop {
        app.poll_events();

        terminal.draw(|f| ui::render(f, app))?;

        // Short poll keeps background results flowing into the view
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
