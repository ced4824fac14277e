//! ReplayLab TUI — interactive bar-replay trainer.
//!
//! Load a symbol, jump to a random point in its history, reveal bars one at
//! a time, and paper-trade against the hidden future. Trades settle into a
//! persistent SQLite ledger; markers and P&L survive restarts.

mod app;
mod input;
mod persistence;
mod theme;
mod ui;

use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use replaylab_core::data::{BarProvider, CsvBarProvider, SyntheticProvider};
use replaylab_core::ledger::LedgerStore;

use crate::app::AppState;

fn main() -> Result<()> {
    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    // Paths
    let data_root = PathBuf::from("data");
    let app_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("replaylab");
    std::fs::create_dir_all(&app_dir)
        .with_context(|| format!("creating {}", app_dir.display()))?;
    let ledger_path = app_dir.join("ledger.db");
    let state_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("replaylab")
        .join("state.json");

    // CSV files under ./data/<market>/ take priority; without them the app
    // runs on deterministic synthetic series.
    let provider: Box<dyn BarProvider> = if data_root.is_dir() {
        Box::new(CsvBarProvider::new(&data_root))
    } else {
        Box::new(SyntheticProvider::new(rand::random()))
    };

    let ledger = Arc::new(
        LedgerStore::open(&ledger_path)
            .with_context(|| format!("opening ledger {}", ledger_path.display()))?,
    );

    let mut app = AppState::new(ledger, provider, state_path.clone(), rand::random())
        .context("initializing app state")?;

    // Restore the previous session's selection and chart configuration.
    let persisted = persistence::load(&state_path);
    persistence::apply(&mut app, persisted);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    // Save state before exit
    let persisted = persistence::extract(&app);
    let _ = persistence::save(&state_path, &persisted);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        if !app.running {
            break;
        }
    }
    Ok(())
}
