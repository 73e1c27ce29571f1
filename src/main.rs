mod app;
mod config;
mod error;
mod store;
mod task;
mod ui;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{fs::OpenOptions, io, sync::Mutex};
use tracing::{error, info, Level};

use crate::app::App;
use crate::config::Config;
use crate::store::TaskStore;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    init_logging(&config)?;

    let store = TaskStore::new(config.db_path.clone())?;
    let mut app = App::new(store, config)?;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        error!(%err, "exiting on unhandled error");
        return Err(err.into());
    }
    info!("bye");
    Ok(())
}

/// The TUI owns stdout, so events go to the log file.
fn init_logging(config: &Config) -> io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();
    Ok(())
}
