mod app;
mod config;
mod domain;
mod error;
mod input;
mod notifications;
mod persistence;
mod sprint;
mod ticker;
mod ui;

use anyhow::{Context, Result};
use app::{now_ms, AppState, DEFAULT_MINUTES};
use clap::{Parser, Subcommand};
use config::{init_logging, parse_latest, AppConfig, LogTarget};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use persistence::{init_local_data_dir, FileStorage};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use ticker::{poll_duration, CoarseTicker};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "calmsprint")]
#[command(about = "A calm, terminal-based sprint runner with live countdowns and finish-time projection", long_about = None)]
struct Cli {
    /// Data directory (defaults to the nearest .calmsprint, then ~/.calmsprint)
    #[arg(long, global = true, env = "CALMSPRINT_DIR")]
    dir: Option<PathBuf>,

    /// Latest finish time for this run, as HH:MM
    #[arg(long, global = true, value_parser = parse_latest)]
    latest: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .calmsprint directory in the current directory
    Init,
    /// Print the current sprint and its projected finish
    Status,
    /// Add a task without opening the TUI
    Add {
        title: String,
        /// Estimate in minutes
        #[arg(short, long, default_value_t = DEFAULT_MINUTES)]
        minutes: u32,
        /// Park the task for later instead of adding it to the sprint
        #[arg(long)]
        later: bool,
        /// Add as a subtask of this task id
        #[arg(long)]
        parent: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => {
            init_logging(LogTarget::Stderr)?;
            let cwd = std::env::current_dir().context("Could not determine current directory")?;
            let data_dir = init_local_data_dir(&cwd)?;
            println!("Initialized calmsprint directory: {}", data_dir.display());
            println!();
            println!("calmsprint will now use this local directory for its state.");
            println!("Run 'calmsprint' to plan and run a sprint.");
            Ok(())
        }
        Some(Commands::Status) => {
            init_logging(LogTarget::Stderr)?;
            let config = AppConfig::resolve(cli.dir.as_deref(), cli.latest)?;
            let app = AppState::load(Box::new(FileStorage::new(&config.data_dir)), config.latest_override);
            for line in app.status_lines(now_ms()) {
                println!("{}", line);
            }
            Ok(())
        }
        Some(Commands::Add {
            title,
            minutes,
            later,
            parent,
        }) => {
            init_logging(LogTarget::Stderr)?;
            let config = AppConfig::resolve(cli.dir.as_deref(), cli.latest)?;
            config.ensure_data_dir()?;
            let mut app = AppState::load(Box::new(FileStorage::new(&config.data_dir)), config.latest_override);

            let id = app
                .add_from_cli(title, f64::from(minutes), later, parent.as_deref(), now_ms())
                .context("Parent task not found, or it cannot hold subtasks")?;
            app.flush().context("Failed to save state")?;
            println!("Added {}", id);
            Ok(())
        }
        None => run_tui(cli.dir, cli.latest),
    }
}

fn run_tui(dir: Option<PathBuf>, latest: Option<u32>) -> Result<()> {
    let config = AppConfig::resolve(dir.as_deref(), latest)?;
    config.ensure_data_dir()?;
    let _log_guard = init_logging(LogTarget::File(config.data_dir.clone()))?;

    eprintln!("Using calmsprint directory: {}", config.data_dir.display());
    info!(dir = %config.data_dir.display(), "starting");

    let mut app = AppState::load(Box::new(FileStorage::new(&config.data_dir)), config.latest_override);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Save on exit
    if let Err(e) = app.flush() {
        error!(error = %e, "final save failed");
        eprintln!("Error saving state: {}", e);
    }

    if let Err(err) = result {
        eprintln!("Error: {}", err);
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut AppState) -> Result<()> {
    let mut ticker = CoarseTicker::default();

    loop {
        let now = now_ms();
        if ticker.due(now) {
            app.tick(now);
        }

        terminal.draw(|f| ui::render(f, app, now))?;

        if event::poll(poll_duration())? {
            if let Event::Key(key) = event::read()? {
                // Only process key press events (ignore key release)
                if key.kind == KeyEventKind::Press && input::handle_key(app, key, now_ms()) {
                    return Ok(());
                }
            }
        }

        app.persist_if_due(now_ms());
    }
}
