//! vaultdesk - browse your vaults from the terminal.
//!
//! Logs in against the vault backend, keeps the session token between runs
//! and lists the vaults the account can see. Runs as a full-screen TUI by
//! default, or in line mode with `--plain`.

mod app;
mod plain;
mod ui;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vaultdesk_core::api::ApiClient;
use vaultdesk_core::auth::open_store;
use vaultdesk_core::config::Config;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file written in TUI mode, inside the cache directory
const LOG_FILE: &str = "vaultdesk.log";

const USAGE: &str = "\
Usage: vaultdesk [--plain | --logout | --help]

  (no option)  full-screen terminal UI
  --plain      log in at the prompt and print your vaults
  --logout     forget the stored session
  --help       show this message

Environment: VAULTDESK_API_URL, VAULTDESK_TOKEN_STORAGE (file|keyring|memory),
VAULTDESK_EMAIL, VAULTDESK_PASSWORD, RUST_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Tui,
    Plain,
    Logout,
    Help,
}

fn parse_mode(args: &[String]) -> Result<Mode> {
    match args.get(1).map(String::as_str) {
        None => Ok(Mode::Tui),
        Some("--plain") => Ok(Mode::Plain),
        Some("--logout") => Ok(Mode::Logout),
        Some("--help") | Some("-h") => Ok(Mode::Help),
        Some(other) => Err(anyhow::anyhow!("Unknown option '{}'\n\n{}", other, USAGE)),
    }
}

/// Initialize the tracing subscriber.
///
/// Use RUST_LOG to control the level (e.g., RUST_LOG=debug). In TUI mode
/// logs go to a file so they do not draw over the screen; the returned
/// guard must live until exit to flush it.
fn init_tracing(mode: Mode, config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = match (mode, config.cache_dir()) {
        (Mode::Tui, Ok(dir)) => std::fs::create_dir_all(&dir).ok().map(|_| dir),
        _ => None,
    };

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

fn load_config() -> Config {
    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config, using defaults: {:#}", e);
            Config::default()
        }
    };
    config.apply_env_overrides();
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let mode = parse_mode(&args)?;
    if mode == Mode::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = load_config();
    let _log_guard = init_tracing(mode, &config);
    info!(api = %config.api_base_url, storage = %config.token_storage, ?mode, "vaultdesk starting");

    let store = open_store(&config)?;

    match mode {
        Mode::Logout => {
            plain::logout(store);
            Ok(())
        }
        Mode::Plain => {
            let api = ApiClient::from_config(&config)?;
            plain::run(config, api, store).await
        }
        Mode::Tui => {
            let api = ApiClient::from_config(&config)?;
            let config_path = Config::config_path().ok();
            run_tui(App::new(config, config_path, api, store)).await
        }
        Mode::Help => Ok(()),
    }
}

async fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        warn!(error = %e, "UI loop ended with an error");
    }

    info!("vaultdesk shutting down");
    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        // Poll with a timeout so background results are picked up promptly
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    // Ctrl+C to quit
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    if handle_input(app, key) {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }

        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }

        // Let spawned requests make progress between frames
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode(&args(&["vaultdesk"])).ok(), Some(Mode::Tui));
        assert_eq!(parse_mode(&args(&["vaultdesk", "--plain"])).ok(), Some(Mode::Plain));
        assert_eq!(parse_mode(&args(&["vaultdesk", "--logout"])).ok(), Some(Mode::Logout));
        assert_eq!(parse_mode(&args(&["vaultdesk", "-h"])).ok(), Some(Mode::Help));
        assert!(parse_mode(&args(&["vaultdesk", "--bogus"])).is_err());
    }
}
