//! inactive-user-manager binary entry point.
//!
//! Parses the connection settings, initializes logging and the terminal in
//! raw mode, runs the TUI event loop on a current-thread runtime, and
//! restores the terminal state on exit.

use anyhow::Result;
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

use inactive_user_manager::api::HttpDirectoryClient;
use inactive_user_manager::app;

#[derive(Parser, Debug)]
#[command(version, about = "Review inactive user accounts on a remote server and bulk-disable them")]
struct Args {
    /// Base URL of the server, e.g. https://play.example.org
    #[arg(long, env = "IUM_SERVER_URL")]
    server: String,

    /// Account used for basic auth (the session is assumed pre-provisioned)
    #[arg(long, env = "IUM_USERNAME")]
    username: String,

    #[arg(long, env = "IUM_PASSWORD", hide_env_values = true)]
    password: String,

    /// Log file path; the TUI owns stdout, so logs go to a file
    #[arg(long, default_value = "inactive-user-manager.log")]
    log_file: String,
}

fn init_tracing(path: &str) -> Result<()> {
    let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_file)?;

    let client = HttpDirectoryClient::new(&args.server, &args.username, &args.password)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut terminal = init_terminal()?;
    let res = runtime.block_on(app::run(&mut terminal, &client));

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        eprintln!("application error: {err}");
    }
    Ok(())
}
