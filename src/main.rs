//! Vigil - Alert Console
//!
//! A terminal console that keeps an alerting hub's unacknowledged
//! alert list fresh: periodic polling with backoff, live WebSocket
//! pushes, and in-place acknowledgement.
//!
//! ## Usage
//!
//! ```bash
//! # Start the console against the configured hub
//! vigil
//!
//! # Point at a different hub
//! vigil --server-url http://hub.internal:8000
//!
//! # With verbose logging
//! vigil -v
//!
//! # With a specific config file
//! vigil --config /path/to/config.yaml
//! ```

use std::io::Write;
use std::panic;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use vigil_core::{LogGuard, VigilConfig, init_logging};
use vigil_tui::App;

/// Vigil Alert Console
///
/// A terminal interface for watching an alerting hub's unacknowledged
/// alerts, with automatic refresh, live updates, and acknowledgement.
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory for log files (defaults to ~/.vigil/logs/)
    #[arg(long)]
    log_dir: Option<std::path::PathBuf>,

    /// Configuration file (defaults to ~/.vigil/config.yaml)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Override the hub base URL from the config
    #[arg(long)]
    server_url: Option<String>,

    /// Override the poll interval in seconds
    #[arg(long)]
    interval: Option<u64>,

    /// Disable the live update socket
    #[arg(long)]
    no_socket: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::from(1);
        }
    };

    // Restore the terminal even on panic, so the message stays readable
    install_panic_hook();

    info!("Starting Vigil console");

    match run_app(&cli) {
        Ok(()) => {
            info!("Vigil console exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Vigil console error: {}", e);
            eprintln!("Error: {}", e);
            if let Some(hint) = e.guidance() {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::from(1)
        }
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.
fn install_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Put the terminal back into its normal state.
fn restore_terminal() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();

    let _ = crossterm::terminal::disable_raw_mode();

    crossterm::execute!(
        stdout,
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::event::DisableFocusChange
    )?;
    crossterm::execute!(stdout, crossterm::cursor::Show)?;
    stdout.flush()?;

    Ok(())
}

/// Set up logging based on CLI arguments.
fn setup_logging(cli: &Cli) -> vigil_core::Result<LogGuard> {
    let debug = cli.verbose > 0;
    init_logging(cli.log_dir.clone(), debug)
}

/// Load configuration, apply CLI overrides, and run the TUI.
fn run_app(cli: &Cli) -> vigil_core::Result<()> {
    let mut config = VigilConfig::load(cli.config.as_deref())?;

    if let Some(url) = &cli.server_url {
        config = config.with_base_url(url);
    }
    if let Some(secs) = cli.interval {
        config = config.with_interval_secs(secs);
    }
    if cli.no_socket {
        config = config.without_socket();
    }
    config.validate()?;

    let mut app = App::new(config)?;
    app.run()
}
