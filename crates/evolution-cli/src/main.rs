//! Evolution - a command-line client for the evolution productivity board.
//!
//! Each subcommand corresponds to one page of the board (tasks, habits, schedule,
//! journal, settings) and fetches its own data. The session is shared across runs
//! through the configured credential mirror.

mod app;
mod cli;
mod pages;

use std::io;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use evolution_core::ApiError;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use cli::{Cli, Command};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`). With a log directory,
/// a daily-rolling file receives the same events; keep the returned guard alive
/// until exit so buffered lines are flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "evolution.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref());
    debug!(command = ?cli.command, "Evolution starting");

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", describe_error(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut app = App::new(cli.api_url)?;

    match cli.command {
        Command::Login { username } => app.login(username).await,
        Command::Register(args) => app.register(args).await,
        Command::Logout => {
            app.logout();
            Ok(())
        }
        Command::Status => {
            app.print_status();
            Ok(())
        }
        Command::Tasks(cmd) => pages::tasks::run(&app, cmd).await,
        Command::Habits(cmd) => pages::habits::run(&app, cmd).await,
        Command::Events(cmd) => pages::events::run(&app, cmd).await,
        Command::Journal(cmd) => pages::journal::run(&app, cmd).await,
        Command::Profile(cmd) => pages::settings::run(&app, cmd).await,
        Command::Badges => pages::settings::badges(&app).await,
        Command::Dashboard => pages::dashboard::run(&app).await,
    }?;

    info!("Evolution finished");
    Ok(())
}

/// User-facing text for an error, with a hint when the session is the problem
fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::Unauthorized) => {
            "Session expired or invalid. Run `evolution login` to sign in again.".to_string()
        }
        Some(ApiError::SessionChanged) => {
            "The session changed while the request was running; nothing was applied.".to_string()
        }
        Some(ApiError::NetworkError(_)) => {
            "Unable to connect to server. Check that the backend is running.".to_string()
        }
        _ => format!("{:#}", err),
    }
}
