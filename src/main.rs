//! Picodock: Docker-containerized runner for MPLAB hardware-programming
//! tools with single-instance locking.
//!
//! This is the main entry point for the `picodock` CLI. It configures the
//! tracing subscriber, parses arguments, dispatches to the appropriate
//! command handler, and handles errors with proper exit codes.

mod cli;
mod commands;
pub mod config;
pub mod context;
pub mod docker;
pub mod error;
pub mod exit_codes;
pub mod hwscan;
pub mod lock;
pub mod logger;
pub mod signal;
pub mod toolcmd;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
