//! ImageTriage - grade image collections and review them by grade
//!
//! Main entry point.

mod app;
mod cli;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Configuration decides the log level, so it comes first
    let mut config = match &cli.config {
        Some(path) => app_core::AppConfig::load_from(path)?,
        None => app_core::AppConfig::load().unwrap_or_default(),
    };
    app::apply_overrides(&mut config, &cli);

    // Initialize logging and panic hook
    app_log::init(cli.log_level(&config.general.log_level))?;

    // Clean up old logs (7 days)
    if let Err(e) = app_log::cleanup_old_logs(7) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    tracing::info!("ImageTriage starting...");

    // Single-threaded event loop
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(app::run(cli.command, config))
}
