//! ImageTriage Logging & Observability
//!
//! Provides structured logging, log retention and crash reports.

mod panic_hook;
mod logging;

pub use panic_hook::init_panic_hook;
pub use logging::{init_logging, cleanup_old_logs, cleanup_logs_in};

use std::path::PathBuf;
use directories::ProjectDirs;

/// Get the application log directory
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("com", "ImageTriage", "ImageTriage")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialize logging and the panic hook.
///
/// `default_level` is used when `RUST_LOG` is not set.
pub fn init(default_level: &str) -> anyhow::Result<()> {
    init_logging(default_level)?;
    init_panic_hook();
    Ok(())
}
