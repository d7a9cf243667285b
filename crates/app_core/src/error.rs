//! Application error types

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Recovered locally (logged, degrade to empty) =====
    #[error("Fetch failed for {path}: {reason}")]
    Fetch { path: String, reason: String },

    // ===== Surfaced to the user =====
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid ratings file: {0}")]
    Validation(String),

    #[error("Unknown image: {0}")]
    UnknownImage(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn fetch(path: impl Into<String>, reason: impl ToString) -> Self {
        AppError::Fetch {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::Fetch { path, .. } => format!("Could not load {}", path),
            AppError::Storage(msg) => format!("Could not save ratings: {}", msg),
            AppError::Validation(msg) => format!("Import failed: {}", msg),
            AppError::UnknownImage(name) => format!("{} is not in this collection", name),
            _ => self.to_string(),
        }
    }
}

impl From<app_db::StoreError> for AppError {
    fn from(e: app_db::StoreError) -> Self {
        match e {
            app_db::StoreError::Validation(msg) => AppError::Validation(msg),
            _ => AppError::Storage(e.to_string()),
        }
    }
}
