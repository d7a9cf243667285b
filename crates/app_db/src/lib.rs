//! ImageTriage Database Layer
//!
//! Provides:
//! - SQLite key-value storage for per-collection ratings
//! - Export/import documents for moving ratings between machines

mod grade;
mod pool;
mod schema;
mod ratings;
mod document;

pub use grade::Grade;
pub use pool::{init_pool, DbPool};
pub use schema::migrate;
pub use ratings::{storage_key, RatingMap, RatingStore};
pub use document::{
    parse_document, render_document, ImportSummary, ImportValue, ParsedDocument, COLLECTION_TAG,
};

use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid ratings document: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Get the database directory
pub fn db_dir() -> PathBuf {
    ProjectDirs::from("com", "ImageTriage", "ImageTriage")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Default location of the ratings database
pub fn default_db_path() -> PathBuf {
    db_dir().join("ratings.db")
}

/// Open (creating and migrating if needed) the ratings database at `path`
pub fn open(path: &Path) -> Result<RatingStore> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = init_pool(path)?;
    migrate(&pool)?;

    tracing::info!("Rating store opened at {:?}", path);
    Ok(RatingStore::new(pool))
}
