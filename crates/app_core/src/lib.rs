//! Image triage core domain logic
//!
//! This crate contains:
//! - Collection manifests and asset sources
//! - The image catalog (flat and grouped by grade)
//! - Navigation policies for grids and the deck
//! - Selection and lightbox state
//! - Command system
//! - Configuration
//! - Error types
//! - The session tying them together

pub mod model;
pub mod error;
pub mod config;
pub mod manifest;
pub mod catalog;
pub mod navigation;
pub mod selection;
pub mod command;
pub mod session;

pub use model::{CollectionId, CollectionInfo, Grade, GradeGroup, ImageId};
pub use error::AppError;
pub use config::{
    AppConfig, GeneralConfig, ReviewConfig, ViewConfig, ViewMode, MAX_COLUMNS, MIN_COLUMNS,
};
pub use manifest::{
    AssetSource, DirectorySource, ManifestLoader, MemorySource, COLLECTIONS_PATH,
};
pub use catalog::{CatalogEntry, CatalogStats, GroupedCatalog, ImageCatalog};
pub use navigation::{Direction, GridLayout, NavigationMode};
pub use selection::SelectionController;
pub use command::{Action, CommandId, CommandTable};
pub use session::{Screen, Session};

pub use app_db::{ImportSummary, RatingMap, RatingStore};
