//! Application configuration

use crate::NavigationMode;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Smallest column count of the review grid
pub const MIN_COLUMNS: usize = 2;
/// Largest column count of the review grid
pub const MAX_COLUMNS: usize = 10;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub review: ReviewConfig,
    pub keybindings: HashMap<String, Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            review: ReviewConfig::default(),
            keybindings: default_keybindings(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding collections.json and the collection folders
    pub assets_root: PathBuf,
    /// Ratings database; platform data dir when unset
    pub database_path: Option<PathBuf>,
    /// Collection opened at startup; first listed when unset
    pub default_collection: Option<String>,
    /// Where exports are written; current directory when unset
    pub export_dir: Option<PathBuf>,
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("./assets"),
            database_path: None,
            default_collection: None,
            export_dir: None,
            log_level: "info".to_string(),
        }
    }
}

/// Initial review screen settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub view_mode: ViewMode,
    pub columns: usize,
    pub show_ratings: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::Grouped,
            columns: 5,
            show_ratings: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    #[serde(rename = "grouped")]
    Grouped,
    #[serde(rename = "single")]
    SingleGrid,
}

/// Immutable view settings of the review screen.
///
/// Changes produce a new value; the column count always stays within
/// [`MIN_COLUMNS`]..=[`MAX_COLUMNS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewConfig {
    mode: ViewMode,
    columns: usize,
    show_ratings: bool,
}

impl ViewConfig {
    pub fn new(mode: ViewMode, columns: usize, show_ratings: bool) -> Self {
        Self {
            mode,
            columns: columns.clamp(MIN_COLUMNS, MAX_COLUMNS),
            show_ratings,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn show_ratings(&self) -> bool {
        self.show_ratings
    }

    pub fn with_columns(self, columns: usize) -> Self {
        Self::new(self.mode, columns, self.show_ratings)
    }

    pub fn with_mode(self, mode: ViewMode) -> Self {
        Self { mode, ..self }
    }

    pub fn toggled_mode(self) -> Self {
        match self.mode {
            ViewMode::Grouped => self.with_mode(ViewMode::SingleGrid),
            ViewMode::SingleGrid => self.with_mode(ViewMode::Grouped),
        }
    }

    pub fn toggled_ratings(self) -> Self {
        Self {
            show_ratings: !self.show_ratings,
            ..self
        }
    }

    /// Navigation policy of the review grid
    pub fn navigation_mode(&self) -> NavigationMode {
        match self.mode {
            ViewMode::Grouped => NavigationMode::Grouped,
            ViewMode::SingleGrid => NavigationMode::SingleGrid,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self::from(&ReviewConfig::default())
    }
}

impl From<&ReviewConfig> for ViewConfig {
    fn from(review: &ReviewConfig) -> Self {
        Self::new(review.view_mode, review.columns, review.show_ratings)
    }
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`; defaults when the file is absent
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::info!("Configuration loaded from {:?}", path);
            Ok(config)
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("com", "ImageTriage", "ImageTriage")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }
}

fn default_keybindings() -> HashMap<String, Vec<String>> {
    let mut kb = HashMap::new();

    // Grading
    kb.insert("rate.a".into(), vec!["a".into()]);
    kb.insert("rate.b".into(), vec!["b".into()]);
    kb.insert("rate.c".into(), vec!["c".into()]);
    kb.insert("rate.d".into(), vec!["d".into()]);
    kb.insert("rate.f".into(), vec!["f".into()]);
    kb.insert("rate.skip".into(), vec![";".into()]);

    // Movement
    kb.insert("nav.left".into(), vec!["Left".into(), "h".into()]);
    kb.insert("nav.right".into(), vec!["Right".into(), "l".into()]);
    kb.insert("nav.up".into(), vec!["Up".into(), "k".into()]);
    kb.insert("nav.down".into(), vec!["Down".into(), "j".into()]);
    kb.insert("nav.activate".into(), vec!["Return".into()]);
    kb.insert("nav.close".into(), vec!["Escape".into()]);

    // Columns: digits 2-9, 0 means 10
    for n in 2..=9 {
        kb.insert(format!("view.columns:{}", n), vec![n.to_string()]);
    }
    kb.insert("view.columns:10".into(), vec!["0".into()]);
    kb.insert("view.toggle_mode".into(), vec!["v".into()]);
    kb.insert("view.toggle_ratings".into(), vec!["r".into()]);

    // Screens
    kb.insert("app.deck".into(), vec!["1".into()]);
    kb.insert("app.review".into(), vec!["Tab".into()]);
    kb.insert("app.reload".into(), vec!["F5".into()]);

    kb
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_view_config_clamps_columns() {
        let view = ViewConfig::default();
        assert_eq!(view.columns(), 5);
        assert_eq!(view.with_columns(1).columns(), MIN_COLUMNS);
        assert_eq!(view.with_columns(40).columns(), MAX_COLUMNS);
        assert_eq!(view.with_columns(7).columns(), 7);
    }

    #[test]
    fn test_view_config_is_a_value() {
        let view = ViewConfig::default();
        let toggled = view.toggled_mode().toggled_ratings();

        assert_eq!(view.mode(), ViewMode::Grouped);
        assert!(view.show_ratings());
        assert_eq!(toggled.mode(), ViewMode::SingleGrid);
        assert_eq!(toggled.navigation_mode(), NavigationMode::SingleGrid);
        assert!(!toggled.show_ratings());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[general]\nassets_root = \"/srv/images\"\n\n[review]\nview_mode = \"single\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.general.assets_root, PathBuf::from("/srv/images"));
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.review.view_mode, ViewMode::SingleGrid);
        assert_eq!(config.review.columns, 5);
        assert!(config.keybindings.contains_key("rate.a"));
    }

    #[test]
    fn test_general_and_review_sections() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[general]\ndefault_collection = \"posters\"\nexport_dir = \"/tmp/out\"\n\n[review]\ncolumns = 8\nshow_ratings = false\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.general.default_collection.as_deref(), Some("posters"));
        assert_eq!(config.general.export_dir, Some(PathBuf::from("/tmp/out")));

        let view = ViewConfig::from(&config.review);
        assert_eq!(view.columns(), 8);
        assert!(!view.show_ratings());
    }
}
