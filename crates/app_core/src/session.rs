//! Session state: the engine behind both screens

use crate::manifest::image_path;
use crate::{
    Action, AppConfig, AppError, CatalogStats, CollectionId, CollectionInfo, CommandTable,
    Direction, Grade, ImageCatalog, ManifestLoader, NavigationMode,
    SelectionController, ViewConfig,
};
use app_db::{ImportSummary, RatingStore};
use std::path::{Path, PathBuf};

/// The active screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// One image at a time, graded in sequence
    Deck,
    /// Grid review, grouped by grade or as a single grid
    Review,
}

/// All mutable state of one user session.
///
/// The session is driven from a single thread; every method runs to
/// completion before the next one starts.
pub struct Session {
    loader: ManifestLoader,
    store: RatingStore,
    collections: Vec<CollectionInfo>,
    default_collection: Option<CollectionId>,
    catalog: ImageCatalog,
    selection: SelectionController,
    view: ViewConfig,
    screen: Screen,
    commands: CommandTable,
}

impl Session {
    pub fn new(loader: ManifestLoader, store: RatingStore, config: &AppConfig) -> Self {
        let default_collection = config
            .general
            .default_collection
            .as_deref()
            .map(CollectionId::new);

        Self {
            loader,
            store,
            collections: Vec::new(),
            catalog: ImageCatalog::empty(
                default_collection.clone().unwrap_or_else(|| CollectionId::new("")),
            ),
            default_collection,
            selection: SelectionController::new(),
            view: ViewConfig::from(&config.review),
            screen: Screen::Deck,
            commands: CommandTable::from_bindings(&config.keybindings),
        }
    }

    /// Load the collection list and open the starting collection.
    ///
    /// The configured default wins when it is listed (or when no list is
    /// available); otherwise the first listed collection is used.
    pub async fn open(&mut self) -> Option<CollectionId> {
        self.collections = self.loader.load_collections().await;

        let listed = |id: &CollectionId| self.collections.iter().any(|c| &c.id == id);
        let start = match &self.default_collection {
            Some(id) if self.collections.is_empty() || listed(id) => Some(id.clone()),
            _ => self.collections.first().map(|c| c.id.clone()),
        };

        match start {
            Some(id) => {
                self.switch_collection(id.clone()).await;
                Some(id)
            }
            None => {
                tracing::warn!("No collections available");
                None
            }
        }
    }

    /// Make `collection` the active collection
    pub async fn switch_collection(&mut self, collection: CollectionId) {
        tracing::info!("Opening collection {}", collection);
        self.catalog = ImageCatalog::load(&self.loader, &self.store, &collection).await;
        self.selection = SelectionController::new();
        self.reset_focus();
    }

    /// Rebuild the catalog from storage, keeping focus when possible
    pub async fn refresh(&mut self) {
        let collection = self.catalog.collection().clone();
        self.catalog = ImageCatalog::load(&self.loader, &self.store, &collection).await;

        let stale = self
            .selection
            .focused()
            .map_or(true, |id| !self.catalog.contains(id));
        if stale {
            self.selection.close();
            self.reset_focus();
        }
    }

    /// Re-fetch the manifest of the active collection, then refresh
    pub async fn reload_manifest(&mut self) {
        self.loader.invalidate(self.catalog.collection());
        self.refresh().await;
    }

    pub fn collections(&self) -> &[CollectionInfo] {
        &self.collections
    }

    pub fn collection(&self) -> &CollectionId {
        self.catalog.collection()
    }

    pub fn catalog(&self) -> &ImageCatalog {
        &self.catalog
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn view(&self) -> ViewConfig {
        self.view
    }

    pub fn set_view(&mut self, view: ViewConfig) {
        self.view = view;
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn stats(&self) -> CatalogStats {
        self.catalog.stats()
    }

    /// Asset path of an image in the active collection
    pub fn image_path(&self, filename: &str) -> String {
        image_path(self.catalog.collection(), filename)
    }

    /// Persist a grade, then update the catalog. Focus is not touched.
    pub fn rate(&mut self, image_id: &str, grade: Option<Grade>) -> Result<(), AppError> {
        if !self.catalog.contains(image_id) {
            return Err(AppError::UnknownImage(image_id.to_string()));
        }

        self.store
            .set(self.catalog.collection().as_str(), image_id, grade)?;
        self.catalog.apply_rating(image_id, grade)
    }

    /// Grade the focused image. On the deck, focus then advances to the
    /// next image, wrapping at the end.
    pub fn rate_focused(&mut self, grade: Option<Grade>) -> Result<bool, AppError> {
        let Some(image_id) = self.selection.focused().map(str::to_string) else {
            return Ok(false);
        };

        self.rate(&image_id, grade)?;

        if self.screen == Screen::Deck {
            self.selection.navigate(
                &self.catalog,
                NavigationMode::Deck,
                self.view.columns(),
                Direction::Right,
            );
        }
        Ok(true)
    }

    /// Switch to the deck, focused on the first unrated image
    pub fn show_deck(&mut self) {
        self.screen = Screen::Deck;
        self.selection.close();
        self.selection.focus(self.catalog.next_unrated());
    }

    /// Switch to the review grid, keeping focus if it is still valid
    pub fn show_review(&mut self) {
        self.screen = Screen::Review;
        let valid = self
            .selection
            .focused()
            .map_or(false, |id| self.catalog.contains(id));
        if !valid {
            self.reset_focus();
        }
    }

    /// Move focus using the policy of the active screen
    pub fn navigate(&mut self, direction: Direction) -> bool {
        let mode = match self.screen {
            Screen::Deck => NavigationMode::Deck,
            Screen::Review => self.view.navigation_mode(),
        };
        self.selection
            .navigate(&self.catalog, mode, self.view.columns(), direction)
    }

    /// Apply a logical action. Returns whether anything changed.
    pub async fn handle_action(&mut self, action: Action) -> Result<bool, AppError> {
        tracing::debug!("Action {} on {:?}", action.command_id().as_str(), self.screen);

        let changed = match action {
            Action::Rate(grade) => self.rate_focused(Some(grade))?,
            Action::Skip => self.rate_focused(None)?,
            Action::Move(direction) => self.navigate(direction),
            Action::Activate => {
                if self.selection.is_zoom_open() {
                    self.selection.close();
                    true
                } else {
                    match (self.screen, self.selection.focused().map(str::to_string)) {
                        (Screen::Review, Some(id)) => {
                            self.selection.open(&id);
                            true
                        }
                        _ => false,
                    }
                }
            }
            Action::Close => {
                let was_open = self.selection.is_zoom_open();
                self.selection.close();
                was_open
            }
            Action::SetColumns(columns) => self.update_view(self.view.with_columns(columns)),
            Action::ToggleViewMode => self.update_view(self.view.toggled_mode()),
            Action::ToggleRatings => self.update_view(self.view.toggled_ratings()),
            Action::ShowDeck => {
                self.show_deck();
                true
            }
            Action::ShowReview => {
                self.show_review();
                true
            }
            Action::Reload => {
                self.reload_manifest().await;
                true
            }
        };

        Ok(changed)
    }

    /// Dispatch a key press through the command table
    pub async fn handle_key(&mut self, key: &str, in_text_input: bool) -> Result<bool, AppError> {
        match self.commands.lookup(key, in_text_input) {
            Some(action) => self.handle_action(action).await,
            None => Ok(false),
        }
    }

    /// Write the active collection's ratings to `dir`
    pub fn export(&self, dir: &Path) -> Option<PathBuf> {
        self.store.export_all(self.catalog.collection().as_str(), dir)
    }

    /// Merge a ratings document into the active collection, then refresh
    pub async fn import_document(&mut self, text: &str) -> Result<ImportSummary, AppError> {
        let summary = self
            .store
            .import_document(text, self.catalog.collection().as_str())?;
        self.refresh().await;
        Ok(summary)
    }

    /// Read a ratings file and merge it into the active collection
    pub async fn import_file(&mut self, path: &Path) -> Result<ImportSummary, AppError> {
        let text = tokio::fs::read_to_string(path).await?;
        self.import_document(&text).await
    }

    /// Delete every rating of the active collection, then refresh
    pub async fn clear(&mut self) -> Result<(), AppError> {
        self.store.clear(self.catalog.collection().as_str())?;
        self.refresh().await;
        Ok(())
    }

    fn update_view(&mut self, view: ViewConfig) -> bool {
        let changed = view != self.view;
        self.view = view;
        changed
    }

    fn reset_focus(&mut self) {
        let first = match self.screen {
            Screen::Deck => self.catalog.next_unrated().map(str::to_string),
            Screen::Review => match self.view.navigation_mode() {
                NavigationMode::Grouped => self
                    .catalog
                    .grouped()
                    .iter()
                    .find_map(|(_, images)| images.first().cloned()),
                _ => self.catalog.flat().first().map(|e| e.image_id.clone()),
            },
        };
        self.selection.focus(first.as_deref());
    }
}
