//! Focus and lightbox state

use crate::navigation::{resolve_deck, resolve_grouped, resolve_single_grid};
use crate::{Direction, GradeGroup, GridLayout, ImageCatalog, ImageId, NavigationMode};

/// Which image is focused and whether it is shown zoomed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionController {
    focused: Option<ImageId>,
    zoom_open: bool,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn is_zoom_open(&self) -> bool {
        self.zoom_open
    }

    /// Focus an image and open it in the lightbox
    pub fn open(&mut self, image_id: &str) {
        self.focused = Some(image_id.to_string());
        self.zoom_open = true;
    }

    /// Close the lightbox; focus is kept
    pub fn close(&mut self) {
        self.zoom_open = false;
    }

    pub fn focus(&mut self, image_id: Option<&str>) {
        self.focused = image_id.map(str::to_string);
    }

    /// Move focus under the given policy. Returns whether focus changed.
    pub fn navigate(
        &mut self,
        catalog: &ImageCatalog,
        mode: NavigationMode,
        columns: usize,
        direction: Direction,
    ) -> bool {
        let target = match mode {
            NavigationMode::Grouped => resolve_grouped(
                catalog.grouped(),
                &GradeGroup::ORDER,
                GridLayout::new(columns),
                self.focused().unwrap_or_default(),
                direction,
            )
            .map(str::to_string),
            NavigationMode::SingleGrid | NavigationMode::Deck => {
                let flat = catalog.flat();
                match self.focused().and_then(|id| catalog.position(id)) {
                    // Nothing focused yet, or focus went stale: start at the top
                    None => flat.first().map(|e| e.image_id.clone()),
                    Some(index) => {
                        let next = if mode == NavigationMode::Deck {
                            resolve_deck(flat.len(), index, direction)
                        } else {
                            resolve_single_grid(flat.len(), GridLayout::new(columns), index, direction)
                        };
                        flat.get(next).map(|e| e.image_id.clone())
                    }
                }
            }
        };

        match target {
            Some(id) if self.focused() != Some(id.as_str()) => {
                tracing::trace!("Focus {:?} -> {}", self.focused, id);
                self.focused = Some(id);
                true
            }
            _ => false,
        }
    }
}
