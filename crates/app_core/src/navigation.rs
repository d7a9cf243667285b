//! Directional navigation over images
//!
//! Three policies share the same grid arithmetic:
//! - grouped grid: one grid per grade group, moves cross into neighbouring
//!   non-empty groups, no wrap at the ends of the catalog
//! - single grid: one grid over the flat list, clamped at the ends
//! - deck: a linear list, left/right wrap around

use crate::{GradeGroup, GroupedCatalog};
use serde::{Deserialize, Serialize};

/// Movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Which navigation policy a screen uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    Grouped,
    SingleGrid,
    Deck,
}

/// Row-major layout of a sequence into rows of `columns`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    columns: usize,
}

impl GridLayout {
    pub fn new(columns: usize) -> Self {
        debug_assert!(columns > 0, "grid needs at least one column");
        Self {
            columns: columns.max(1),
        }
    }

    pub fn columns(self) -> usize {
        self.columns
    }

    pub fn column_of(self, index: usize) -> usize {
        index % self.columns
    }

    pub fn row_of(self, index: usize) -> usize {
        index / self.columns
    }

    /// Number of rows needed for `len` items
    pub fn rows(self, len: usize) -> usize {
        len.div_ceil(self.columns)
    }

    /// Index in column `col` of the last row, clamped to the last item
    pub fn in_last_row(self, col: usize, len: usize) -> usize {
        debug_assert!(len > 0);
        let last = len.saturating_sub(1);
        (col + self.row_of(last) * self.columns).min(last)
    }

    /// Index in column `col` of the first row, clamped to the last item
    pub fn in_first_row(self, col: usize, len: usize) -> usize {
        debug_assert!(len > 0);
        col.min(len.saturating_sub(1))
    }
}

/// Resolve a move in the grouped grid.
///
/// `order` is the display order of the groups. Returns `None` when the move
/// would leave the catalog (stay put) or the catalog is empty. An image that
/// is not in any listed group resolves to the first image of the first
/// non-empty group.
pub fn resolve_grouped<'a>(
    grouped: &'a GroupedCatalog,
    order: &[GradeGroup],
    layout: GridLayout,
    current: &str,
    direction: Direction,
) -> Option<&'a str> {
    let groups: Vec<&'a [String]> = order.iter().map(|&g| grouped.get(g)).collect();

    let located = groups.iter().enumerate().find_map(|(gi, images)| {
        images
            .iter()
            .position(|id| id == current)
            .map(|i| (gi, i))
    });

    let Some((gi, i)) = located else {
        return groups
            .iter()
            .find_map(|images| images.first())
            .map(String::as_str);
    };

    let group = groups[gi];
    let before = || groups[..gi].iter().rev().find(|g| !g.is_empty()).copied();
    let after = || groups[gi + 1..].iter().find(|g| !g.is_empty()).copied();

    let target = match direction {
        Direction::Left => {
            if i > 0 {
                group.get(i - 1)
            } else {
                before().and_then(|g| g.last())
            }
        }
        Direction::Right => {
            if i + 1 < group.len() {
                group.get(i + 1)
            } else {
                after().and_then(|g| g.first())
            }
        }
        Direction::Up => {
            if i >= layout.columns() {
                group.get(i - layout.columns())
            } else {
                let col = layout.column_of(i);
                before().and_then(|g| g.get(layout.in_last_row(col, g.len())))
            }
        }
        Direction::Down => {
            if i + layout.columns() < group.len() {
                group.get(i + layout.columns())
            } else {
                let col = layout.column_of(i);
                after().and_then(|g| g.get(layout.in_first_row(col, g.len())))
            }
        }
    };

    target.map(String::as_str)
}

/// Resolve a move in a single grid of `len` items. Left and right stop at
/// the ends; up and down clamp to the first or last item.
pub fn resolve_single_grid(len: usize, layout: GridLayout, index: usize, direction: Direction) -> usize {
    if index >= len {
        debug_assert!(len == 0, "index {} out of range for {} items", index, len);
        return index;
    }

    let cols = layout.columns();
    match direction {
        Direction::Left => index.saturating_sub(1),
        Direction::Right => (index + 1).min(len - 1),
        Direction::Up => index.saturating_sub(cols),
        Direction::Down => (index + cols).min(len - 1),
    }
}

/// Resolve a move in the deck. Left and right wrap; up and down do nothing.
pub fn resolve_deck(len: usize, index: usize, direction: Direction) -> usize {
    if index >= len {
        debug_assert!(len == 0, "index {} out of range for {} items", index, len);
        return index;
    }

    match direction {
        Direction::Left => (index + len - 1) % len,
        Direction::Right => (index + 1) % len,
        Direction::Up | Direction::Down => index,
    }
}
